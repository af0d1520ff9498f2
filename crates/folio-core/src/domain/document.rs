use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// Reading time used when a document omits `readingTime` or gives a non-positive value.
pub const DEFAULT_READING_TIME: i32 = 5;

/// Metadata block at the top of a content document.
///
/// Every field is optional at the parsing stage; required fields are checked by
/// the synchronizer so a bad document is skipped instead of failing the parse.
/// Scalars are coerced the way authors tend to write them: `title: 2024` is the
/// string "2024", `featured: "yes"` is true, `readingTime: "12"` is 12.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub published_at: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub author: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub category: Option<String>,
    #[serde(deserialize_with = "lenient::strings")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient::boolean")]
    pub featured: bool,
    #[serde(deserialize_with = "lenient::integer")]
    pub reading_time: Option<i64>,
    #[serde(deserialize_with = "lenient::string")]
    pub image: Option<String>,
}

impl FrontMatter {
    /// Trimmed title, `None` when absent or blank.
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    /// Trimmed description, `None` when absent or blank.
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    pub fn author(&self) -> Option<&str> {
        non_blank(self.author.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }

    pub fn image(&self) -> Option<&str> {
        non_blank(self.image.as_deref())
    }

    pub fn reading_time(&self) -> i32 {
        match self.reading_time {
            Some(minutes) if minutes > 0 => i32::try_from(minutes).unwrap_or(i32::MAX),
            _ => DEFAULT_READING_TIME,
        }
    }

    /// `publishedAt` as a timestamp. Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
    pub fn published_at(&self) -> Result<Option<DateTime<Utc>>, String> {
        let Some(raw) = non_blank(self.published_at.as_deref()) else {
            return Ok(None);
        };

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(Some(ts.with_timezone(&Utc)));
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| Some(naive.and_utc()))
            .ok_or_else(|| format!("publishedAt '{raw}' is not a valid date"))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

mod lenient {
    use serde::de::{Deserializer, Error};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Bool(bool),
        Int(i64),
        Float(f64),
        Str(String),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Scalar::Bool(b) => b.to_string(),
                Scalar::Int(n) => n.to_string(),
                Scalar::Float(f) => f.to_string(),
                Scalar::Str(s) => s,
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(Scalar),
        Many(Vec<Option<Scalar>>),
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(Option::<Scalar>::deserialize(d)?.map(Scalar::into_string))
    }

    /// A sequence of scalars, or a single scalar as a one-element list. Nulls are dropped.
    pub fn strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
        Ok(match Option::<OneOrMany>::deserialize(d)? {
            None => Vec::new(),
            Some(OneOrMany::One(one)) => vec![one.into_string()],
            Some(OneOrMany::Many(many)) => many
                .into_iter()
                .flatten()
                .map(Scalar::into_string)
                .collect(),
        })
    }

    pub fn boolean<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Option::<Scalar>::deserialize(d)? {
            None => Ok(false),
            Some(Scalar::Bool(b)) => Ok(b),
            Some(Scalar::Int(n)) => Ok(n != 0),
            Some(Scalar::Str(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" | "" => Ok(false),
                other => Err(D::Error::custom(format!("expected a boolean, got '{other}'"))),
            },
            Some(Scalar::Float(f)) => Err(D::Error::custom(format!("expected a boolean, got {f}"))),
        }
    }

    /// Unparsable values read as absent so the default applies.
    pub fn integer<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match Option::<Scalar>::deserialize(d)? {
            Some(Scalar::Int(n)) => Some(n),
            Some(Scalar::Float(f)) if f.is_finite() => Some(f as i64),
            Some(Scalar::Str(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }
}

/// One parsed document from the content directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentDocument {
    pub slug: String,
    pub file_name: String,
    pub front_matter: FrontMatter,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_blank_required_fields_are_absent() {
        let fm = FrontMatter {
            title: Some("   ".into()),
            description: Some(" Intro ".into()),
            ..Default::default()
        };
        assert_eq!(fm.title(), None);
        assert_eq!(fm.description(), Some("Intro"));
    }

    #[test]
    fn test_reading_time_defaults() {
        let mut fm = FrontMatter::default();
        assert_eq!(fm.reading_time(), 5);
        fm.reading_time = Some(0);
        assert_eq!(fm.reading_time(), 5);
        fm.reading_time = Some(12);
        assert_eq!(fm.reading_time(), 12);
    }

    #[test]
    fn test_scalars_are_coerced() {
        let fm: FrontMatter = serde_json::from_value(serde_json::json!({
            "title": 2024,
            "description": true,
            "featured": "Yes",
            "readingTime": "12",
            "tags": ["rust", 7, null],
            "author": null
        }))
        .unwrap();

        assert_eq!(fm.title(), Some("2024"));
        assert_eq!(fm.description(), Some("true"));
        assert!(fm.featured);
        assert_eq!(fm.reading_time(), 12);
        assert_eq!(fm.tags, vec!["rust", "7"]);
        assert_eq!(fm.author(), None);
    }

    #[test]
    fn test_single_tag_and_odd_reading_time() {
        let fm: FrontMatter = serde_json::from_value(serde_json::json!({
            "tags": "rust",
            "readingTime": "about ten",
            "featured": 0
        }))
        .unwrap();

        assert_eq!(fm.tags, vec!["rust"]);
        assert_eq!(fm.reading_time(), DEFAULT_READING_TIME);
        assert!(!fm.featured);
    }

    #[test]
    fn test_unrecognized_flag_is_rejected() {
        let result: Result<FrontMatter, _> =
            serde_json::from_value(serde_json::json!({ "featured": "maybe" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_published_at_formats() {
        let mut fm = FrontMatter::default();
        assert_eq!(fm.published_at().unwrap(), None);

        fm.published_at = Some("2024-03-09".into());
        let ts = fm.published_at().unwrap().unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2024, 3, 9, 0));

        fm.published_at = Some("2024-03-09T10:30:00+02:00".into());
        let ts = fm.published_at().unwrap().unwrap();
        assert_eq!(ts.hour(), 8);

        fm.published_at = Some("next tuesday".into());
        assert!(fm.published_at().is_err());
    }
}
