//! Front-matter splitting and parsing.
//!
//! ```text
//! ---
//! title: Install Homebrew
//! tags: [mac, cli]
//! ---
//! Body text...
//! ```

use folio_core::domain::FrontMatter;
use folio_core::ports::ContentError;

const FENCE: &str = "---";

/// Split `raw` into its front-matter and body.
///
/// The file must open with a `---` line; the block ends at the next line that is
/// exactly `---`. A leading BOM and CRLF line endings are accepted.
pub fn parse_document(file: &str, raw: &str) -> Result<(FrontMatter, String), ContentError> {
    let invalid = |reason: String| ContentError::FrontMatter {
        file: file.to_string(),
        reason,
    };

    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = raw.split_inclusive('\n');

    match lines.next() {
        Some(first) if first.trim_end() == FENCE => {}
        _ => return Err(invalid("missing opening `---` fence".to_string())),
    }

    let mut yaml = String::new();
    let mut closed = false;
    for line in lines.by_ref() {
        if line.trim_end() == FENCE {
            closed = true;
            break;
        }
        yaml.push_str(line);
    }
    if !closed {
        return Err(invalid("missing closing `---` fence".to_string()));
    }

    let body: String = lines.collect();
    let body = body.trim_start_matches(['\r', '\n']).to_string();

    let front_matter = if yaml.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(&yaml).map_err(|e| invalid(e.to_string()))?
    };

    Ok((front_matter, body))
}
