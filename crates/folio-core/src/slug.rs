//! Slug derivation and validation.
//!
//! Category and tag slugs are derived from human-entered names with [`slugify`].
//! Post slugs come from file stems and are only checked with [`is_valid_slug`]
//! before they are used to touch the filesystem or the store.

/// Longest slug accepted for lookups.
pub const MAX_SLUG_LEN: usize = 200;

/// Normalize a name into a slug: lowercase, every run of non-alphanumeric
/// characters collapsed to a single hyphen, leading/trailing hyphens trimmed.
///
/// ```
/// assert_eq!(folio_core::slug::slugify("  Mac & Linux Tips! "), "mac-linux-tips");
/// ```
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Whether `slug` is safe to use as a lookup key.
///
/// Only ASCII letters, digits, `-` and `_` are allowed, so path separators and
/// `..` segments can never reach the content directory.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// 32-bit FNV-1a. Stable across platforms and releases, unlike `DefaultHasher`.
pub(crate) fn fnv1a(input: &str) -> u32 {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    input
        .bytes()
        .fold(OFFSET, |hash, b| (hash ^ u32::from(b)).wrapping_mul(PRIME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("C++ / Rust -- FFI"), "c-rust-ffi");
        assert_eq!(slugify("--Mac--"), "mac");
        assert_eq!(slugify("macOS 14"), "macos-14");
    }

    #[test]
    fn test_slugify_empty_when_no_alphanumerics() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify(" !!! "), "");
    }

    #[test]
    fn test_valid_slugs() {
        assert!(is_valid_slug("install-homebrew"));
        assert!(is_valid_slug("old_tutorial_2"));
        assert!(is_valid_slug("Mac-Setup"));
    }

    #[test]
    fn test_rejects_traversal_shaped_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("../etc/passwd"));
        assert!(!is_valid_slug("a/b"));
        assert!(!is_valid_slug("..\\secrets"));
        assert!(!is_valid_slug("post.mdx"));
        assert!(!is_valid_slug("-rf"));
        assert!(!is_valid_slug(&"a".repeat(MAX_SLUG_LEN + 1)));
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(fnv1a(""), 0x811c_9dc5);
        assert_eq!(fnv1a("a"), 0xe40c_292c);
    }
}
