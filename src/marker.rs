//! Version marker extraction
//!
//! Version identity is embedded in content, not supplied out-of-band: the
//! built index documents carry a literal `version: '<digits>'` somewhere in
//! their body. This module owns that text pattern and nothing else, so the
//! marker format can be validated without store I/O.

use regex::Regex;

use crate::registry::Version;

/// Pattern matched against the decompressed document body
const MARKER_PATTERN: &str = r"version: '(\d+)'";

/// Extract the version marker from a document body. First match wins.
pub fn extract_version(text: &str) -> Option<Version> {
    let re = Regex::new(MARKER_PATTERN).expect("marker pattern is valid");
    re.captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_version_from_index_body() {
        let body = "<script>var cfg = { version: '1524' };</script>";
        assert_eq!(extract_version(body), Some(1524));
    }

    #[test]
    fn test_first_match_wins() {
        let body = "version: '7' ... version: '8'";
        assert_eq!(extract_version(body), Some(7));
    }

    #[test]
    fn test_missing_marker() {
        assert_eq!(extract_version("<html>no marker here</html>"), None);
        assert_eq!(extract_version(""), None);
    }

    #[test]
    fn test_quotes_are_required() {
        assert_eq!(extract_version("version: 12"), None);
        assert_eq!(extract_version("version: \"12\""), None);
    }

    #[test]
    fn test_overlong_digits_are_not_a_version() {
        let body = "version: '99999999999999999999'";
        assert_eq!(extract_version(body), None);
    }
}
