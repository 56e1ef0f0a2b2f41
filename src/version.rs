//! Ordering of loosely structured release version strings
//!
//! Versions such as `"v1.2.3"`, `"1.2"` or `"1..2"` are compared by dropping
//! every letter, collapsing runs of `.` into one separator, and comparing the
//! remaining dot-separated integers left to right. When one version is a
//! prefix of the other, the one with more segments is greater, so `"1.2.0"`
//! sorts after `"1.2"`.

use crate::error::VersionError;
use std::cmp::Ordering;

/// Dot-separated numeric segments of a version string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSegments {
    raw: String,
    segments: Vec<String>,
}

impl VersionSegments {
    /// Strip letters, collapse repeated dots and split into segments
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let mut cleaned = String::with_capacity(raw.len());
        for c in raw.chars().filter(|c| !c.is_alphabetic()) {
            if c == '.' && cleaned.ends_with('.') {
                continue;
            }
            cleaned.push(c);
        }

        Self {
            raw: raw.to_string(),
            segments: cleaned.split('.').map(str::to_string).collect(),
        }
    }

    /// Segments in order
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parse segment `index` as an integer
    fn value(&self, index: usize) -> Result<i64, VersionError> {
        let segment = &self.segments[index];
        segment.parse::<i64>().map_err(|source| VersionError {
            version: self.raw.clone(),
            segment: segment.clone(),
            source,
        })
    }

    /// Compare against `other`, parsing only as many segments as needed
    ///
    /// # Errors
    ///
    /// Returns [`VersionError`] if a compared segment is not an integer.
    pub fn compare(&self, other: &Self) -> Result<Ordering, VersionError> {
        let shared = self.segments.len().min(other.segments.len());
        for i in 0..shared {
            match self.value(i)?.cmp(&other.value(i)?) {
                Ordering::Equal => {}
                unequal => return Ok(unequal),
            }
        }
        Ok(self.segments.len().cmp(&other.segments.len()))
    }
}

/// Compare two version strings.
///
/// Identical strings are equal without being parsed, and the empty string
/// sorts before anything else.
///
/// # Errors
///
/// Returns [`VersionError`] when a segment that has to be compared is not a
/// base-10 integer once letters are removed.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use pivnet_cli::version::compare;
///
/// assert_eq!(compare("v1.2.3", "1.2.3").unwrap(), Ordering::Equal);
/// assert_eq!(compare("1.2.3", "1.2").unwrap(), Ordering::Greater);
/// ```
pub fn compare(s1: &str, s2: &str) -> Result<Ordering, VersionError> {
    if s1 == s2 {
        return Ok(Ordering::Equal);
    }
    if s1.is_empty() {
        return Ok(Ordering::Less);
    }
    if s2.is_empty() {
        return Ok(Ordering::Greater);
    }

    VersionSegments::new(s1).compare(&VersionSegments::new(s2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_versions() {
        assert_eq!(compare("1.2.3", "1.2.3").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_greater_and_less() {
        assert_eq!(compare("1.2.4", "1.2.3").unwrap(), Ordering::Greater);
        assert_eq!(compare("1.2.2", "1.2.3").unwrap(), Ordering::Less);
        assert_eq!(compare("2.0", "1.9.9").unwrap(), Ordering::Greater);
        assert_eq!(compare("1.10", "1.9").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_empty_versions() {
        assert_eq!(compare("", "").unwrap(), Ordering::Equal);
        assert_eq!(compare("", "1.2.3").unwrap(), Ordering::Less);
        assert_eq!(compare("1.2.3", "").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_letters_are_stripped() {
        assert_eq!(compare("v1.2.3", "1.2.3").unwrap(), Ordering::Equal);
        assert_eq!(compare("1.2.3", "V1.2.3").unwrap(), Ordering::Equal);
        assert_eq!(compare("1.2.3ä", "1.2.3").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_consecutive_dots_collapse() {
        assert_eq!(compare("1..2", "1.2").unwrap(), Ordering::Equal);
        assert_eq!(compare("1...2", "1.2").unwrap(), Ordering::Equal);
        assert_eq!(
            VersionSegments::new("1..2").segments(),
            &["1".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn test_more_segments_win() {
        assert_eq!(compare("1.2.3", "1.2").unwrap(), Ordering::Greater);
        assert_eq!(compare("1.2", "1.2.3").unwrap(), Ordering::Less);
        assert_eq!(compare("1.2.0", "1.2").unwrap(), Ordering::Greater);
    }

    #[test]
    fn test_non_numeric_segment_is_an_error() {
        let err = compare("abc", "1.2.3").unwrap_err();
        assert_eq!(err.version, "abc");
        assert_eq!(err.segment, "");

        let err = compare("1.2.3", "1.x-y").unwrap_err();
        assert_eq!(err.segment, "-");
    }

    #[test]
    fn test_identical_unparsable_strings_are_equal() {
        assert_eq!(compare("abc", "abc").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_unreached_segments_are_not_parsed() {
        assert_eq!(compare("1.3.x-1", "1.2").unwrap(), Ordering::Greater);
    }
}
