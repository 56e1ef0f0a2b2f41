//! Release lookup by version
//!
//! Resolves a human-supplied release version to the release (and its id) the
//! API knows about, filters release lists by a version pattern, and orders
//! them newest first.

use crate::error::{Error, Result, VersionError};
use crate::version;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A product release as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// API identifier
    pub id: u32,
    /// Version string as published
    pub version: String,
    /// Release date, `YYYY-MM-DD`
    #[serde(default)]
    pub release_date: Option<String>,
    /// EULA that must be accepted before downloading
    #[serde(default)]
    pub eula: Option<Eula>,
}

/// EULA reference attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eula {
    /// EULA slug
    pub slug: String,
}

#[derive(Deserialize)]
struct ReleasesEnvelope {
    releases: Vec<Release>,
}

/// Decode a `{"releases": [...]}` API response body
pub fn parse_releases(body: &str) -> Result<Vec<Release>> {
    let envelope: ReleasesEnvelope = serde_json::from_str(body)?;
    Ok(envelope.releases)
}

/// Release whose version is exactly `version`
pub fn find_by_version<'a>(releases: &'a [Release], version: &str) -> Result<&'a Release> {
    releases
        .iter()
        .find(|r| r.version == version)
        .ok_or_else(|| Error::ReleaseNotFound {
            version: version.to_string(),
        })
}

/// Releases whose version matches the regular expression `pattern`
pub fn filter_by_version_pattern(releases: &[Release], pattern: &str) -> Result<Vec<Release>> {
    let re = Regex::new(pattern)?;
    Ok(releases
        .iter()
        .filter(|r| re.is_match(&r.version))
        .cloned()
        .collect())
}

/// Sort releases newest first by version.
///
/// Ordering follows [`version::compare`], so only segments that decide an
/// order are parsed. The sort is stable, and on error the slice is left as
/// it was.
pub fn sort_by_version(releases: &mut [Release]) -> std::result::Result<(), VersionError> {
    let mut sorted: Vec<Release> = Vec::with_capacity(releases.len());
    for release in releases.iter() {
        let mut at = sorted.len();
        while at > 0
            && version::compare(&sorted[at - 1].version, &release.version)? == Ordering::Less
        {
            at -= 1;
        }
        sorted.insert(at, release.clone());
    }

    releases.clone_from_slice(&sorted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(id: u32, version: &str) -> Release {
        Release {
            id,
            version: version.to_string(),
            release_date: None,
            eula: None,
        }
    }

    #[test]
    fn test_parse_releases() {
        let body = r#"{"releases": [
            {"id": 7, "version": "2.1.0", "release_date": "2024-03-01", "eula": {"slug": "vmware-eula"}},
            {"id": 5, "version": "2.0.3"}
        ]}"#;
        let releases = parse_releases(body).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].eula.as_ref().unwrap().slug, "vmware-eula");
        assert_eq!(releases[1].release_date, None);
    }

    #[test]
    fn test_parse_releases_rejects_garbage() {
        assert!(matches!(
            parse_releases("{not json"),
            Err(Error::DeserializationError(_))
        ));
    }

    #[test]
    fn test_find_by_version_is_exact() {
        let releases = vec![release(1, "1.2.3"), release(2, "v1.2.3")];
        assert_eq!(find_by_version(&releases, "v1.2.3").unwrap().id, 2);
        assert!(matches!(
            find_by_version(&releases, "1.2"),
            Err(Error::ReleaseNotFound { .. })
        ));
    }

    #[test]
    fn test_filter_by_version_pattern() {
        let releases = vec![release(1, "1.2.3"), release(2, "1.3.0"), release(3, "2.0.0")];
        let filtered = filter_by_version_pattern(&releases, r"^1\.").unwrap();
        assert_eq!(filtered.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_filter_rejects_invalid_pattern() {
        let releases = vec![release(1, "1.2.3")];
        assert!(matches!(
            filter_by_version_pattern(&releases, "some(invalid^regex"),
            Err(Error::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_sort_by_version_newest_first() {
        let mut releases = vec![
            release(1, "1.2"),
            release(2, "1.10.0"),
            release(3, "v1.2.1"),
            release(4, "1.9"),
        ];
        sort_by_version(&mut releases).unwrap();
        assert_eq!(
            releases.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![2, 4, 3, 1]
        );
    }

    #[test]
    fn test_sort_by_version_accepts_what_compare_accepts() {
        let mut releases = vec![
            release(1, ""),
            release(2, "2.0-rc"),
            release(3, "1.5"),
            release(4, "2.0-rc"),
        ];
        sort_by_version(&mut releases).unwrap();
        assert_eq!(
            releases.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![2, 4, 3, 1]
        );
    }

    #[test]
    fn test_sort_by_version_leaves_slice_on_error() {
        let mut releases = vec![release(1, "1.1"), release(2, "1.0-rc")];
        let before = releases.clone();
        assert!(sort_by_version(&mut releases).is_err());
        assert_eq!(releases, before);
    }
}
