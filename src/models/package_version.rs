//! Package version strings with repository-style ordering.
//!
//! Published versions are not semantic versions. The repository orders them
//! with a lenient rule: split on `.`, compare segments numerically when both
//! sides parse as integers, case-insensitively as text otherwise, and let a
//! longer version win when one is a prefix of the other. That is enough to
//! pick `1.10.0` over `1.9.0` and `2.1` over `2.1-beta`-style stragglers
//! without rejecting anything a publisher ever shipped.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// An opaque package version with lenient ordering.
///
/// # Examples
///
/// ```rust
/// use wingen::models::PackageVersion;
///
/// let older = PackageVersion::new("1.9.0");
/// let newer = PackageVersion::new("1.10.0");
/// assert!(newer > older);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageVersion(String);

impl PackageVersion {
    /// Wrap a raw version string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The version as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl Ord for PackageVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.segments();
        let mut right = other.segments();
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => {
                    let ordering = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(a), Ok(b)) => a.cmp(&b),
                        _ => a.to_ascii_lowercase().cmp(&b.to_ascii_lowercase()),
                    };
                    if ordering != Ordering::Equal {
                        return ordering;
                    }
                }
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                // Segment-equal versions such as "1.0" and "1.00" still need a
                // total order consistent with Eq, so fall back to the raw text.
                (None, None) => return self.0.cmp(&other.0),
            }
        }
    }
}

impl PartialOrd for PackageVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(raw: &str) -> PackageVersion {
        PackageVersion::new(raw)
    }

    #[test]
    fn numeric_segments_compare_numerically() {
        assert!(v("1.10.0") > v("1.9.0"));
        assert!(v("2.0.0") > v("1.99.99"));
        assert!(v("10") > v("9"));
    }

    #[test]
    fn textual_segments_compare_case_insensitively() {
        assert!(v("1.0.b") > v("1.0.A"));
        assert_eq!(v("1.0.RC").cmp(&v("1.0.rc")), "1.0.RC".cmp("1.0.rc"));
    }

    #[test]
    fn longer_version_wins_when_prefix_equal() {
        assert!(v("1.2.3") > v("1.2"));
        assert!(v("1.2") < v("1.2.0"));
    }

    #[test]
    fn max_selects_latest() {
        let versions = [v("1.2.9"), v("1.10.1"), v("1.2.10")];
        let latest = versions.iter().max().cloned();
        assert_eq!(latest, Some(v("1.10.1")));
    }
}
