//! Locale tags (`en-US`, `pt-BR`, ...) used to key locale manifests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A BCP 47 style locale tag.
///
/// Tags compare case-insensitively for identity checks (`en-us` names the
/// same locale as `en-US`) but preserve their original casing for file name
/// construction and display. Ordering is plain string order so tags can key
/// a `BTreeMap`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocaleTag(String);

impl LocaleTag {
    /// Wrap a raw locale tag.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive identity check against another tag.
    pub fn matches(&self, other: &LocaleTag) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Case-insensitive identity check against a raw string.
    pub fn matches_str(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for LocaleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LocaleTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LocaleTag {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}
