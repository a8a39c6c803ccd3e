//! Package identifier newtype and repository path derivation.
//!
//! A package identifier has the shape `Publisher.Name` (possibly with more
//! dotted segments, e.g. `Microsoft.VisualStudio.Community`). The identifier
//! determines where the package's manifests live inside the repository tree:
//! `manifests/<first letter, lowercased>/<segments joined by '/'>`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::MANIFEST_ROOT;

/// An accepted package identifier.
///
/// Construction does not validate; callers are expected to run the raw input
/// through [`crate::validate::validate_package_identifier`] first and only
/// construct the newtype from input that validated as `Success`. Once
/// constructed the identifier is immutable for the rest of the session.
///
/// # Examples
///
/// ```rust
/// use wingen::models::PackageIdentifier;
///
/// let id = PackageIdentifier::new("Microsoft.Excel");
/// assert_eq!(id.as_str(), "Microsoft.Excel");
/// assert_eq!(id.directory_path(), "manifests/m/Microsoft/Excel");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageIdentifier(String);

impl PackageIdentifier {
    /// Create an identifier from already-validated input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Repository directory holding all versions of this package.
    ///
    /// The repository shards packages by the lowercased first letter of the
    /// identifier, then nests one directory per dotted segment.
    pub fn directory_path(&self) -> String {
        let shard = self
            .0
            .chars()
            .next()
            .map(|c| c.to_lowercase().to_string())
            .unwrap_or_default();
        format!("{MANIFEST_ROOT}/{shard}/{}", self.0.replace('.', "/"))
    }

    /// Repository directory holding one published version of this package.
    pub fn version_path(&self, version: &crate::models::PackageVersion) -> String {
        format!("{}/{}", self.directory_path(), version)
    }
}

impl fmt::Display for PackageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageIdentifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PackageVersion;

    #[test]
    fn directory_path_shards_by_first_letter() {
        let id = PackageIdentifier::new("Microsoft.Excel");
        assert_eq!(id.directory_path(), "manifests/m/Microsoft/Excel");
    }

    #[test]
    fn directory_path_handles_multi_segment_identifiers() {
        let id = PackageIdentifier::new("Microsoft.VisualStudio.Community");
        assert_eq!(
            id.directory_path(),
            "manifests/m/Microsoft/VisualStudio/Community"
        );
    }

    #[test]
    fn version_path_appends_version() {
        let id = PackageIdentifier::new("Foo.Bar");
        let version = PackageVersion::new("1.2.3");
        assert_eq!(id.version_path(&version), "manifests/f/Foo/Bar/1.2.3");
    }
}
