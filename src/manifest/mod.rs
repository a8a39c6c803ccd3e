//! Manifest types, kinds, and file naming conventions.
//!
//! A published package version is described by up to four kinds of YAML
//! manifest living side by side in one repository directory:
//!
//! | Kind            | File name                              |
//! |-----------------|----------------------------------------|
//! | Version         | `<identifier>.yaml`                    |
//! | Installer       | `<identifier>.installer.yaml`          |
//! | Default locale  | `<identifier>.locale.<default>.yaml`   |
//! | Locale (0..N)   | `<identifier>.locale.<tag>.yaml`       |
//!
//! The structs here decode the previously published files so their values
//! can pre-fill a new authoring session. Unknown YAML keys are tolerated;
//! only the fields this crate consumes are modeled.

pub mod session;

pub use session::{AuthoringSession, InstallerEntry};

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::WingenError;
use crate::models::{InstallerType, LocaleTag, PackageIdentifier, PackageVersion};

/// The four kinds of manifest file that make up a published version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    Version,
    Installer,
    DefaultLocale,
    Locale,
}

impl ManifestKind {
    /// The `ManifestType` field value used inside manifests of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            ManifestKind::Version => "version",
            ManifestKind::Installer => "installer",
            ManifestKind::DefaultLocale => "defaultLocale",
            ManifestKind::Locale => "locale",
        }
    }

    /// Stable dense index, used to key per-kind storage.
    pub(crate) const fn index(self) -> usize {
        match self {
            ManifestKind::Version => 0,
            ManifestKind::Installer => 1,
            ManifestKind::DefaultLocale => 2,
            ManifestKind::Locale => 3,
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// File name of the version manifest: `<identifier>.yaml`.
pub fn version_manifest_name(identifier: &PackageIdentifier) -> String {
    format!("{identifier}.yaml")
}

/// File name of the installer manifest: `<identifier>.installer.yaml`.
pub fn installer_manifest_name(identifier: &PackageIdentifier) -> String {
    format!("{identifier}.installer.yaml")
}

/// File name of a locale manifest: `<identifier>.locale.<tag>.yaml`.
pub fn locale_manifest_name(identifier: &PackageIdentifier, tag: &LocaleTag) -> String {
    format!("{identifier}.locale.{tag}.yaml")
}

/// Pattern matching every locale manifest file name for `identifier`,
/// default locale included.
pub fn locale_manifest_pattern(identifier: &PackageIdentifier) -> Regex {
    let escaped = regex::escape(identifier.as_str());
    // The escaped identifier contains no regex metacharacters, so this
    // always compiles.
    Regex::new(&format!(r"^{escaped}\.locale\..+\.yaml$"))
        .unwrap_or_else(|_| unreachable!("escaped identifier pattern always compiles"))
}

/// Extract the locale tag out of a locale manifest file name.
///
/// Returns `None` when `name` is not a locale manifest for `identifier`.
pub fn locale_tag_from_name(identifier: &PackageIdentifier, name: &str) -> Option<LocaleTag> {
    let prefix = format!("{identifier}.locale.");
    let tag = name.strip_prefix(&prefix)?.strip_suffix(".yaml")?;
    if tag.is_empty() {
        return None;
    }
    Some(LocaleTag::new(tag))
}

/// Decode one manifest file, attributing failures to its repository path.
pub(crate) fn decode_manifest<T: DeserializeOwned>(
    content: &str,
    path: &str,
) -> Result<T, WingenError> {
    serde_yaml::from_str(content).map_err(|source| WingenError::Decode {
        path: path.to_string(),
        source,
    })
}

/// The version manifest: identifies the package, its version, and which
/// locale is the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersionManifest {
    pub package_identifier: PackageIdentifier,
    pub package_version: PackageVersion,
    pub default_locale: LocaleTag,
    pub manifest_type: String,
    pub manifest_version: String,
}

/// One installer artifact inside an installer manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Installer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    pub installer_url: String,
    pub installer_sha256: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_type: Option<InstallerType>,
}

/// The installer manifest: the package's downloadable artifacts and their
/// content hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstallerManifest {
    pub package_identifier: PackageIdentifier,
    pub package_version: PackageVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installer_type: Option<InstallerType>,
    #[serde(default)]
    pub installers: Vec<Installer>,
    pub manifest_type: String,
    pub manifest_version: String,
}

/// The default locale manifest: publisher metadata in the package's primary
/// language, including the seven optional locale URL fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DefaultLocaleManifest {
    pub package_identifier: PackageIdentifier,
    pub package_version: PackageVersion,
    pub package_locale: LocaleTag,
    pub publisher: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_support_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_url: Option<String>,
    pub package_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_url: Option<String>,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copyright_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub manifest_type: String,
    pub manifest_version: String,
}

/// A non-default locale manifest. Everything beyond the locale tag is
/// optional; translators fill in what they have.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocaleManifest {
    pub package_identifier: PackageIdentifier,
    pub package_version: PackageVersion,
    pub package_locale: LocaleTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub manifest_type: String,
    pub manifest_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PackageIdentifier {
        PackageIdentifier::new(raw)
    }

    #[test]
    fn file_names_follow_convention() {
        let identifier = id("Foo.Bar");
        assert_eq!(version_manifest_name(&identifier), "Foo.Bar.yaml");
        assert_eq!(installer_manifest_name(&identifier), "Foo.Bar.installer.yaml");
        assert_eq!(
            locale_manifest_name(&identifier, &LocaleTag::new("en-US")),
            "Foo.Bar.locale.en-US.yaml"
        );
    }

    #[test]
    fn locale_pattern_matches_only_this_identifier() {
        let pattern = locale_manifest_pattern(&id("Foo.Bar"));
        assert!(pattern.is_match("Foo.Bar.locale.en-US.yaml"));
        assert!(pattern.is_match("Foo.Bar.locale.pt-BR.yaml"));
        assert!(!pattern.is_match("Foo.Bar.yaml"));
        assert!(!pattern.is_match("Foo.Bar.installer.yaml"));
        assert!(!pattern.is_match("Foo.Baz.locale.en-US.yaml"));
        // The dot in the identifier must not act as a wildcard.
        assert!(!pattern.is_match("FooXBar.locale.en-US.yaml"));
    }

    #[test]
    fn locale_tag_extraction() {
        let identifier = id("Foo.Bar");
        assert_eq!(
            locale_tag_from_name(&identifier, "Foo.Bar.locale.en-US.yaml"),
            Some(LocaleTag::new("en-US"))
        );
        assert_eq!(locale_tag_from_name(&identifier, "Foo.Bar.yaml"), None);
        assert_eq!(locale_tag_from_name(&identifier, "Foo.Bar.locale..yaml"), None);
    }

    #[test]
    fn version_manifest_decodes() {
        let yaml = "\
PackageIdentifier: Foo.Bar
PackageVersion: 1.2.3
DefaultLocale: en-US
ManifestType: version
ManifestVersion: 1.6.0
";
        let manifest: VersionManifest = decode_manifest(yaml, "Foo.Bar.yaml").unwrap();
        assert_eq!(manifest.package_identifier.as_str(), "Foo.Bar");
        assert_eq!(manifest.default_locale.as_str(), "en-US");
    }

    #[test]
    fn installer_manifest_tolerates_unknown_keys() {
        let yaml = "\
PackageIdentifier: Foo.Bar
PackageVersion: 1.2.3
MinimumOSVersion: 10.0.0.0
Installers:
  - Architecture: x64
    InstallerUrl: https://example.com/foo.msi
    InstallerSha256: 0000000000000000000000000000000000000000000000000000000000000000
    InstallerType: msi
ManifestType: installer
ManifestVersion: 1.6.0
";
        let manifest: InstallerManifest =
            decode_manifest(yaml, "Foo.Bar.installer.yaml").unwrap();
        assert_eq!(manifest.installers.len(), 1);
        assert_eq!(manifest.installers[0].installer_type, Some(InstallerType::Msi));
    }

    #[test]
    fn decode_failure_names_the_file() {
        let err =
            decode_manifest::<VersionManifest>("{ not yaml", "Foo.Bar.yaml").unwrap_err();
        assert!(err.to_string().contains("Foo.Bar.yaml"));
    }

    #[test]
    fn default_locale_manifest_exposes_locale_urls() {
        let yaml = "\
PackageIdentifier: Foo.Bar
PackageVersion: 1.2.3
PackageLocale: en-US
Publisher: Foo Corp
PublisherUrl: https://foo.example
PackageName: Bar
License: MIT
LicenseUrl: https://foo.example/license
ManifestType: defaultLocale
ManifestVersion: 1.6.0
";
        let manifest: DefaultLocaleManifest =
            decode_manifest(yaml, "Foo.Bar.locale.en-US.yaml").unwrap();
        assert_eq!(manifest.publisher_url.as_deref(), Some("https://foo.example"));
        assert_eq!(manifest.release_notes_url, None);
    }
}
