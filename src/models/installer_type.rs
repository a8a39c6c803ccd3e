//! The closed set of installer types accepted by the repository.
//!
//! Validation and normalization share one code path: [`InstallerType`]'s
//! `FromStr` performs the case-insensitive match, and the canonical
//! lowercase spelling comes back out of [`InstallerType::as_str`]. There is
//! no separate lookup table that could drift out of sync with the
//! membership check.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raw input did not name any known installer type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown installer type: {value}")]
pub struct ParseInstallerTypeError {
    /// The rejected input
    pub value: String,
}

/// Installer technology of a package's installer artifact.
///
/// Stored in manifests with its canonical lowercase spelling.
///
/// # Examples
///
/// ```rust
/// use wingen::models::InstallerType;
///
/// let parsed: InstallerType = "MSI".parse().unwrap();
/// assert_eq!(parsed, InstallerType::Msi);
/// assert_eq!(parsed.as_str(), "msi");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallerType {
    Msix,
    Msi,
    Appx,
    Exe,
    Zip,
    Inno,
    Nullsoft,
    Wix,
    Burn,
    Pwa,
    Portable,
}

impl InstallerType {
    /// Every accepted installer type, in manifest display order.
    pub const ALL: [InstallerType; 11] = [
        InstallerType::Msix,
        InstallerType::Msi,
        InstallerType::Appx,
        InstallerType::Exe,
        InstallerType::Zip,
        InstallerType::Inno,
        InstallerType::Nullsoft,
        InstallerType::Wix,
        InstallerType::Burn,
        InstallerType::Pwa,
        InstallerType::Portable,
    ];

    /// Canonical manifest spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            InstallerType::Msix => "msix",
            InstallerType::Msi => "msi",
            InstallerType::Appx => "appx",
            InstallerType::Exe => "exe",
            InstallerType::Zip => "zip",
            InstallerType::Inno => "inno",
            InstallerType::Nullsoft => "nullsoft",
            InstallerType::Wix => "wix",
            InstallerType::Burn => "burn",
            InstallerType::Pwa => "pwa",
            InstallerType::Portable => "portable",
        }
    }
}

impl FromStr for InstallerType {
    type Err = ParseInstallerTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        InstallerType::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ParseInstallerTypeError { value: wanted.to_string() })
    }
}

impl fmt::Display for InstallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_is_case_insensitive() {
        for raw in ["msi", "MSI", "Msi"] {
            assert_eq!(raw.parse::<InstallerType>().unwrap(), InstallerType::Msi);
        }
    }

    #[test]
    fn parsing_trims_whitespace() {
        assert_eq!(" exe ".parse::<InstallerType>().unwrap(), InstallerType::Exe);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "tarball".parse::<InstallerType>().unwrap_err();
        assert_eq!(err.value, "tarball");
    }

    #[test]
    fn yaml_round_trip_uses_lowercase() {
        let yaml = serde_yaml::to_string(&InstallerType::Nullsoft).unwrap();
        assert_eq!(yaml.trim(), "nullsoft");
        let back: InstallerType = serde_yaml::from_str("nullsoft").unwrap();
        assert_eq!(back, InstallerType::Nullsoft);
    }
}
