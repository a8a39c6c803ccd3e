//! Per-session authoring state.
//!
//! One [`AuthoringSession`] exists per package submission. It owns the
//! accepted identifier and version, the installers recorded so far, and the
//! snapshot of previously published manifests once remote resolution has
//! delivered it. Everything a validator needs arrives through this struct
//! or as an explicit argument; there is no ambient registry.
//!
//! The installer list is append-only and single-writer (the prompt-driving
//! caller), so it needs no synchronization. The hashing short-circuit in
//! [`crate::url::UrlResolutionService::installer_sha256`] only reads it.

use crate::models::{PackageIdentifier, PackageVersion};
use crate::remote::RemoteSnapshot;

/// One installer recorded during the session: its URL and the SHA-256 of
/// the payload behind it.
///
/// URLs act as unique keys; recording the same URL twice reuses the first
/// entry's hash instead of downloading again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallerEntry {
    /// Accepted installer download URL
    pub url: String,
    /// Upper-case hex SHA-256 of the downloaded payload
    pub sha256: String,
}

/// State for a single manifest-authoring session.
#[derive(Debug)]
pub struct AuthoringSession {
    identifier: PackageIdentifier,
    version: PackageVersion,
    installers: Vec<InstallerEntry>,
    previous: Option<RemoteSnapshot>,
}

impl AuthoringSession {
    /// Start a session for an accepted identifier and version.
    pub fn new(identifier: PackageIdentifier, version: PackageVersion) -> Self {
        Self {
            identifier,
            version,
            installers: Vec::new(),
            previous: None,
        }
    }

    /// The package identifier this session is authoring.
    pub fn identifier(&self) -> &PackageIdentifier {
        &self.identifier
    }

    /// The version being authored.
    pub fn version(&self) -> &PackageVersion {
        &self.version
    }

    /// Append an installer entry. Entries are never removed or rewritten.
    pub fn record_installer(&mut self, url: impl Into<String>, sha256: impl Into<String>) {
        self.installers.push(InstallerEntry {
            url: url.into(),
            sha256: sha256.into(),
        });
    }

    /// All installers recorded so far, in insertion order.
    pub fn installers(&self) -> &[InstallerEntry] {
        &self.installers
    }

    /// The recorded hash for `url`, if this exact URL was already hashed
    /// during the session.
    pub fn sha256_for_url(&self, url: &str) -> Option<&str> {
        self.installers
            .iter()
            .find(|entry| entry.url == url)
            .map(|entry| entry.sha256.as_str())
    }

    /// Attach the resolved snapshot of previously published manifests.
    pub fn attach_previous(&mut self, snapshot: RemoteSnapshot) {
        self.previous = Some(snapshot);
    }

    /// Previously published manifest data, when resolution has completed.
    pub fn previous(&self) -> Option<&RemoteSnapshot> {
        self.previous.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> AuthoringSession {
        AuthoringSession::new(
            PackageIdentifier::new("Foo.Bar"),
            PackageVersion::new("1.0.0"),
        )
    }

    #[test]
    fn sha256_for_url_finds_exact_match_only() {
        let mut session = session();
        session.record_installer("https://example.com/a.msi", "AAAA");
        session.record_installer("https://example.com/b.msi", "BBBB");

        assert_eq!(session.sha256_for_url("https://example.com/a.msi"), Some("AAAA"));
        assert_eq!(session.sha256_for_url("https://example.com/A.msi"), None);
        assert_eq!(session.sha256_for_url("https://example.com/c.msi"), None);
    }

    #[test]
    fn first_entry_wins_for_duplicate_urls() {
        let mut session = session();
        session.record_installer("https://example.com/a.msi", "FIRST");
        session.record_installer("https://example.com/a.msi", "SECOND");
        assert_eq!(session.sha256_for_url("https://example.com/a.msi"), Some("FIRST"));
    }
}
