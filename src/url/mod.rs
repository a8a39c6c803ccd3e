//! URL validation, redirect resolution, and installer hashing.
//!
//! URL-valued fields go through the same precedence rules as plain text
//! fields (blank, length, pattern) plus a network reachability probe: a
//! header-only request with redirects disabled, classifying the response
//! status as success, redirect, or failure. Redirects are accepted at the
//! probe stage; resolving them to a final destination is a separate,
//! installer-only step with caller-mediated confirmation.
//!
//! Installer payloads are downloaded to a scoped temporary file, hashed
//! with SHA-256, and the scratch file is removed no matter how the call
//! ends. A URL that was already hashed this session short-circuits to the
//! recorded hash instead of downloading again.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::redirect;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::constants::{
    CONNECT_TIMEOUT, DOWNLOAD_TIMEOUT, REQUEST_TIMEOUT, TRUSTED_INSTALLER_HOST, USER_AGENT,
};
use crate::core::WingenError;
use crate::manifest::{AuthoringSession, DefaultLocaleManifest};
use crate::schema::FieldConstraints;
use crate::validate::FieldKind;

/// Result of validating one URL-valued input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationOutcome {
    /// URL is well formed and, unless blank was permitted, reachable
    Valid,
    /// Input was empty and the field does not permit that
    Blank { field: FieldKind },
    /// Input exceeds the schema maximum length
    InvalidLength { max: usize },
    /// Input does not match the schema URL pattern
    InvalidPattern { pattern: String },
    /// The reachability probe could not complete at the transport level
    Unreachable { url: String, reason: String },
    /// The probe got a response outside the success and redirect classes
    UnsuccessfulResponse { url: String, status: u16 },
}

impl UrlValidationOutcome {
    /// Whether the URL was accepted.
    pub fn is_valid(&self) -> bool {
        matches!(self, UrlValidationOutcome::Valid)
    }

    /// Prompt-ready description of the failure, `None` when valid.
    pub fn message(&self) -> Option<String> {
        match self {
            UrlValidationOutcome::Valid => None,
            UrlValidationOutcome::Blank { field } => Some(format!("{field} cannot be blank")),
            UrlValidationOutcome::InvalidLength { max } => {
                Some(format!("the URL must be at most {max} characters long"))
            }
            UrlValidationOutcome::InvalidPattern { pattern } => {
                Some(format!("the URL must match the pattern {pattern}"))
            }
            UrlValidationOutcome::Unreachable { url, reason } => {
                Some(format!("{url} could not be reached: {reason}"))
            }
            UrlValidationOutcome::UnsuccessfulResponse { url, status } => {
                Some(format!("{url} responded with status {status}"))
            }
        }
    }
}

/// A redirect that left the trusted source-hosting domain and therefore
/// needs the caller's confirmation before it replaces the accepted URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectedUrl {
    /// The URL the user originally entered and validated
    pub original: String,
    /// The final destination of the redirect chain
    pub resolved: String,
}

/// Validates URLs, resolves redirect chains, and hashes installer payloads.
///
/// Holds two HTTP clients: one with redirects disabled for the reachability
/// probe, one with the default redirect policy and a generous timeout for
/// chain resolution and payload downloads.
pub struct UrlResolutionService {
    probe_client: reqwest::Client,
    client: reqwest::Client,
}

impl UrlResolutionService {
    /// Build the service and its HTTP clients.
    pub fn new() -> reqwest::Result<Self> {
        let probe_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::none())
            .build()?;
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { probe_client, client })
    }

    /// Validate a raw URL against the schema constraints for its field.
    ///
    /// Rules run in precedence order and the first failure wins:
    /// 1. blank input: `Valid` when `can_be_blank`, otherwise `Blank`
    /// 2. length against the schema maximum
    /// 3. schema URL pattern
    /// 4. reachability probe: header-only request, redirects disabled;
    ///    success and redirect statuses are both accepted
    ///
    /// A probe timeout is classified as `Unreachable`, the same as any
    /// other transport failure.
    pub async fn validate(
        &self,
        raw: &str,
        constraints: &FieldConstraints,
        field: FieldKind,
        can_be_blank: bool,
    ) -> UrlValidationOutcome {
        let url = raw.trim();
        if url.is_empty() {
            return if can_be_blank {
                UrlValidationOutcome::Valid
            } else {
                UrlValidationOutcome::Blank { field }
            };
        }

        if url.chars().count() > constraints.max_length {
            return UrlValidationOutcome::InvalidLength { max: constraints.max_length };
        }

        if let Some(pattern) = &constraints.pattern
            && !pattern.is_match(url)
        {
            return UrlValidationOutcome::InvalidPattern {
                pattern: pattern.as_str().to_string(),
            };
        }

        debug!(%url, "probing URL reachability");
        match self.probe_client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() || status.is_redirection() {
                    UrlValidationOutcome::Valid
                } else {
                    UrlValidationOutcome::UnsuccessfulResponse {
                        url: url.to_string(),
                        status: status.as_u16(),
                    }
                }
            }
            Err(source) => UrlValidationOutcome::Unreachable {
                url: url.to_string(),
                reason: source.to_string(),
            },
        }
    }

    /// Follow the full redirect chain of `url` and return the final URL.
    pub async fn resolve_redirect_chain(&self, url: &str) -> Result<String, WingenError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|source| WingenError::network(url, source))?;
        Ok(response.url().to_string())
    }

    /// Detect whether `url` redirects away from the trusted hosting domain.
    ///
    /// Returns `Some` only when the chain ends on a different URL whose
    /// destination is off the trusted host; the caller is expected to
    /// confirm the swap with the user and then call
    /// [`UrlResolutionService::apply_redirect`]. Redirects that stay on the
    /// trusted host, and chain-resolution failures, yield `None` and the
    /// accepted URL stands.
    pub async fn detect_redirect(&self, url: &str) -> Option<RedirectedUrl> {
        match self.resolve_redirect_chain(url).await {
            Ok(resolved) => {
                if leaves_trusted_host(url, &resolved) {
                    info!(%url, %resolved, "redirect leaves trusted host");
                    Some(RedirectedUrl { original: url.to_string(), resolved })
                } else {
                    None
                }
            }
            Err(error) => {
                warn!(%url, %error, "redirect resolution failed, keeping accepted URL");
                None
            }
        }
    }

    /// Apply the caller's decision on a detected redirect.
    ///
    /// With `accept` the resolved URL is re-validated from scratch; if that
    /// re-validation fails the *original* URL is retained as-is. The
    /// original is not probed again on that path: it already passed
    /// validation before redirect resolution began, and re-checking it here
    /// would turn a rejected detour into a hard failure.
    pub async fn apply_redirect(
        &self,
        redirect: &RedirectedUrl,
        constraints: &FieldConstraints,
        accept: bool,
    ) -> String {
        if !accept {
            info!(url = %redirect.original, "original URL retained");
            return redirect.original.clone();
        }

        match self
            .validate(&redirect.resolved, constraints, FieldKind::InstallerUrl, false)
            .await
        {
            UrlValidationOutcome::Valid => redirect.resolved.clone(),
            outcome => {
                warn!(
                    url = %redirect.resolved,
                    reason = %outcome.message().unwrap_or_default(),
                    "validation failed for detected URL, using original"
                );
                redirect.original.clone()
            }
        }
    }

    /// Compute the upper-case hex SHA-256 of the payload behind `url`.
    ///
    /// If the exact URL was already hashed this session, the recorded hash
    /// is returned without touching the network. Otherwise the payload is
    /// downloaded to a scoped temporary file, hashed, and the scratch file
    /// is removed whether or not hashing succeeded.
    pub async fn installer_sha256(
        &self,
        url: &str,
        session: &AuthoringSession,
    ) -> Result<String> {
        if let Some(hash) = session.sha256_for_url(url) {
            debug!(%url, "reusing installer hash recorded earlier this session");
            return Ok(hash.to_string());
        }
        self.download_and_hash(url)
            .await
            .with_context(|| format!("failed to hash installer from {url}"))
    }

    async fn download_and_hash(&self, url: &str) -> Result<String, WingenError> {
        debug!(%url, "downloading installer payload");
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| WingenError::network(url, source))?;
        let status = response.status();
        if !status.is_success() {
            return Err(WingenError::UnsuccessfulResponse { url: url.to_string(), status });
        }

        // Dropping the handle removes the scratch file on every exit path.
        let scratch = tempfile::Builder::new()
            .prefix("wingen-installer-")
            .tempfile()?;
        let path = scratch.path().to_path_buf();

        let mut file = tokio::fs::File::create(&path).await?;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| WingenError::network(url, source))?
        {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);

        let digest = hash_file(&path).await?;
        info!(%url, sha256 = %digest, "installer hashed");
        Ok(digest)
    }
}

/// Upper-case hex SHA-256 of a file's contents.
pub async fn hash_file(path: &Path) -> Result<String, WingenError> {
    let contents = tokio::fs::read(path).await?;
    let mut hasher = Sha256::new();
    hasher.update(&contents);
    Ok(hex::encode_upper(hasher.finalize()))
}

/// Whether a resolved redirect destination left the trusted hosting domain.
///
/// A chain that resolves back to the accepted URL, or that ends anywhere on
/// the trusted host, is not worth surfacing.
fn leaves_trusted_host(original: &str, resolved: &str) -> bool {
    resolved != original
        && !resolved
            .to_ascii_lowercase()
            .contains(TRUSTED_INSTALLER_HOST)
}

/// The URL-valued fields of a default locale manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleUrlField {
    PublisherUrl,
    PublisherSupportUrl,
    PrivacyUrl,
    PackageUrl,
    LicenseUrl,
    CopyrightUrl,
    ReleaseNotesUrl,
}

impl LocaleUrlField {
    /// Every locale URL field, in prompt order.
    pub const ALL: [LocaleUrlField; 7] = [
        LocaleUrlField::PublisherUrl,
        LocaleUrlField::PublisherSupportUrl,
        LocaleUrlField::PrivacyUrl,
        LocaleUrlField::PackageUrl,
        LocaleUrlField::LicenseUrl,
        LocaleUrlField::CopyrightUrl,
        LocaleUrlField::ReleaseNotesUrl,
    ];

    /// Manifest field name.
    pub const fn as_str(self) -> &'static str {
        match self {
            LocaleUrlField::PublisherUrl => "PublisherUrl",
            LocaleUrlField::PublisherSupportUrl => "PublisherSupportUrl",
            LocaleUrlField::PrivacyUrl => "PrivacyUrl",
            LocaleUrlField::PackageUrl => "PackageUrl",
            LocaleUrlField::LicenseUrl => "LicenseUrl",
            LocaleUrlField::CopyrightUrl => "CopyrightUrl",
            LocaleUrlField::ReleaseNotesUrl => "ReleaseNotesUrl",
        }
    }
}

impl std::fmt::Display for LocaleUrlField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The previously published value for a locale URL field, offered to the
/// user as a fallback when they do not type a new value.
pub fn previous_locale_url(
    manifest: &DefaultLocaleManifest,
    field: LocaleUrlField,
) -> Option<&str> {
    let value = match field {
        LocaleUrlField::PublisherUrl => &manifest.publisher_url,
        LocaleUrlField::PublisherSupportUrl => &manifest.publisher_support_url,
        LocaleUrlField::PrivacyUrl => &manifest.privacy_url,
        LocaleUrlField::PackageUrl => &manifest.package_url,
        LocaleUrlField::LicenseUrl => &manifest.license_url,
        LocaleUrlField::CopyrightUrl => &manifest.copyright_url,
        LocaleUrlField::ReleaseNotesUrl => &manifest.release_notes_url,
    };
    value.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::decode_manifest;
    use crate::models::{PackageIdentifier, PackageVersion};
    use crate::test_utils::{CannedResponse, TestHttpServer};

    fn url_constraints() -> FieldConstraints {
        FieldConstraints::url_default()
    }

    fn service() -> UrlResolutionService {
        UrlResolutionService::new().unwrap()
    }

    #[tokio::test]
    async fn blank_url_is_valid_only_when_permitted() {
        let service = service();
        let constraints = url_constraints();
        let blank_ok = service
            .validate("", &constraints, FieldKind::LocaleUrl, true)
            .await;
        assert!(blank_ok.is_valid());

        let blank_rejected = service
            .validate("  ", &constraints, FieldKind::InstallerUrl, false)
            .await;
        assert_eq!(
            blank_rejected,
            UrlValidationOutcome::Blank { field: FieldKind::InstallerUrl }
        );
    }

    #[tokio::test]
    async fn overlong_url_fails_before_any_probe() {
        let service = service();
        let constraints = FieldConstraints {
            max_length: 20,
            ..url_constraints()
        };
        let long = format!("https://example.com/{}", "a".repeat(50));
        assert_eq!(
            service
                .validate(&long, &constraints, FieldKind::InstallerUrl, false)
                .await,
            UrlValidationOutcome::InvalidLength { max: 20 }
        );
    }

    #[tokio::test]
    async fn non_url_input_fails_pattern() {
        let service = service();
        let outcome = service
            .validate("not a url", &url_constraints(), FieldKind::InstallerUrl, false)
            .await;
        assert!(matches!(outcome, UrlValidationOutcome::InvalidPattern { .. }));
    }

    #[tokio::test]
    async fn probe_accepts_success_status() {
        let server = TestHttpServer::serve(CannedResponse::ok(b"hi".to_vec())).await;
        let outcome = service()
            .validate(
                &server.url("/file.msi"),
                &url_constraints(),
                FieldKind::InstallerUrl,
                false,
            )
            .await;
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn probe_accepts_redirect_status() {
        let server = TestHttpServer::serve(CannedResponse::redirect("https://elsewhere.example/"))
            .await;
        let outcome = service()
            .validate(
                &server.url("/moved.msi"),
                &url_constraints(),
                FieldKind::InstallerUrl,
                false,
            )
            .await;
        assert!(outcome.is_valid());
    }

    #[tokio::test]
    async fn probe_reports_unsuccessful_status() {
        let server = TestHttpServer::serve(CannedResponse::status(404)).await;
        let url = server.url("/missing.msi");
        let outcome = service()
            .validate(&url, &url_constraints(), FieldKind::InstallerUrl, false)
            .await;
        assert_eq!(
            outcome,
            UrlValidationOutcome::UnsuccessfulResponse { url, status: 404 }
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_classified_as_unreachable() {
        // Bind and immediately drop a listener so the port refuses
        // connections instead of timing out.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = service()
            .validate(
                &format!("http://{addr}/installer.msi"),
                &url_constraints(),
                FieldKind::InstallerUrl,
                false,
            )
            .await;
        assert!(matches!(outcome, UrlValidationOutcome::Unreachable { .. }));
    }

    #[tokio::test]
    async fn redirect_chain_resolves_to_final_url() {
        let target = TestHttpServer::serve(CannedResponse::ok(b"payload".to_vec())).await;
        let target_url = target.url("/final.msi");
        let hop = TestHttpServer::serve(CannedResponse::redirect(&target_url)).await;

        let resolved = service()
            .resolve_redirect_chain(&hop.url("/start.msi"))
            .await
            .unwrap();
        assert_eq!(resolved, target_url);
    }

    #[tokio::test]
    async fn detect_redirect_surfaces_untrusted_destination() {
        let target = TestHttpServer::serve(CannedResponse::ok(Vec::new())).await;
        let target_url = target.url("/final.msi");
        let hop = TestHttpServer::serve(CannedResponse::redirect(&target_url)).await;
        let original = hop.url("/start.msi");

        let redirect = service().detect_redirect(&original).await.unwrap();
        assert_eq!(redirect.original, original);
        assert_eq!(redirect.resolved, target_url);
    }

    #[tokio::test]
    async fn detect_redirect_ignores_non_redirecting_urls() {
        let server = TestHttpServer::serve(CannedResponse::ok(Vec::new())).await;
        assert!(service().detect_redirect(&server.url("/direct.msi")).await.is_none());
    }

    #[test]
    fn trusted_host_destinations_are_not_surfaced() {
        assert!(!leaves_trusted_host(
            "https://example.com/a",
            "https://example.com/a"
        ));
        assert!(!leaves_trusted_host(
            "https://example.com/a",
            "https://github.com/owner/repo/releases/download/v1/a.msi"
        ));
        assert!(leaves_trusted_host(
            "https://example.com/a",
            "https://cdn.example.net/a.msi"
        ));
    }

    #[tokio::test]
    async fn apply_redirect_rejection_keeps_original() {
        let service = service();
        let redirect = RedirectedUrl {
            original: "https://example.com/original.msi".to_string(),
            resolved: "https://cdn.example.net/detected.msi".to_string(),
        };
        let chosen = service
            .apply_redirect(&redirect, &url_constraints(), false)
            .await;
        assert_eq!(chosen, redirect.original);
    }

    #[tokio::test]
    async fn apply_redirect_falls_back_when_detected_url_fails() {
        let service = service();
        let redirect = RedirectedUrl {
            original: "https://example.com/original.msi".to_string(),
            // Pattern failure, so no probe is attempted.
            resolved: "ftp://cdn.example.net/detected.msi".to_string(),
        };
        let chosen = service
            .apply_redirect(&redirect, &url_constraints(), true)
            .await;
        assert_eq!(chosen, redirect.original);
    }

    #[tokio::test]
    async fn apply_redirect_accepts_valid_detected_url() {
        let target = TestHttpServer::serve(CannedResponse::ok(Vec::new())).await;
        let redirect = RedirectedUrl {
            original: "https://example.com/original.msi".to_string(),
            resolved: target.url("/detected.msi"),
        };
        let chosen = service()
            .apply_redirect(&redirect, &url_constraints(), true)
            .await;
        assert_eq!(chosen, redirect.resolved);
    }

    #[tokio::test]
    async fn download_hashes_payload_upper_hex() {
        let server = TestHttpServer::serve(CannedResponse::ok(b"Hello, World!".to_vec())).await;
        let session = AuthoringSession::new(
            PackageIdentifier::new("Foo.Bar"),
            PackageVersion::new("1.0"),
        );
        let hash = service()
            .installer_sha256(&server.url("/hello.msi"), &session)
            .await
            .unwrap();
        assert_eq!(
            hash,
            "DFFD6021BB2BD5B0AF676290809EC3A53191DD81C7F70A4B28688A362182986F"
        );
    }

    #[tokio::test]
    async fn recorded_hash_is_reused_without_downloading() {
        let server = TestHttpServer::serve(CannedResponse::ok(b"payload".to_vec())).await;
        let url = server.url("/cached.msi");

        let mut session = AuthoringSession::new(
            PackageIdentifier::new("Foo.Bar"),
            PackageVersion::new("1.0"),
        );
        session.record_installer(&url, "CAFEBABE");

        let hash = service().installer_sha256(&url, &session).await.unwrap();
        assert_eq!(hash, "CAFEBABE");
        assert_eq!(server.hits(), 0);
    }

    #[tokio::test]
    async fn download_failure_surfaces_status() {
        let server = TestHttpServer::serve(CannedResponse::status(500)).await;
        let session = AuthoringSession::new(
            PackageIdentifier::new("Foo.Bar"),
            PackageVersion::new("1.0"),
        );
        let err = service()
            .installer_sha256(&server.url("/broken.msi"), &session)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to hash installer"));
    }

    #[test]
    fn previous_locale_url_reads_the_right_field() {
        let yaml = "\
PackageIdentifier: Foo.Bar
PackageVersion: 1.0.0
PackageLocale: en-US
Publisher: Foo Corp
PublisherUrl: https://foo.example
PackageName: Bar
License: MIT
ReleaseNotesUrl: https://foo.example/notes
ManifestType: defaultLocale
ManifestVersion: 1.6.0
";
        let manifest: DefaultLocaleManifest =
            decode_manifest(yaml, "Foo.Bar.locale.en-US.yaml").unwrap();
        assert_eq!(
            previous_locale_url(&manifest, LocaleUrlField::PublisherUrl),
            Some("https://foo.example")
        );
        assert_eq!(
            previous_locale_url(&manifest, LocaleUrlField::ReleaseNotesUrl),
            Some("https://foo.example/notes")
        );
        assert_eq!(previous_locale_url(&manifest, LocaleUrlField::LicenseUrl), None);
    }
}
