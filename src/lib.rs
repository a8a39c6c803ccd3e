//! wingen - winget manifest authoring core
//!
//! The engine behind an interactive authoring flow for winget package
//! manifests: it resolves what a package previously published, validates
//! newly entered fields against schema-derived constraints, and verifies
//! installer URLs end to end, including redirect resolution and content
//! hashing.
//!
//! # Architecture Overview
//!
//! Authoring a submission touches three concerns, each owned by one module
//! cluster:
//!
//! - **Previous manifests**: [`remote`] lists the package's directory in
//!   the hosted manifest repository and fetches the version, installer,
//!   default locale, and locale manifests concurrently. The version fetch
//!   acts as a barrier, since locale file names depend on the default
//!   locale it reveals. Missing files mean "new package", never failure.
//! - **Field validation**: [`validate`] applies blank/length/pattern/enum
//!   rules to raw input, with constraints supplied by [`schema`] once the
//!   corresponding schema document has loaded. Outcomes are values meant
//!   for re-prompting, not errors.
//! - **URL resolution**: [`url`] probes reachability with a header-only
//!   request, resolves redirect chains with caller confirmation when the
//!   destination leaves the trusted host, and downloads installers to a
//!   scoped temp file to compute their SHA-256.
//!
//! The interactive surface itself (prompt rendering, argument parsing,
//! manifest serialization, pull-request creation) lives in consuming
//! applications; this crate exposes the data types and async services they
//! drive.
//!
//! # Core Modules
//!
//! - [`constants`] - timeouts, naming conventions, trusted hosts
//! - [`core`] - error types shared across the crate
//! - [`models`] - domain newtypes: identifier, version, locale, installer type
//! - [`schema`] - schema-derived constraints and the load gate
//! - [`manifest`] - manifest structs, file naming, session state
//! - [`validate`] - pure field validation
//! - [`url`] - URL probing, redirects, download hashing
//! - [`remote`] - concurrent previous-manifest resolution
//!
//! # Example
//!
//! ```rust,no_run
//! use wingen::manifest::AuthoringSession;
//! use wingen::models::{PackageIdentifier, PackageVersion};
//! use wingen::remote::{GitHubRepository, RemoteManifestResolver};
//! use wingen::schema::FieldConstraints;
//! use wingen::url::UrlResolutionService;
//! use wingen::validate::{FieldKind, validate_package_identifier};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let constraints = FieldConstraints::identifier_default();
//! let outcome = validate_package_identifier("Microsoft.Excel", &constraints);
//! assert!(outcome.is_success());
//!
//! let identifier = PackageIdentifier::new("Microsoft.Excel");
//! let resolver = RemoteManifestResolver::new(GitHubRepository::community()?);
//! let latest = resolver.latest_version(&identifier).await;
//!
//! let mut session = AuthoringSession::new(
//!     identifier.clone(),
//!     PackageVersion::new("16.0.1"),
//! );
//! if let Some(latest) = latest {
//!     let snapshot = resolver.resolve(&identifier, &latest).await.join().await;
//!     session.attach_previous(snapshot);
//! }
//!
//! let urls = UrlResolutionService::new()?;
//! let outcome = urls
//!     .validate(
//!         "https://example.com/excel.msi",
//!         &FieldConstraints::url_default(),
//!         FieldKind::InstallerUrl,
//!         false,
//!     )
//!     .await;
//! if outcome.is_valid() {
//!     let sha256 = urls
//!         .installer_sha256("https://example.com/excel.msi", &session)
//!         .await?;
//!     session.record_installer("https://example.com/excel.msi", sha256);
//! }
//! # Ok(())
//! # }
//! ```

// Core functionality
pub mod constants;
pub mod core;

// Domain types
pub mod manifest;
pub mod models;

// Services
pub mod remote;
pub mod schema;
pub mod url;
pub mod validate;

// test_utils is available to both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
