//! Global constants used throughout the wingen codebase.
//!
//! This module contains timeout durations, naming conventions, and other
//! constants that are used across multiple modules. Defining them centrally
//! improves maintainability and makes magic numbers more discoverable.

use std::time::Duration;

/// User agent sent with every outbound HTTP request.
pub const USER_AGENT: &str = concat!("wingen/", env!("CARGO_PKG_VERSION"));

/// Timeout for establishing an HTTP connection (10 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reachability probes and manifest fetches (30 seconds).
///
/// A probe that exceeds this is treated the same as a connection failure,
/// not as a distinct error kind.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for full installer payload downloads (10 minutes).
///
/// Installers can be hundreds of megabytes, so the download timeout is
/// much more generous than the probe timeout.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Maximum number of locale manifest files fetched concurrently.
pub const MAX_CONCURRENT_LOCALE_FETCHES: usize = 4;

/// Host substring that marks an installer URL as already living on the
/// trusted source-hosting domain.
///
/// Redirects that land on this host are accepted silently; redirects that
/// leave it are surfaced for caller confirmation.
pub const TRUSTED_INSTALLER_HOST: &str = "github";

/// GitHub repository holding the community package manifests.
pub const DEFAULT_MANIFEST_REPOSITORY: &str = "microsoft/winget-pkgs";

/// Root directory of the manifest tree inside the repository.
pub const MANIFEST_ROOT: &str = "manifests";

/// Minimum accepted length for a package identifier.
///
/// The maximum comes from the installer schema; the minimum is fixed by the
/// repository's contribution rules.
pub const PACKAGE_IDENTIFIER_MIN_LENGTH: usize = 4;
