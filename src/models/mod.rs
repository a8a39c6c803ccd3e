//! Shared data models for wingen operations.
//!
//! This module provides the domain newtypes used across validation, remote
//! resolution, and session state, ensuring consistency and reducing stringly
//! typed plumbing.

pub mod installer_type;
pub mod locale;
pub mod package_identifier;
pub mod package_version;

pub use installer_type::{InstallerType, ParseInstallerTypeError};
pub use locale::LocaleTag;
pub use package_identifier::PackageIdentifier;
pub use package_version::PackageVersion;
