//! Error handling for wingen.
//!
//! The error system is split in two:
//! - [`WingenError`] - strongly typed failures for everything that touches
//!   the network, the remote repository, or the filesystem
//! - [`ErrorContext`] - a wrapper that adds a user-facing suggestion so an
//!   interactive caller can display something actionable
//!
//! User-correctable validation results are deliberately *not* errors. They
//! are returned as values ([`crate::validate::ValidationOutcome`] and
//! [`crate::url::UrlValidationOutcome`]) so the caller can re-prompt without
//! unwinding. `WingenError` covers the remaining failure modes:
//!
//! - **Network**: [`WingenError::Network`] - transport failures, including
//!   timeouts, which are classified identically
//! - **HTTP**: [`WingenError::UnsuccessfulResponse`] - a response arrived
//!   but with a status outside the success and redirect classes
//! - **Decoding**: [`WingenError::Decode`] - a previously published manifest
//!   file exists but cannot be parsed
//! - **Repository**: [`WingenError::Repository`] - a listing or read against
//!   the remote manifest repository failed
//! - **Filesystem**: [`WingenError::Io`] - scratch-file errors during
//!   installer downloads
//!
//! A decode failure is always scoped to a single manifest file. Resolution
//! of the remaining files continues and the failed file simply contributes
//! no previous value.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for wingen operations.
#[derive(Error, Debug)]
pub enum WingenError {
    /// A request could not be completed at the transport level.
    ///
    /// Connection refusals, DNS failures, and timeouts all land here; the
    /// caller treats them uniformly as "unreachable".
    #[error("request to {url} failed")]
    Network {
        /// The URL that was being requested
        url: String,
        /// The underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// A response arrived with a status outside the success and redirect
    /// classes.
    #[error("unsuccessful response from {url}: {status}")]
    UnsuccessfulResponse {
        /// The URL that was requested
        url: String,
        /// The HTTP status of the response
        status: reqwest::StatusCode,
    },

    /// An existing manifest file could not be parsed.
    ///
    /// Scoped to one file; sibling fetches are unaffected.
    #[error("failed to decode manifest at {path}")]
    Decode {
        /// Repository path of the file that failed to decode
        path: String,
        /// The underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A repository listing or read failed for a reason other than the
    /// path being absent.
    ///
    /// An absent path is a first-class "new package" state and never
    /// produces this error.
    #[error("repository access failed for {path}: {reason}")]
    Repository {
        /// The repository path being accessed
        path: String,
        /// Human-readable description of the failure
        reason: String,
    },

    /// A local filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl WingenError {
    /// Wrap a transport error together with the URL it occurred on.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network { url: url.into(), source }
    }
}

/// A [`WingenError`] enriched with a suggestion for interactive display.
///
/// # Examples
///
/// ```rust
/// use wingen::core::{ErrorContext, WingenError};
///
/// let error = WingenError::Repository {
///     path: "manifests/m/Microsoft/Excel".to_string(),
///     reason: "rate limited".to_string(),
/// };
/// let ctx = ErrorContext::new(error)
///     .with_suggestion("Retry in a few minutes or provide an API token");
/// let rendered = format!("{ctx}");
/// assert!(rendered.contains("rate limited"));
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: WingenError,
    /// Actionable suggestion for the user, if one exists
    pub suggestion: Option<String>,
}

impl ErrorContext {
    /// Create a new context wrapping `error`.
    pub fn new(error: WingenError) -> Self {
        Self { error, suggestion: None }
    }

    /// Attach a suggestion shown beneath the error message.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Print the error to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{} {}", "error:".red().bold(), self.error);
        if let Some(suggestion) = &self.suggestion {
            eprintln!("{} {}", "hint:".yellow().bold(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  hint: {suggestion}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_error_displays_path_and_reason() {
        let error = WingenError::Repository {
            path: "manifests/f/Foo/Bar/1.0".to_string(),
            reason: "connection reset".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("manifests/f/Foo/Bar/1.0"));
        assert!(message.contains("connection reset"));
    }

    #[test]
    fn decode_error_carries_source() {
        use std::error::Error as _;

        let yaml_err = serde_yaml::from_str::<std::collections::BTreeMap<String, String>>("{")
            .unwrap_err();
        let error = WingenError::Decode {
            path: "Foo.Bar.yaml".to_string(),
            source: yaml_err,
        };
        assert!(error.source().is_some());
    }

    #[test]
    fn context_display_includes_suggestion() {
        let ctx = ErrorContext::new(WingenError::Repository {
            path: "manifests".to_string(),
            reason: "boom".to_string(),
        })
        .with_suggestion("check connectivity");
        let rendered = format!("{ctx}");
        assert!(rendered.contains("boom"));
        assert!(rendered.contains("check connectivity"));
    }
}
