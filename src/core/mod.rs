//! Core types for wingen.
//!
//! This module holds the error types shared by every other module. Validation
//! results live next to the validators instead; only failures that cannot be
//! fixed by re-prompting the user belong here.

pub mod error;

pub use error::{ErrorContext, WingenError};
