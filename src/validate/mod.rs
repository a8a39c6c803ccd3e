//! Stateless field validation against schema-derived constraints.
//!
//! Every function here is pure and synchronous: raw string in, outcome out,
//! no I/O and no hidden state, so validating the same input twice always
//! yields the same outcome. Rules are evaluated in a fixed precedence order
//! and the first failing rule wins:
//!
//! 1. blank input
//! 2. length bounds
//! 3. schema pattern
//! 4. enumerated membership (installer type only, case-insensitive)
//!
//! URL fields get the same treatment plus a network probe in
//! [`crate::url`]; that half is asynchronous and lives separately.

use std::fmt;
use std::str::FromStr;

use crate::models::InstallerType;
use crate::schema::FieldConstraints;

/// The field a validation outcome refers to, used to build prompt-ready
/// messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    PackageIdentifier,
    PackageVersion,
    InstallerType,
    InstallerUrl,
    LocaleUrl,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldKind::PackageIdentifier => "Package Identifier",
            FieldKind::PackageVersion => "Package Version",
            FieldKind::InstallerType => "Installer Type",
            FieldKind::InstallerUrl => "Installer Url",
            FieldKind::LocaleUrl => "Locale Url",
        })
    }
}

/// Result of validating one raw input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Input satisfies every constraint
    Success,
    /// Input was empty or whitespace-only
    Blank { field: FieldKind },
    /// Input length fell outside the accepted bounds
    InvalidLength { field: FieldKind, min: usize, max: usize },
    /// Input did not match the schema pattern
    InvalidPattern { field: FieldKind, pattern: String },
    /// Input named none of the allowed enumerated values
    InvalidEnum { field: FieldKind, allowed: Vec<String> },
}

impl ValidationOutcome {
    /// Whether the input was accepted.
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationOutcome::Success)
    }

    /// Prompt-ready description of the failure, `None` on success.
    pub fn message(&self) -> Option<String> {
        match self {
            ValidationOutcome::Success => None,
            ValidationOutcome::Blank { field } => Some(format!("{field} cannot be blank")),
            ValidationOutcome::InvalidLength { field, min, max } => Some(format!(
                "{field} must be between {min} and {max} characters long"
            )),
            ValidationOutcome::InvalidPattern { field, pattern } => {
                Some(format!("{field} must match the pattern {pattern}"))
            }
            ValidationOutcome::InvalidEnum { field, allowed } => Some(format!(
                "{field} must be one of: {}",
                allowed.join(", ")
            )),
        }
    }
}

/// Validate a raw package identifier against the installer schema
/// constraints.
///
/// The identifier additionally carries a fixed minimum length of 4, below
/// which no published identifier exists.
///
/// # Examples
///
/// ```rust
/// use wingen::schema::FieldConstraints;
/// use wingen::validate::{validate_package_identifier, ValidationOutcome};
///
/// let constraints = FieldConstraints::identifier_default();
/// let outcome = validate_package_identifier("Microsoft.Excel", &constraints);
/// assert!(outcome.is_success());
///
/// let outcome = validate_package_identifier("", &constraints);
/// assert!(matches!(outcome, ValidationOutcome::Blank { .. }));
/// ```
pub fn validate_package_identifier(
    raw: &str,
    constraints: &FieldConstraints,
) -> ValidationOutcome {
    let field = FieldKind::PackageIdentifier;
    let input = raw.trim();
    if input.is_empty() {
        return ValidationOutcome::Blank { field };
    }

    let min = constraints
        .min_length
        .unwrap_or(crate::constants::PACKAGE_IDENTIFIER_MIN_LENGTH);
    let length = input.chars().count();
    if length < min || length > constraints.max_length {
        return ValidationOutcome::InvalidLength {
            field,
            min,
            max: constraints.max_length,
        };
    }

    if let Some(pattern) = &constraints.pattern
        && !pattern.is_match(input)
    {
        return ValidationOutcome::InvalidPattern {
            field,
            pattern: pattern.as_str().to_string(),
        };
    }

    ValidationOutcome::Success
}

/// Validate a raw installer type string.
///
/// Membership is case-insensitive. The closed [`InstallerType`] enum is the
/// authority on which spellings exist; when the schema supplies its own
/// allowed set, the input must also belong to it, so a repository that
/// narrows the set is respected. The `allowed` list carried by a failing
/// outcome is whichever set the user should be shown.
pub fn validate_installer_type(raw: &str, allowed: &[String]) -> ValidationOutcome {
    match validated_installer_type(raw, allowed) {
        Ok(_) => ValidationOutcome::Success,
        Err(outcome) => outcome,
    }
}

/// Validate a raw installer type and return its canonical enum member.
///
/// This is the single code path for both membership checking and
/// normalization: an input that validates always maps to a variant, so no
/// later lookup can disagree with the check performed here.
///
/// # Examples
///
/// ```rust
/// use wingen::models::InstallerType;
/// use wingen::validate::validated_installer_type;
///
/// let canonical = validated_installer_type("MSI", &[]).unwrap();
/// assert_eq!(canonical, InstallerType::Msi);
/// ```
pub fn validated_installer_type(
    raw: &str,
    allowed: &[String],
) -> Result<InstallerType, ValidationOutcome> {
    let field = FieldKind::InstallerType;
    let input = raw.trim();
    if input.is_empty() {
        return Err(ValidationOutcome::Blank { field });
    }

    let shown_set = || -> Vec<String> {
        if allowed.is_empty() {
            InstallerType::ALL.iter().map(|t| t.as_str().to_string()).collect()
        } else {
            allowed.to_vec()
        }
    };

    if !allowed.is_empty()
        && !allowed.iter().any(|value| value.eq_ignore_ascii_case(input))
    {
        return Err(ValidationOutcome::InvalidEnum { field, allowed: shown_set() });
    }

    InstallerType::from_str(input).map_err(|_| ValidationOutcome::InvalidEnum {
        field,
        allowed: shown_set(),
    })
}
