//! Schema-derived field constraints and the gate that guards their
//! availability.
//!
//! The repository publishes JSON schema documents describing each manifest
//! kind. This crate does not validate documents against those schemas; it
//! only consumes three already-parsed primitives per field: a maximum
//! length, a regular expression pattern, and (for installer types) an
//! enumerated value set. [`SchemaConstraints::from_schema_json`] digs those
//! primitives out of a schema document, and [`SchemaStore`] lets loading
//! proceed in the background while validation calls wait for the constraints
//! they need instead of racing ahead.

use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::constants::PACKAGE_IDENTIFIER_MIN_LENGTH;
use crate::manifest::ManifestKind;

/// Default maximum length for package identifiers when a schema omits one.
const DEFAULT_IDENTIFIER_MAX_LENGTH: usize = 128;

/// Default maximum length for URL fields when a schema omits one.
const DEFAULT_URL_MAX_LENGTH: usize = 2048;

/// Default pattern for package identifiers (publisher.name, up to eight
/// dotted segments, no whitespace or filesystem-reserved characters).
const DEFAULT_IDENTIFIER_PATTERN: &str =
    r#"^[^\.\s\\/:\*\?"<>\|\x01-\x1f]{1,32}(\.[^\.\s\\/:\*\?"<>\|\x01-\x1f]{1,32}){1,7}$"#;

/// Default pattern for URL fields.
const DEFAULT_URL_PATTERN: &str = r"^([Hh][Tt][Tt][Pp][Ss]?)://.+$";

/// Constraints for a single string field.
#[derive(Debug, Clone)]
pub struct FieldConstraints {
    /// Maximum accepted length in characters
    pub max_length: usize,
    /// Minimum accepted length, when the field has a floor
    pub min_length: Option<usize>,
    /// Pattern the raw value must match, when the schema supplies one
    pub pattern: Option<Regex>,
}

impl FieldConstraints {
    /// Built-in constraints for package identifiers.
    pub fn identifier_default() -> Self {
        Self {
            max_length: DEFAULT_IDENTIFIER_MAX_LENGTH,
            min_length: Some(PACKAGE_IDENTIFIER_MIN_LENGTH),
            // The default pattern is a compile-time constant.
            pattern: Regex::new(DEFAULT_IDENTIFIER_PATTERN).ok(),
        }
    }

    /// Built-in constraints for URL fields.
    pub fn url_default() -> Self {
        Self {
            max_length: DEFAULT_URL_MAX_LENGTH,
            min_length: None,
            pattern: Regex::new(DEFAULT_URL_PATTERN).ok(),
        }
    }
}

/// The parsed constraint set for one manifest kind.
#[derive(Debug, Clone)]
pub struct SchemaConstraints {
    /// Constraints for the package identifier field
    pub package_identifier: FieldConstraints,
    /// Constraints for URL-valued fields
    pub url: FieldConstraints,
    /// Allowed installer type spellings, empty when the schema has none
    pub installer_types: Vec<String>,
}

impl Default for SchemaConstraints {
    fn default() -> Self {
        Self {
            package_identifier: FieldConstraints::identifier_default(),
            url: FieldConstraints::url_default(),
            installer_types: Vec::new(),
        }
    }
}

impl SchemaConstraints {
    /// Extract constraint primitives from a manifest JSON schema document.
    ///
    /// Reads `definitions.PackageIdentifier` and `definitions.Url` for
    /// `{maxLength, pattern}` and `definitions.InstallerType.enum` for the
    /// installer type set. Missing definitions fall back to the built-in
    /// defaults; a pattern that fails to compile is an error, since silently
    /// skipping it would loosen validation.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use wingen::schema::SchemaConstraints;
    ///
    /// let doc = serde_json::json!({
    ///     "definitions": {
    ///         "PackageIdentifier": { "type": "string", "maxLength": 128,
    ///                                "pattern": "^\\S+\\.\\S+$" },
    ///         "InstallerType": { "enum": ["msi", "exe", "zip"] },
    ///     }
    /// });
    /// let constraints = SchemaConstraints::from_schema_json(&doc).unwrap();
    /// assert_eq!(constraints.package_identifier.max_length, 128);
    /// assert_eq!(constraints.installer_types, ["msi", "exe", "zip"]);
    /// ```
    pub fn from_schema_json(doc: &Value) -> Result<Self> {
        let mut constraints = Self::default();

        if let Some(def) = definition(doc, "PackageIdentifier") {
            apply_field(&mut constraints.package_identifier, def)
                .context("invalid PackageIdentifier definition")?;
        }
        if let Some(def) = definition(doc, "Url") {
            apply_field(&mut constraints.url, def).context("invalid Url definition")?;
        }
        if let Some(values) = definition(doc, "InstallerType").and_then(|d| d.get("enum")) {
            constraints.installer_types = values
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
        }

        Ok(constraints)
    }
}

fn definition<'a>(doc: &'a Value, name: &str) -> Option<&'a Value> {
    let defs = doc.get("definitions")?;
    // Schema revisions have used both spellings.
    defs.get(name).or_else(|| {
        let mut lower = name.to_string();
        lower[..1].make_ascii_lowercase();
        defs.get(&lower)
    })
}

fn apply_field(field: &mut FieldConstraints, def: &Value) -> Result<()> {
    if let Some(max) = def.get("maxLength").and_then(Value::as_u64) {
        field.max_length = max as usize;
    }
    if let Some(min) = def.get("minLength").and_then(Value::as_u64) {
        field.min_length = Some(min as usize);
    }
    if let Some(pattern) = def.get("pattern").and_then(Value::as_str) {
        field.pattern = Some(
            Regex::new(pattern).with_context(|| format!("pattern does not compile: {pattern}"))?,
        );
    }
    Ok(())
}

/// Holds the constraint set for each manifest kind and lets consumers wait
/// for a kind to finish loading.
///
/// The store is filled by whatever loads the schema documents (typically a
/// background task fetching them over HTTP) via [`SchemaStore::install`].
/// Validation code calls [`SchemaStore::wait`] and suspends until the
/// constraints for the requested kind are present, so a fast-typing user
/// can never outrun the schema fetch.
pub struct SchemaStore {
    slots: [watch::Sender<Option<Arc<SchemaConstraints>>>; 4],
}

impl SchemaStore {
    /// Create an empty store; every kind starts unloaded.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| watch::channel(None).0),
        }
    }

    /// Install the constraints for one manifest kind, waking any waiters.
    ///
    /// Installing a kind twice replaces the earlier constraints; waiters
    /// that already resolved keep the snapshot they saw.
    pub fn install(&self, kind: ManifestKind, constraints: SchemaConstraints) {
        debug!(kind = %kind, "schema constraints installed");
        self.slot(kind).send_replace(Some(Arc::new(constraints)));
    }

    /// Constraints for `kind`, if already loaded.
    pub fn get(&self, kind: ManifestKind) -> Option<Arc<SchemaConstraints>> {
        self.slot(kind).borrow().clone()
    }

    /// Wait until the constraints for `kind` have been installed.
    pub async fn wait(&self, kind: ManifestKind) -> Arc<SchemaConstraints> {
        let mut rx = self.slot(kind).subscribe();
        let guard = rx
            .wait_for(Option::is_some)
            .await
            .expect("schema slot sender lives as long as the store");
        match guard.as_ref() {
            Some(constraints) => Arc::clone(constraints),
            None => unreachable!("wait_for only resolves on a loaded slot"),
        }
    }

    fn slot(&self, kind: ManifestKind) -> &watch::Sender<Option<Arc<SchemaConstraints>>> {
        &self.slots[kind.index()]
    }
}

impl Default for SchemaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn from_schema_json_reads_primitives() {
        let doc = serde_json::json!({
            "definitions": {
                "PackageIdentifier": { "maxLength": 100, "pattern": "^x+$" },
                "Url": { "maxLength": 300 },
                "InstallerType": { "enum": ["msi", "exe"] },
            }
        });
        let constraints = SchemaConstraints::from_schema_json(&doc).unwrap();
        assert_eq!(constraints.package_identifier.max_length, 100);
        assert!(constraints.package_identifier.pattern.unwrap().is_match("xxx"));
        assert_eq!(constraints.url.max_length, 300);
        // The Url definition had no pattern, so the default survives.
        assert!(constraints.url.pattern.unwrap().is_match("https://example.com"));
        assert_eq!(constraints.installer_types, ["msi", "exe"]);
    }

    #[test]
    fn from_schema_json_rejects_bad_pattern() {
        let doc = serde_json::json!({
            "definitions": { "Url": { "pattern": "[" } }
        });
        assert!(SchemaConstraints::from_schema_json(&doc).is_err());
    }

    #[test]
    fn lowercase_definition_names_are_found() {
        let doc = serde_json::json!({
            "definitions": { "packageIdentifier": { "maxLength": 42 } }
        });
        let constraints = SchemaConstraints::from_schema_json(&doc).unwrap();
        assert_eq!(constraints.package_identifier.max_length, 42);
    }

    #[tokio::test]
    async fn wait_resolves_after_install() {
        let store = Arc::new(SchemaStore::new());

        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.wait(ManifestKind::Installer).await })
        };

        // Give the waiter a chance to park before installing.
        tokio::time::sleep(Duration::from_millis(10)).await;
        store.install(ManifestKind::Installer, SchemaConstraints::default());

        let constraints = waiter.await.unwrap();
        assert_eq!(
            constraints.package_identifier.max_length,
            DEFAULT_IDENTIFIER_MAX_LENGTH
        );
    }

    #[tokio::test]
    async fn wait_returns_immediately_when_loaded() {
        let store = SchemaStore::new();
        store.install(ManifestKind::Version, SchemaConstraints::default());
        let constraints = store.wait(ManifestKind::Version).await;
        assert!(constraints.installer_types.is_empty());
    }

    #[test]
    fn get_reports_unloaded_kinds() {
        let store = SchemaStore::new();
        assert!(store.get(ManifestKind::Locale).is_none());
    }
}
