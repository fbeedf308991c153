//! # Manifest Validation
//!
//! Compiles the embedded AID schema once per process and validates
//! documents against it.
//!
//! ## Design
//!
//! - The schema text is compiled into the binary (`include_str!`), lowered
//!   by [`crate::discriminator`], and built for Draft 2020-12.
//! - A retriever that refuses every external URI is installed; the schema
//!   only uses local `#/$defs/...` references.
//! - Validation runs on the generic `serde_json::Value`, never on the typed
//!   model, so extra or mistyped fields are reported as violations rather
//!   than decode errors.
//! - Violations are sorted by instance path (array indices compared
//!   numerically), then by message.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use aid_core::{Manifest, ParseError};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Retrieve, Uri, ValidationError, Validator};
use serde_json::Value;

use crate::config::{ValidationMode, ValidatorConfig};
use crate::discriminator::lower_discriminators;
use crate::error::{
    ManifestError, SchemaCompileError, SchemaValidationError, ValidationViolations, Violation,
};

/// The AID manifest schema, version 1.
pub const EMBEDDED_SCHEMA: &str = include_str!("../schemas/aid.schema.json");

/// Schema path reported for duplicate implementation names.
const UNIQUE_NAMES_SCHEMA_PATH: &str = "/properties/implementations";

static GLOBAL: OnceLock<SchemaValidator> = OnceLock::new();

/// Refuses every `$ref` that leaves the document.
struct OfflineRetriever;

impl Retrieve for OfflineRetriever {
    fn retrieve(
        &self,
        uri: &Uri<&str>,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Err(format!("external schema reference not permitted: {}", uri.as_str()).into())
    }
}

/// A compiled schema ready to validate manifests.
pub struct SchemaValidator {
    document: Value,
    lowered: Value,
    validator: Validator,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("id", &self.schema_id())
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Compile the embedded schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompileError`] if the embedded text is malformed.
    /// That is a packaging defect; [`SchemaValidator::global`] panics on it.
    pub fn new() -> Result<Self, SchemaCompileError> {
        let document: Value = serde_json::from_str(EMBEDDED_SCHEMA)
            .map_err(|e| SchemaCompileError::InvalidJson(e.to_string()))?;
        Self::try_new(document)
    }

    /// Compile an arbitrary schema document (with discriminator lowering).
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompileError::InvalidDiscriminator`] for a malformed
    /// annotation and [`SchemaCompileError::Build`] if `jsonschema` rejects
    /// the lowered document.
    pub fn try_new(document: Value) -> Result<Self, SchemaCompileError> {
        let lowered = lower_discriminators(&document)?;

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        opts.with_retriever(OfflineRetriever);
        let validator = opts
            .build(&lowered)
            .map_err(|e| SchemaCompileError::Build(e.to_string()))?;

        let id = document
            .get("$id")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("(none)");
        tracing::debug!(id, "manifest schema compiled");
        Ok(Self {
            document,
            lowered,
            validator,
        })
    }

    /// The process-wide validator for the embedded schema, compiled on
    /// first use and shared by every caller and thread.
    ///
    /// # Panics
    ///
    /// If the embedded schema fails to compile. Validation cannot proceed
    /// without it, so this is treated as a startup-fatal defect.
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| match Self::new() {
            Ok(validator) => validator,
            Err(e) => panic!("embedded AID schema is unusable: {e}"),
        })
    }

    /// The schema document as written.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// The schema document after discriminator lowering.
    pub fn lowered_document(&self) -> &Value {
        &self.lowered
    }

    /// The schema's `$id`, if declared.
    pub fn schema_id(&self) -> Option<&str> {
        self.document.get("$id").and_then(Value::as_str)
    }

    /// Every violation of `instance`, sorted. Empty when valid.
    pub fn violations(&self, instance: &Value, config: &ValidatorConfig) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .filter(|e| config.mode == ValidationMode::Strict || !is_unknown_property(e))
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                schema_path: e.schema_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if config.unique_names {
            violations.extend(duplicate_name_violations(instance));
        }

        violations.sort_by(|a, b| {
            compare_pointers(&a.instance_path, &b.instance_path)
                .then_with(|| a.message.cmp(&b.message))
        });
        violations
    }

    /// Validate a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError`] listing every violation.
    pub fn validate_value(
        &self,
        instance: &Value,
        config: &ValidatorConfig,
    ) -> Result<(), SchemaValidationError> {
        let violations = self.violations(instance, config);
        tracing::debug!(
            violations = violations.len(),
            mode = ?config.mode,
            "manifest document validated"
        );
        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError {
                violations: ValidationViolations::new(violations),
            })
        }
    }
}

fn is_unknown_property(error: &ValidationError<'_>) -> bool {
    matches!(
        error.kind,
        ValidationErrorKind::AdditionalProperties { .. }
            | ValidationErrorKind::UnevaluatedProperties { .. }
    )
}

/// One violation per implementation whose `name` already appeared earlier.
fn duplicate_name_violations(instance: &Value) -> Vec<Violation> {
    let Some(items) = instance.get("implementations").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let name = item.get("name")?.as_str()?;
            if seen.insert(name) {
                return None;
            }
            Some(Violation {
                instance_path: format!("/implementations/{i}/name"),
                schema_path: UNIQUE_NAMES_SCHEMA_PATH.to_string(),
                message: format!("implementation name \"{name}\" is not unique"),
            })
        })
        .collect()
}

/// Order JSON Pointers segment by segment, numerically where both
/// segments are array indices.
fn compare_pointers(a: &str, b: &str) -> Ordering {
    let mut left = a.split('/');
    let mut right = b.split('/');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<usize>(), y.parse::<usize>()) {
                    (Ok(i), Ok(j)) => i.cmp(&j),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Parse raw bytes into a generic JSON value.
///
/// # Errors
///
/// Returns [`ParseError`] for malformed JSON, including empty input.
pub fn parse_document(bytes: &[u8]) -> Result<Value, ParseError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Validate raw manifest bytes with the default (strict) configuration.
///
/// # Errors
///
/// [`ManifestError::Parse`] for malformed JSON, [`ManifestError::Schema`]
/// for schema violations.
pub fn validate_manifest(bytes: &[u8]) -> Result<(), ManifestError> {
    validate_manifest_with(bytes, &ValidatorConfig::default())
}

/// Validate raw manifest bytes with an explicit configuration.
///
/// # Errors
///
/// Same as [`validate_manifest`].
pub fn validate_manifest_with(bytes: &[u8], config: &ValidatorConfig) -> Result<(), ManifestError> {
    let value = parse_document(bytes)?;
    SchemaValidator::global().validate_value(&value, config)?;
    Ok(())
}

/// Validate and decode a manifest with the default configuration.
///
/// # Errors
///
/// Same as [`validate_manifest`], plus [`ManifestError::Decode`] if a
/// structurally valid document still fails typed decoding.
pub fn load_manifest(bytes: &[u8]) -> Result<Manifest, ManifestError> {
    load_manifest_with(bytes, &ValidatorConfig::default())
}

/// Validate and decode a manifest with an explicit configuration.
///
/// # Errors
///
/// Same as [`load_manifest`].
pub fn load_manifest_with(bytes: &[u8], config: &ValidatorConfig) -> Result<Manifest, ManifestError> {
    let value = parse_document(bytes)?;
    SchemaValidator::global().validate_value(&value, config)?;
    Manifest::from_value(value).map_err(ManifestError::Decode)
}
