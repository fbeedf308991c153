//! # Validation Errors
//!
//! Structured errors for schema compilation and manifest validation.
//! Every violation carries the JSON Pointer of the offending location so
//! callers can point users at the exact field.

use std::fmt;

use aid_core::ParseError;
use thiserror::Error;

/// The embedded (or supplied) schema document could not be compiled.
///
/// For the embedded schema this is a build-time defect, not an input
/// error; [`crate::SchemaValidator::global`] treats it as fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaCompileError {
    /// The schema text is not valid JSON.
    #[error("schema document is not valid JSON: {0}")]
    InvalidJson(String),

    /// A `discriminator` annotation could not be lowered.
    #[error("invalid discriminator at {pointer}: {reason}")]
    InvalidDiscriminator {
        /// JSON Pointer of the schema node carrying the annotation.
        pointer: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The `jsonschema` compiler rejected the (lowered) document.
    #[error("schema failed to compile: {0}")]
    Build(String),
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON Pointer path to the violating location in the instance.
    pub instance_path: String,
    /// JSON Pointer path within the schema that triggered the error.
    pub schema_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Ordered collection of validation violations. Never empty when carried
/// by [`SchemaValidationError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    pub(crate) fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// True when some violation points exactly at `instance_path`.
    pub fn contains_path(&self, instance_path: &str) -> bool {
        self.violations
            .iter()
            .any(|v| v.instance_path == instance_path)
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// The document did not conform to the AID manifest schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} schema violation(s):\n{violations}", violations.len())]
pub struct SchemaValidationError {
    /// Every violation found, ordered by instance path.
    pub violations: ValidationViolations,
}

/// Failure of manifest validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The bytes are not well-formed JSON.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The JSON violates the schema.
    #[error(transparent)]
    Schema(#[from] SchemaValidationError),

    /// The document passed the schema but the typed decoder rejected it.
    #[error("typed decode failed: {0}")]
    Decode(ParseError),
}

impl ManifestError {
    /// Schema violations, when this is a [`ManifestError::Schema`].
    pub fn violations(&self) -> Option<&ValidationViolations> {
        match self {
            Self::Schema(err) => Some(&err.violations),
            Self::Parse(_) | Self::Decode(_) => None,
        }
    }
}
