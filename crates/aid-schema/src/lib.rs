//! # aid-schema: Manifest Schema Validation
//!
//! Validates AID manifests against the embedded JSON Schema (Draft
//! 2020-12) and checks manifest/advertisement-record pairs.
//!
//! ## Validation (`validate`)
//!
//! The schema is compiled once per process and shared. Entry points:
//!
//! - [`validate_manifest`] / [`validate_manifest_with`]: bytes in,
//!   structured violations out.
//! - [`load_manifest`]: validate, then decode into [`aid_core::Manifest`].
//! - [`SchemaValidator::validate_value`]: for callers that already hold a
//!   `serde_json::Value`.
//!
//! ## Branch Selection (`discriminator`)
//!
//! Implementation `type` and authentication `scheme` pick exactly one
//! schema branch. The annotated `oneOf` nodes are lowered to `if`/`then`
//! clauses before compilation so only the selected branch reports errors.
//!
//! ## Pairs (`pair`)
//!
//! [`validate_pair`] runs the manifest and TXT checks together, manifest
//! error first. [`validate_pair_with`] optionally cross-checks the record's
//! `uri` and `proto` against the manifest.
//!
//! ## Crate Policy
//!
//! - Depends only on `aid-core` internally.
//! - No network access: external `$ref`s are refused at compile time.
//! - Schema validation is a trust boundary: invalid documents are rejected
//!   with every violation and its JSON Pointer path.

pub mod config;
pub mod discriminator;
pub mod error;
pub mod pair;
pub mod validate;

pub use config::{PairOptions, ValidationMode, ValidatorConfig};
pub use error::{
    ManifestError, SchemaCompileError, SchemaValidationError, ValidationViolations, Violation,
};
pub use pair::{cross_check, validate_pair, validate_pair_with, CrossCheckError, PairError};
pub use validate::{
    load_manifest, load_manifest_with, parse_document, validate_manifest, validate_manifest_with,
    SchemaValidator,
};
