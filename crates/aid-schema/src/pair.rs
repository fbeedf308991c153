//! # Pair Consistency
//!
//! Checks a manifest and its advertisement record together. Both halves
//! are validated independently; when both fail, the manifest error is the
//! one reported. The records and the manifest are not required to agree
//! on anything unless the cross-check is enabled through [`PairOptions`].

use aid_core::{validate_txt, Manifest, TxtFormatError, TxtRecord};
use thiserror::Error;

use crate::config::PairOptions;
use crate::error::ManifestError;
use crate::validate::{parse_document, SchemaValidator};

/// The record and manifest disagree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CrossCheckError {
    /// No remote implementation is reachable at the advertised `uri`.
    #[error("advertised uri {uri} does not match any remote implementation")]
    UriNotFound {
        /// The record's `uri` value.
        uri: String,
    },

    /// The implementation at `uri` speaks a different protocol.
    #[error(
        "advertised proto {advertised} does not match protocol {declared} of implementation \"{implementation}\""
    )]
    ProtocolMismatch {
        /// Name of the implementation found at the record's `uri`.
        implementation: String,
        /// The record's `proto` value.
        advertised: String,
        /// The implementation's `protocol`.
        declared: String,
    },
}

/// Failure of pair validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairError {
    /// The manifest half failed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The record half failed.
    #[error(transparent)]
    Txt(#[from] TxtFormatError),

    /// Both halves passed but disagree.
    #[error(transparent)]
    CrossCheck(#[from] CrossCheckError),
}

/// Validate a manifest and its advertisement record, manifest first.
///
/// # Errors
///
/// The manifest's [`ManifestError`] if it fails, otherwise the record's
/// [`TxtFormatError`].
pub fn validate_pair(manifest: &[u8], txt: &str) -> Result<(), PairError> {
    validate_pair_with(manifest, txt, &PairOptions::default()).map(|_| ())
}

/// Validate a pair with explicit options. Returns the parsed record.
///
/// # Errors
///
/// As [`validate_pair`], plus [`PairError::CrossCheck`] when
/// `cross_check` is enabled and the two halves disagree.
pub fn validate_pair_with(
    manifest: &[u8],
    txt: &str,
    options: &PairOptions,
) -> Result<TxtRecord, PairError> {
    let manifest_outcome = check_manifest(manifest, options);
    let txt_outcome = validate_txt(txt);
    tracing::debug!(
        manifest_ok = manifest_outcome.is_ok(),
        txt_ok = txt_outcome.is_ok(),
        "pair checked"
    );

    let manifest = manifest_outcome?;
    let record = txt_outcome?;

    if let Some(manifest) = manifest {
        cross_check(&manifest, &record)?;
    }
    Ok(record)
}

/// Schema-validate the manifest; decode it only when a cross-check needs
/// the typed model.
fn check_manifest(bytes: &[u8], options: &PairOptions) -> Result<Option<Manifest>, ManifestError> {
    let value = parse_document(bytes)?;
    SchemaValidator::global().validate_value(&value, &options.validator)?;
    if !options.cross_check {
        return Ok(None);
    }
    Manifest::from_value(value)
        .map(Some)
        .map_err(ManifestError::Decode)
}

/// Require the record's `uri` (and `proto`, if given) to match a remote
/// implementation of `manifest`.
///
/// # Errors
///
/// [`CrossCheckError`] describing the first disagreement.
pub fn cross_check(manifest: &Manifest, record: &TxtRecord) -> Result<(), CrossCheckError> {
    let Some(uri) = record.uri() else {
        tracing::warn!("record has no uri; cross-check skipped");
        return Ok(());
    };

    let implementation = manifest
        .remote_implementations()
        .find(|imp| imp.uri() == Some(uri))
        .ok_or_else(|| CrossCheckError::UriNotFound {
            uri: uri.to_string(),
        })?;

    if let Some(proto) = record.proto() {
        if proto != implementation.protocol {
            return Err(CrossCheckError::ProtocolMismatch {
                implementation: implementation.name.clone(),
                advertised: proto.to_string(),
                declared: implementation.protocol.clone(),
            });
        }
    }
    Ok(())
}
