//! # Validation Run
//!
//! Decides what the positional arguments are, reads them, and runs the
//! matching check. Validation failures are an [`Outcome`]; only
//! operational problems (unreadable input, bad config, misuse of
//! `--advertise`) are errors.

use std::path::{Path, PathBuf};

use aid_core::{validate_txt, AdvertisementBuilder};
use aid_schema::{load_manifest_with, validate_pair_with, PairOptions, ValidationMode};
use anyhow::{bail, Context, Result};
use clap::Args;

use crate::config::load_options;

/// Arguments for a validation run.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Suppress the pass/fail status lines.
    #[arg(short, long)]
    pub quiet: bool,

    /// Accept unknown properties (vendor extensions).
    #[arg(long)]
    pub lenient: bool,

    /// For a pair, require the record's uri/proto to match an implementation.
    #[arg(long)]
    pub cross_check: bool,

    /// YAML file with validation options; flags take precedence.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the TXT record advertising the manifest for DOMAIN.
    #[arg(long, value_name = "DOMAIN")]
    pub advertise: Option<String>,

    /// Manifest (JSON) or advertisement record (`.txt`).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Advertisement record to check together with the manifest at PATH.
    #[arg(value_name = "SECOND")]
    pub second: Option<PathBuf>,
}

/// What the positional arguments name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// A manifest document.
    Manifest(PathBuf),
    /// An advertisement record.
    Txt(PathBuf),
    /// A manifest and its advertisement record.
    Pair {
        /// Manifest document.
        manifest: PathBuf,
        /// Advertisement record.
        txt: PathBuf,
    },
}

impl InputKind {
    /// Classify the positional arguments.
    pub fn from_args(args: &ValidateArgs) -> Self {
        match &args.second {
            Some(second) => Self::Pair {
                manifest: args.path.clone(),
                txt: second.clone(),
            },
            None if is_txt(&args.path) => Self::Txt(args.path.clone()),
            None => Self::Manifest(args.path.clone()),
        }
    }
}

fn is_txt(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
}

/// Result of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Everything checked passed.
    Passed {
        /// Rendered TXT record, when `--advertise` was given.
        advertisement: Option<String>,
    },
    /// A check failed; the rendered error.
    Failed(String),
}

impl Outcome {
    /// Process exit code: 0 passed, 1 failed.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Passed { .. } => 0,
            Self::Failed(_) => 1,
        }
    }
}

/// Run the validation described by `args`.
///
/// # Errors
///
/// Operational failures only: unreadable files, an invalid `--config`, or
/// `--advertise` without a manifest.
pub fn run_validate(args: &ValidateArgs) -> Result<Outcome> {
    let options = effective_options(args)?;
    let input = InputKind::from_args(args);
    tracing::info!(?input, mode = ?options.validator.mode, "validating");

    match input {
        InputKind::Manifest(path) => {
            let bytes = read_bytes(&path)?;
            match load_manifest_with(&bytes, &options.validator) {
                Ok(manifest) => Ok(Outcome::Passed {
                    advertisement: args
                        .advertise
                        .as_deref()
                        .map(|domain| AdvertisementBuilder::new(domain).build(&manifest)),
                }),
                Err(e) => Ok(Outcome::Failed(e.to_string())),
            }
        }
        InputKind::Txt(path) => {
            if args.advertise.is_some() {
                bail!("--advertise needs a manifest, not an advertisement record");
            }
            let text = read_text(&path)?;
            Ok(match validate_txt(&text) {
                Ok(record) => {
                    let duplicates = record.duplicate_keys();
                    if !duplicates.is_empty() {
                        tracing::warn!(?duplicates, "record repeats keys; first value wins");
                    }
                    Outcome::Passed { advertisement: None }
                }
                Err(e) => Outcome::Failed(e.to_string()),
            })
        }
        InputKind::Pair { manifest, txt } => {
            let bytes = read_bytes(&manifest)?;
            let text = read_text(&txt)?;
            if let Err(e) = validate_pair_with(&bytes, &text, &options) {
                return Ok(Outcome::Failed(e.to_string()));
            }
            let advertisement = match args.advertise.as_deref() {
                Some(domain) => match load_manifest_with(&bytes, &options.validator) {
                    Ok(decoded) => Some(AdvertisementBuilder::new(domain).build(&decoded)),
                    Err(e) => return Ok(Outcome::Failed(e.to_string())),
                },
                None => None,
            };
            Ok(Outcome::Passed { advertisement })
        }
    }
}

/// Options from `--config`, overridden by explicit flags.
fn effective_options(args: &ValidateArgs) -> Result<PairOptions> {
    let mut options = load_options(args.config.as_deref())?;
    if args.lenient {
        options.validator.mode = ValidationMode::Lenient;
    }
    if args.cross_check {
        options.cross_check = true;
    }
    Ok(options)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}
