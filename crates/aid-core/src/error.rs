//! # Error Types
//!
//! Errors raised by the data model and the advertisement record parser.
//! Both use `thiserror` for derive-based `Display` and `Error`.
//!
//! Schema violations live in `aid-schema`, next to the validator that
//! produces them.

use thiserror::Error;

/// The input was not well-formed JSON, or a field held a JSON shape the
/// decoder cannot reconcile with its type (for example an object where
/// `defaultValue` expects a string, number, or boolean).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    /// Decoder message, without position information.
    pub message: String,
    /// 1-based line of the failure, or 0 when unknown.
    pub line: usize,
    /// 1-based column of the failure, or 0 when unknown.
    pub column: usize,
}

impl ParseError {
    /// True when the input ended before a complete JSON value was read.
    pub fn is_eof(&self) -> bool {
        self.message.contains("EOF")
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        // serde_json appends " at line X column Y" to its Display output.
        let rendered = err.to_string();
        let message = match rendered.rfind(" at line ") {
            Some(idx) if err.line() > 0 => rendered[..idx].to_string(),
            _ => rendered,
        };
        Self {
            message,
            line: err.line(),
            column: err.column(),
        }
    }
}

/// An advertisement record failed one of its presence checks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxtFormatError {
    /// The `v=aid1` version marker is absent from the payload.
    #[error("TXT record missing version marker \"v=aid1\"")]
    MissingVersion,

    /// Neither a `uri` nor a `config` key is present.
    #[error("TXT record must contain a \"uri\" or \"config\" key")]
    MissingLocator,
}
