//! Serde helpers for schema-unconstrained fields.
//!
//! `Option<Value>` normally folds an explicit JSON `null` into `None`, which
//! would drop `"signature": null` on re-encode. Fields using [`present`] keep
//! `None` for "absent" and `Some(Value::Null)` for "present and null".

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Deserialize a present field verbatim. Pair with `#[serde(default)]`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
