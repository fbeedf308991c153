//! # Required Configuration and Paths
//!
//! Configuration slots and filesystem paths an implementation needs from
//! the user before it can run.
//!
//! `defaultValue` is the one union-typed field in the manifest. It decodes
//! by inspecting the JSON kind (string, number, boolean) and fails on
//! `null`, objects and arrays. Numbers are held as `serde_json::Number`, so
//! `3` stays an integer and `3.5` stays a float across a round-trip.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// A named configuration slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredConfig {
    /// Slot name, e.g. an environment variable.
    pub key: String,
    /// What the slot is for.
    pub description: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub kind: ConfigType,
    /// Whether the value must be treated as a secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<bool>,
    /// Value used when the user supplies none.
    #[serde(
        default,
        deserialize_with = "deserialize_default_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<DefaultValue>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl RequiredConfig {
    /// True when there is no default, or the default's kind matches `type`.
    pub fn default_matches_type(&self) -> bool {
        self.default_value
            .as_ref()
            .map_or(true, |value| value.matches(self.kind))
    }

    /// True when the slot is flagged secret.
    pub fn is_secret(&self) -> bool {
        self.secret.unwrap_or(false)
    }
}

/// Declared type of a configuration slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigType {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// `true` / `false`.
    Boolean,
}

impl ConfigType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// The populated variant of a `defaultValue`.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A JSON string.
    String(String),
    /// A JSON number, integer or float, exactly as decoded.
    Number(Number),
    /// A JSON boolean.
    Boolean(bool),
}

impl DefaultValue {
    /// True when this value is acceptable for a slot of type `kind`.
    ///
    /// Integer slots accept any number without a fractional part, which is
    /// how JSON Schema's `integer` type treats `4.0`.
    pub fn matches(&self, kind: ConfigType) -> bool {
        match (self, kind) {
            (Self::String(_), ConfigType::String) => true,
            (Self::Boolean(_), ConfigType::Boolean) => true,
            (Self::Number(n), ConfigType::Integer) => is_integral(n),
            _ => false,
        }
    }

    /// Name of the populated variant's JSON kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean(_) => "boolean",
        }
    }
}

fn is_integral(n: &Number) -> bool {
    n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.is_finite() && f.fract() == 0.0)
}

impl Serialize for DefaultValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::String(s) => serializer.serialize_str(s),
            Self::Number(n) => n.serialize(serializer),
            Self::Boolean(b) => serializer.serialize_bool(*b),
        }
    }
}

impl<'de> Deserialize<'de> for DefaultValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DefaultValueVisitor)
    }
}

struct DefaultValueVisitor;

impl<'de> Visitor<'de> for DefaultValueVisitor {
    type Value = DefaultValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(DefaultValue::Boolean(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(DefaultValue::Number(v.into()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(DefaultValue::Number(v.into()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Number::from_f64(v)
            .map(DefaultValue::Number)
            .ok_or_else(|| E::custom(format!("non-finite number {v} in defaultValue")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(DefaultValue::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(DefaultValue::String(v))
    }
}

// A present `null` must fail rather than collapse into `None`.
fn deserialize_default_value<'de, D>(deserializer: D) -> Result<Option<DefaultValue>, D::Error>
where
    D: Deserializer<'de>,
{
    DefaultValue::deserialize(deserializer).map(Some)
}

/// A filesystem path the implementation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredPath {
    /// Slot name.
    pub key: String,
    /// What the path is for.
    pub description: String,
    /// File or directory; `None` means unspecified.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PathKind>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Kind of filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}
