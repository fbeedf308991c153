//! # Manifest
//!
//! The top-level AID document. Decoding is the typed half of the pipeline;
//! structural validation against the schema runs on the generic JSON value
//! in `aid-schema` and does not depend on this module.
//!
//! Re-encoding a decoded manifest yields semantically equivalent JSON:
//! field order and empty optional collections may differ, nothing else.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::AuthScheme;
use crate::error::ParseError;
use crate::implementation::{Implementation, ImplementationKind};
use crate::opaque;

/// A parsed AID manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Format version; only `"1"` exists.
    pub schema_version: SchemaVersion,
    /// Display name of the agent.
    pub name: String,
    /// Ways to reach the agent, in document order.
    #[serde(default)]
    pub implementations: Vec<Implementation>,
    /// Descriptive metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Reserved for a future signing mechanism. Never interpreted.
    #[serde(
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub signature: Option<Value>,
    /// Vendor members such as `x-*` keys, accepted in lenient mode and
    /// kept verbatim for re-encoding.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Manifest format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// `"1"`
    #[serde(rename = "1")]
    V1,
}

/// Descriptive block. Documentation and revocation references are opaque.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Version of the manifest content, e.g. a date stamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_version: Option<String>,
    /// Documentation reference. Opaque.
    #[serde(
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub documentation: Option<Value>,
    /// Revocation reference. Opaque.
    #[serde(
        rename = "revocationURL",
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub revocation_url: Option<Value>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

impl Manifest {
    /// Decode a manifest from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if the bytes are not well-formed JSON or a
    /// field holds a shape its type cannot accept.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a manifest from a JSON string.
    ///
    /// # Errors
    ///
    /// Same as [`Manifest::from_slice`].
    pub fn from_json_str(json: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Decode a manifest from an already-parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] (without position) on a type mismatch.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encode as compact JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if serialization fails, which only happens
    /// for non-string map keys and cannot occur for a decoded manifest.
    pub fn to_vec(&self) -> Result<Vec<u8>, ParseError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Encode as a generic JSON value.
    ///
    /// # Errors
    ///
    /// Same as [`Manifest::to_vec`].
    pub fn to_value(&self) -> Result<Value, ParseError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Look up an implementation by name. Returns the first match.
    pub fn implementation(&self, name: &str) -> Option<&Implementation> {
        self.implementations.iter().find(|imp| imp.name == name)
    }

    /// Remote implementations, in document order.
    pub fn remote_implementations(&self) -> impl Iterator<Item = &Implementation> {
        self.implementations
            .iter()
            .filter(|imp| imp.kind() == ImplementationKind::Remote)
    }

    /// Implementation names that appear more than once, each reported once,
    /// in order of their second occurrence.
    pub fn duplicate_implementation_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut duplicates = Vec::new();
        for imp in &self.implementations {
            let name = imp.name.as_str();
            if !seen.insert(name) && reported.insert(name) {
                duplicates.push(name);
            }
        }
        duplicates
    }

    /// True when every implementation name is distinct.
    pub fn has_unique_implementation_names(&self) -> bool {
        self.duplicate_implementation_names().is_empty()
    }

    /// Distinct authentication schemes in use, in scheme order.
    pub fn schemes(&self) -> BTreeSet<AuthScheme> {
        self.implementations
            .iter()
            .map(|imp| imp.authentication.scheme())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "schemaVersion": "1",
            "name": "Example Agent",
            "metadata": {
                "contentVersion": "2025-06-01",
                "documentation": {"href": "https://docs.example.com"}
            },
            "implementations": [
                {
                    "type": "remote",
                    "name": "prod",
                    "title": "Production",
                    "protocol": "mcp",
                    "uri": "https://api.example.com/mcp",
                    "authentication": {"scheme": "pat", "placement": {"in": "header", "key": "Authorization", "format": "Bearer {token}"}}
                },
                {
                    "type": "local",
                    "name": "local",
                    "title": "Local",
                    "protocol": "mcp",
                    "authentication": {"scheme": "none"},
                    "execution": {"command": "agent", "args": []},
                    "requiredConfig": [
                        {"key": "PORT", "description": "Port", "type": "integer", "defaultValue": 8080}
                    ]
                }
            ],
            "signature": null
        })
    }

    #[test]
    fn test_decode_sample() {
        let manifest = Manifest::from_value(sample()).unwrap();
        assert_eq!(manifest.schema_version, SchemaVersion::V1);
        assert_eq!(manifest.implementations.len(), 2);
        assert_eq!(manifest.signature, Some(Value::Null));
        assert_eq!(manifest.remote_implementations().count(), 1);
        assert!(manifest.implementation("local").is_some());
        assert!(manifest.implementation("missing").is_none());
    }

    #[test]
    fn test_round_trip_preserves_opaque_fields() {
        let raw = sample();
        let manifest = Manifest::from_value(raw.clone()).unwrap();
        let encoded = manifest.to_value().unwrap();
        assert_eq!(encoded, raw);
        let again = Manifest::from_slice(&manifest.to_vec().unwrap()).unwrap();
        assert_eq!(again, manifest);
    }

    #[test]
    fn test_absent_signature_stays_absent() {
        let mut raw = sample();
        raw.as_object_mut().unwrap().remove("signature");
        let manifest = Manifest::from_value(raw).unwrap();
        assert!(manifest.signature.is_none());
        assert!(manifest.to_value().unwrap().get("signature").is_none());
    }

    #[test]
    fn test_object_signature_round_trips() {
        let mut raw = sample();
        raw["signature"] = json!({"alg": "EdDSA", "sig": "abc", "kid": ["k1", 2]});
        let manifest = Manifest::from_value(raw.clone()).unwrap();
        assert_eq!(manifest.to_value().unwrap()["signature"], raw["signature"]);
    }

    #[test]
    fn test_schema_version_other_than_one_rejected() {
        let mut raw = sample();
        raw["schemaVersion"] = json!("2");
        assert!(Manifest::from_value(raw).is_err());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = Manifest::from_slice(b"{\"schemaVersion\": \"1\",").unwrap_err();
        assert!(err.is_eof());
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_duplicate_names() {
        let mut raw = sample();
        raw["implementations"][1]["name"] = json!("prod");
        let manifest = Manifest::from_value(raw).unwrap();
        assert_eq!(manifest.duplicate_implementation_names(), vec!["prod"]);
        assert!(!manifest.has_unique_implementation_names());
    }

    #[test]
    fn test_schemes_are_distinct_and_ordered() {
        let manifest = Manifest::from_value(sample()).unwrap();
        let schemes: Vec<_> = manifest.schemes().into_iter().collect();
        assert_eq!(schemes, vec![AuthScheme::NoAuth, AuthScheme::Pat]);
    }

    #[test]
    fn test_vendor_members_round_trip() {
        let mut raw = sample();
        raw["x-vendor"] = json!({"tier": "gold", "regions": ["eu", "us"]});
        raw["metadata"] = json!({"contentVersion": "2025-01-01", "x-owner": "team-a"});
        let manifest = Manifest::from_value(raw.clone()).unwrap();
        assert_eq!(manifest.extensions.len(), 1);
        assert_eq!(
            manifest.metadata.as_ref().unwrap().extensions["x-owner"],
            json!("team-a")
        );
        assert_eq!(manifest.to_value().unwrap(), raw);
    }
}
