//! # Implementations
//!
//! One reachable path to the agent. The `type` field is the discriminant:
//! `remote` implementations carry a `uri`, `local` ones carry an
//! `execution` recipe, a `package` reference, or both.
//!
//! The discriminated part lives in [`Target`], flattened into
//! [`Implementation`] so the wire shape stays a single JSON object.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::auth::Authentication;
use crate::config::{RequiredConfig, RequiredPath};
use crate::opaque;

/// One concrete way to reach the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    /// Machine-friendly identifier, unique within the manifest.
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Free-form protocol identifier, e.g. `mcp`.
    pub protocol: String,
    /// Remote endpoint or local launch recipe, selected by `type`.
    #[serde(flatten)]
    pub target: Target,
    /// How to authenticate.
    pub authentication: Authentication,
    /// MCP capability hints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    /// Lifecycle status; `None` means unspecified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Free-form labels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Configuration the user must supply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_config: Vec<RequiredConfig>,
    /// Filesystem paths the user must supply.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_paths: Vec<RequiredPath>,
    /// Client certificate source, used by `mtls`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<Certificate>,
    /// Revocation reference. Opaque.
    #[serde(
        rename = "revocationURL",
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub revocation_url: Option<Value>,
    /// Non-binding hint of the MCP version supported, e.g. `2025-06-18`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mcp_version: Option<String>,
    /// Members not modelled above, kept verbatim for re-encoding.
    #[serde(flatten, deserialize_with = "unclaimed_members")]
    pub extensions: Map<String, Value>,
}

impl Implementation {
    /// The `type` discriminant.
    pub fn kind(&self) -> ImplementationKind {
        match self.target {
            Target::Remote { .. } => ImplementationKind::Remote,
            Target::Local { .. } => ImplementationKind::Local,
        }
    }

    /// Endpoint of a remote implementation.
    pub fn uri(&self) -> Option<&str> {
        match &self.target {
            Target::Remote { uri } => Some(uri),
            Target::Local { .. } => None,
        }
    }

    /// True when the implementation is marked `deprecated`.
    pub fn is_deprecated(&self) -> bool {
        self.status == Some(Status::Deprecated)
    }
}

/// Collect the members of an implementation object that no field claims.
///
/// A flattened [`Target`] reads its keys without consuming them, so the
/// ones belonging to the selected variant are removed here. A `uri` on a
/// local implementation is not claimed and stays.
fn unclaimed_members<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut members = Map::deserialize(deserializer)?;
    let claimed: &[&str] = match members.get("type").and_then(Value::as_str) {
        Some("remote") => &["type", "uri"],
        Some("local") => &["type", "execution", "package"],
        _ => &["type"],
    };
    for key in claimed {
        members.remove(*key);
    }
    Ok(members)
}

/// The discriminated part of an implementation, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Target {
    /// Reached over the network.
    Remote {
        /// Endpoint URI.
        uri: String,
    },
    /// Launched on the user's machine.
    Local {
        /// Command line to run.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        execution: Option<Execution>,
        /// Package to install.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        package: Option<Package>,
    },
}

/// Implementation type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImplementationKind {
    /// `remote`
    Remote,
    /// `local`
    Local,
}

impl ImplementationKind {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ImplementationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// In service.
    Active,
    /// Still reachable, but consumers should migrate away.
    Deprecated,
}

/// Command line of a local implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Executable.
    pub command: String,
    /// Arguments, possibly with `${config.KEY}` placeholders.
    #[serde(default)]
    pub args: Vec<String>,
    /// Per-platform replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_overrides: Option<PlatformOverrides>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Per-platform overrides of an execution recipe.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformOverrides {
    /// Windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub windows: Option<PlatformExecution>,
    /// Linux.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linux: Option<PlatformExecution>,
    /// macOS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macos: Option<PlatformExecution>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// A platform-specific execution override. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformExecution {
    /// Replacement executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Replacement arguments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Content digest of a platform-specific package.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// A package reference of a local implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Package manager, e.g. `npm`, `pypi`, `docker`.
    pub manager: String,
    /// Package identifier within that manager.
    pub identifier: String,
    /// Optional content digest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// MCP capability hints. Each hint is an object whose content the schema
/// leaves open; it is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// Structured tool output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structured_output: Option<Map<String, Value>>,
    /// Resource links in tool results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_links: Option<Map<String, Value>>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Where the client certificate for `mtls` comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Certificate source.
    pub source: CertificateSource,
    /// Enrollment endpoint. Opaque.
    #[serde(
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub enrollment_endpoint: Option<Value>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Certificate source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateSource {
    /// Obtained by enrolling against an endpoint.
    Enrollment,
    /// Read from a local file.
    File,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthScheme;
    use serde_json::json;

    #[test]
    fn test_remote_implementation() {
        let raw = json!({
            "type": "remote",
            "name": "prod",
            "title": "Production",
            "protocol": "mcp",
            "uri": "https://api.example.com/mcp",
            "authentication": {"scheme": "none"},
            "status": "active"
        });
        let imp: Implementation = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(imp.kind(), ImplementationKind::Remote);
        assert_eq!(imp.uri(), Some("https://api.example.com/mcp"));
        assert_eq!(imp.authentication.scheme(), AuthScheme::NoAuth);
        assert!(!imp.is_deprecated());
        assert_eq!(serde_json::to_value(&imp).unwrap(), raw);
    }

    #[test]
    fn test_local_implementation_with_package_only() {
        let raw = json!({
            "type": "local",
            "name": "npx",
            "title": "Local via npx",
            "protocol": "mcp",
            "package": {"manager": "npm", "identifier": "@example/agent"},
            "authentication": {"scheme": "pat", "credentials": [{"key": "TOKEN", "description": "PAT"}]}
        });
        let imp: Implementation = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(imp.kind(), ImplementationKind::Local);
        assert!(imp.uri().is_none());
        match &imp.target {
            Target::Local { execution, package } => {
                assert!(execution.is_none());
                assert_eq!(package.as_ref().map(|p| p.manager.as_str()), Some("npm"));
            }
            other => panic!("expected local target, got {other:?}"),
        }
        assert_eq!(serde_json::to_value(&imp).unwrap(), raw);
    }

    #[test]
    fn test_local_execution_with_overrides() {
        let imp: Implementation = serde_json::from_value(json!({
            "type": "local",
            "name": "cli",
            "title": "CLI",
            "protocol": "mcp",
            "authentication": {"scheme": "none"},
            "execution": {
                "command": "agent",
                "args": ["serve", "--stdio"],
                "platformOverrides": {"windows": {"command": "agent.exe"}}
            }
        }))
        .unwrap();
        let Target::Local { execution: Some(execution), .. } = &imp.target else {
            panic!("expected execution");
        };
        assert_eq!(execution.args, vec!["serve", "--stdio"]);
        let windows = execution
            .platform_overrides
            .as_ref()
            .and_then(|o| o.windows.as_ref())
            .unwrap();
        assert_eq!(windows.command.as_deref(), Some("agent.exe"));
        assert!(windows.args.is_none());
    }

    #[test]
    fn test_unknown_type_rejected() {
        let result = serde_json::from_value::<Implementation>(json!({
            "type": "hybrid",
            "name": "x",
            "title": "x",
            "protocol": "mcp",
            "authentication": {"scheme": "none"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_certificate_and_revocation_preserved() {
        let raw = json!({
            "type": "remote",
            "name": "secure",
            "title": "Secure",
            "protocol": "mcp",
            "uri": "https://secure.example.com",
            "authentication": {"scheme": "mtls"},
            "certificate": {"source": "enrollment", "enrollmentEndpoint": {"href": "https://ca.example.com"}},
            "revocationURL": "https://example.com/revoked",
            "capabilities": {"structuredOutput": {}, "resourceLinks": {"max": 3}}
        });
        let imp: Implementation = serde_json::from_value(raw.clone()).unwrap();
        let cert = imp.certificate.as_ref().unwrap();
        assert_eq!(cert.source, CertificateSource::Enrollment);
        assert_eq!(serde_json::to_value(&imp).unwrap(), raw);
    }

    #[test]
    fn test_unknown_members_kept_without_target_keys() {
        let raw = json!({
            "type": "remote",
            "name": "prod",
            "title": "Production",
            "protocol": "mcp",
            "uri": "https://api.example.com/mcp",
            "authentication": {"scheme": "apikey", "x-rotation": "90d"},
            "x-region": "eu"
        });
        let imp: Implementation = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(imp.extensions.len(), 1);
        assert_eq!(imp.extensions["x-region"], json!("eu"));
        assert_eq!(serde_json::to_value(&imp).unwrap(), raw);
    }

    #[test]
    fn test_uri_on_local_kept_as_unknown_member() {
        let raw = json!({
            "type": "local",
            "name": "cli",
            "title": "CLI",
            "protocol": "mcp",
            "uri": "https://stray.example",
            "authentication": {"scheme": "none"},
            "execution": {"command": "agent", "args": [], "x-shell": "bash"}
        });
        let imp: Implementation = serde_json::from_value(raw.clone()).unwrap();
        assert!(imp.uri().is_none());
        assert_eq!(imp.extensions.len(), 1);
        assert!(imp.extensions.contains_key("uri"));
        assert_eq!(serde_json::to_value(&imp).unwrap(), raw);
    }
}
