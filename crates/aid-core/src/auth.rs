//! # Authentication
//!
//! The `authentication` block of an implementation. The `scheme` field is
//! the discriminant: it selects one [`Authentication`] variant, and each
//! variant carries only the companion fields that scheme can use.
//!
//! | Scheme | Companion requirement |
//! |--------|-----------------------|
//! | `none` | nothing |
//! | `apikey`, `basic`, `pat`, `custom` | `placement` and/or `credentials` |
//! | `mtls` | a `certificate` on the implementation |
//! | `oauth2_code`, `oauth2_device`, `oauth2_service` | an `oauth` block |
//!
//! Decoding is deliberately lenient about missing companions so that a
//! structurally incomplete document still yields a typed value; the schema
//! validator is what rejects it.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::opaque;

/// Authentication requirement of one implementation, tagged by `scheme`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "scheme")]
pub enum Authentication {
    /// No credential is needed.
    #[serde(rename = "none")]
    NoAuth(SimpleAuth),
    /// Static API key.
    #[serde(rename = "apikey")]
    ApiKey(CredentialAuth),
    /// HTTP basic authentication.
    #[serde(rename = "basic")]
    Basic(CredentialAuth),
    /// Personal access token.
    #[serde(rename = "pat")]
    Pat(CredentialAuth),
    /// Vendor-specific scheme described in prose.
    #[serde(rename = "custom")]
    Custom(CredentialAuth),
    /// Mutual TLS; the client certificate is described by the
    /// implementation's `certificate` block.
    #[serde(rename = "mtls")]
    Mtls(SimpleAuth),
    /// OAuth 2.0 authorization code flow.
    #[serde(rename = "oauth2_code")]
    OAuth2Code(OAuthAuth),
    /// OAuth 2.0 device authorization flow.
    #[serde(rename = "oauth2_device")]
    OAuth2Device(OAuthAuth),
    /// OAuth 2.0 client credentials (service-to-service) flow.
    #[serde(rename = "oauth2_service")]
    OAuth2Service(OAuthAuth),
}

impl Authentication {
    /// The discriminant of this block.
    pub fn scheme(&self) -> AuthScheme {
        match self {
            Self::NoAuth(_) => AuthScheme::NoAuth,
            Self::ApiKey(_) => AuthScheme::ApiKey,
            Self::Basic(_) => AuthScheme::Basic,
            Self::Pat(_) => AuthScheme::Pat,
            Self::Custom(_) => AuthScheme::Custom,
            Self::Mtls(_) => AuthScheme::Mtls,
            Self::OAuth2Code(_) => AuthScheme::OAuth2Code,
            Self::OAuth2Device(_) => AuthScheme::OAuth2Device,
            Self::OAuth2Service(_) => AuthScheme::OAuth2Service,
        }
    }

    /// Human-readable description, whatever the scheme.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::NoAuth(a) | Self::Mtls(a) => a.description.as_deref(),
            Self::ApiKey(a) | Self::Basic(a) | Self::Pat(a) | Self::Custom(a) => {
                a.description.as_deref()
            }
            Self::OAuth2Code(a) | Self::OAuth2Device(a) | Self::OAuth2Service(a) => {
                a.description.as_deref()
            }
        }
    }

    /// Where the credential travels, if the scheme declares it.
    pub fn placement(&self) -> Option<&Placement> {
        match self {
            Self::ApiKey(a) | Self::Basic(a) | Self::Pat(a) | Self::Custom(a) => {
                a.placement.as_ref()
            }
            Self::OAuth2Code(a) | Self::OAuth2Device(a) | Self::OAuth2Service(a) => {
                a.placement.as_ref()
            }
            Self::NoAuth(_) | Self::Mtls(_) => None,
        }
    }

    /// Named secret slots the user must fill in.
    pub fn credentials(&self) -> &[Credential] {
        match self {
            Self::ApiKey(a) | Self::Basic(a) | Self::Pat(a) | Self::Custom(a) => &a.credentials,
            Self::OAuth2Code(a) | Self::OAuth2Device(a) | Self::OAuth2Service(a) => {
                &a.credentials
            }
            Self::NoAuth(_) | Self::Mtls(_) => &[],
        }
    }

    /// The OAuth details block for the `oauth2_*` schemes.
    pub fn oauth(&self) -> Option<&OAuthDetails> {
        match self {
            Self::OAuth2Code(a) | Self::OAuth2Device(a) | Self::OAuth2Service(a) => {
                a.oauth.as_ref()
            }
            _ => None,
        }
    }
}

/// Companion fields for `none` and `mtls`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAuth {
    /// Optional prose for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Companion fields for `apikey`, `basic`, `pat` and `custom`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialAuth {
    /// Optional prose for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the credential is carried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    /// Named secret slots.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<Credential>,
    /// Where a token can be obtained. Opaque.
    #[serde(
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_url: Option<Value>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Companion fields for the `oauth2_*` schemes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthAuth {
    /// Optional prose for the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Client registration details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthDetails>,
    /// Token endpoint. Opaque; may be absent pending dynamic registration.
    #[serde(
        default,
        deserialize_with = "opaque::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_url: Option<Value>,
    /// Where the access token is carried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement: Option<Placement>,
    /// Named secret slots (for example a client secret).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub credentials: Vec<Credential>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// OAuth client registration details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthDetails {
    /// Pre-registered client identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Requested scopes. `None` means unspecified, not "no scopes".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Signals support for RFC 7591 Dynamic Client Registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dynamic_client_registration: Option<bool>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Where a credential is carried on each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Carrier.
    #[serde(rename = "in")]
    pub location: PlacementLocation,
    /// Header name, query parameter or CLI flag.
    pub key: String,
    /// Value template, e.g. `Bearer {token}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Carrier of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementLocation {
    /// Command-line argument of a local implementation.
    CliArg,
    /// HTTP header.
    Header,
    /// URL query parameter.
    Query,
}

/// A named secret slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Slot name.
    pub key: String,
    /// What to put in it.
    pub description: String,
    /// Unknown members, kept verbatim.
    #[serde(flatten)]
    pub extensions: Map<String, Value>,
}

/// Authentication scheme identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthScheme {
    /// `none`
    #[serde(rename = "none")]
    NoAuth,
    /// `apikey`
    #[serde(rename = "apikey")]
    ApiKey,
    /// `basic`
    #[serde(rename = "basic")]
    Basic,
    /// `pat`
    #[serde(rename = "pat")]
    Pat,
    /// `custom`
    #[serde(rename = "custom")]
    Custom,
    /// `mtls`
    #[serde(rename = "mtls")]
    Mtls,
    /// `oauth2_code`
    #[serde(rename = "oauth2_code")]
    OAuth2Code,
    /// `oauth2_device`
    #[serde(rename = "oauth2_device")]
    OAuth2Device,
    /// `oauth2_service`
    #[serde(rename = "oauth2_service")]
    OAuth2Service,
}

/// Which companion fields a scheme requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeCompanions {
    /// No companion fields.
    Nothing,
    /// `placement`, `credentials`, or both.
    PlacementOrCredentials,
    /// A `certificate` block on the enclosing implementation.
    Certificate,
    /// An `oauth` block.
    OAuth,
}

impl AuthScheme {
    /// Every scheme, in schema order.
    pub fn all() -> &'static [AuthScheme] {
        &[
            Self::NoAuth,
            Self::ApiKey,
            Self::Basic,
            Self::Pat,
            Self::Custom,
            Self::Mtls,
            Self::OAuth2Code,
            Self::OAuth2Device,
            Self::OAuth2Service,
        ]
    }

    /// Wire name of the scheme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoAuth => "none",
            Self::ApiKey => "apikey",
            Self::Basic => "basic",
            Self::Pat => "pat",
            Self::Custom => "custom",
            Self::Mtls => "mtls",
            Self::OAuth2Code => "oauth2_code",
            Self::OAuth2Device => "oauth2_device",
            Self::OAuth2Service => "oauth2_service",
        }
    }

    /// Companion requirement selected by this scheme.
    pub fn companions(&self) -> SchemeCompanions {
        match self {
            Self::NoAuth => SchemeCompanions::Nothing,
            Self::ApiKey | Self::Basic | Self::Pat | Self::Custom => {
                SchemeCompanions::PlacementOrCredentials
            }
            Self::Mtls => SchemeCompanions::Certificate,
            Self::OAuth2Code | Self::OAuth2Device | Self::OAuth2Service => SchemeCompanions::OAuth,
        }
    }

    /// True for the three OAuth 2.0 flows.
    pub fn is_oauth(&self) -> bool {
        self.companions() == SchemeCompanions::OAuth
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
