//! # aid-core: Agent Interface Discovery Data Model
//!
//! Typed representation of AID manifests and the DNS TXT advertisement
//! record that points at them. Every other crate in the workspace depends
//! on `aid-core`; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Discriminants are enums.** Implementation `type` selects a
//!    [`Target`] variant, authentication `scheme` selects an
//!    [`Authentication`] variant. Consumers `match` exhaustively instead of
//!    probing optional fields.
//!
//! 2. **`defaultValue` is a tagged union.** [`DefaultValue`] decodes by the
//!    JSON kind it receives and never coerces integers to floats.
//!
//! 3. **Opaque fields stay opaque.** `signature`, `revocationURL`,
//!    `documentation`, `tokenUrl` and `enrollmentEndpoint` are held as
//!    `serde_json::Value` and re-emitted unchanged, including an explicit
//!    `null`.
//!
//! 4. **Advertisement records are flat.** [`TxtRecord`] tolerates zone-file
//!    framing and extracts `key=value` pairs; [`validate_txt`] performs the
//!    marker and locator presence checks.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `aid-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Entities are immutable once decoded; nothing here mutates a manifest.

pub mod auth;
pub mod config;
pub mod error;
pub mod implementation;
pub mod manifest;
mod opaque;
pub mod record;

pub use auth::{
    AuthScheme, Authentication, CredentialAuth, Credential, OAuthAuth, OAuthDetails, Placement,
    PlacementLocation, SchemeCompanions, SimpleAuth,
};
pub use config::{ConfigType, DefaultValue, PathKind, RequiredConfig, RequiredPath};
pub use error::{ParseError, TxtFormatError};
pub use implementation::{
    Capabilities, Certificate, CertificateSource, Execution, Implementation, ImplementationKind,
    Package, PlatformExecution, PlatformOverrides, Status, Target,
};
pub use manifest::{Manifest, Metadata, SchemaVersion};
pub use record::{validate_txt, AdvertisementBuilder, TxtRecord, VERSION_MARKER};
