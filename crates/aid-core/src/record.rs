//! # Advertisement Records
//!
//! Parsing and building the DNS TXT record that advertises an agent,
//! e.g.
//!
//! ```text
//! _agent.example.com. 3600 IN TXT "v=aid1;uri=https://api.example.com/mcp;proto=mcp"
//! ```
//!
//! The record payload is a flat, semicolon-separated list of `key=value`
//! pairs. Parsing tolerates zone-file framing (owner name, TTL, class,
//! type, parentheses and quoting) and the multi-string form where the
//! payload is split across several quoted segments. It is a presence
//! check, not a full grammar: there is no nesting and no escaping inside
//! values beyond what the quoting itself needs.

use std::collections::HashSet;

use crate::auth::AuthScheme;
use crate::error::TxtFormatError;
use crate::implementation::ImplementationKind;
use crate::manifest::Manifest;

/// Version tag every AID v1 record carries.
pub const VERSION_MARKER: &str = "v=aid1";

/// Default location of the manifest relative to the domain root.
pub const DEFAULT_MANIFEST_PATH: &str = "/.well-known/aid.json";

/// Default TTL of a built record, in seconds.
pub const DEFAULT_TTL: u32 = 3600;

/// A parsed advertisement record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecord {
    payload: String,
    pairs: Vec<(String, String)>,
}

impl TxtRecord {
    /// Extract the payload from `raw` and split it into pairs.
    ///
    /// Never fails; use [`validate_txt`] for the presence checks.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let payload = if trimmed.starts_with(VERSION_MARKER) {
            trimmed.to_string()
        } else {
            let segments = quoted_segments(trimmed);
            if segments.is_empty() {
                trimmed.to_string()
            } else {
                segments.concat()
            }
        };

        let pairs = payload
            .split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();

        Self { payload, pairs }
    }

    /// The extracted `key=value` text, without framing or quotes.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// All pairs in record order, duplicates included.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Value of the first occurrence of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Endpoint of the primary remote implementation.
    pub fn uri(&self) -> Option<&str> {
        self.get("uri")
    }

    /// Location of the full manifest.
    pub fn config(&self) -> Option<&str> {
        self.get("config")
    }

    /// Protocol of the advertised endpoint.
    pub fn proto(&self) -> Option<&str> {
        self.get("proto")
    }

    /// Authentication scheme of the advertised endpoint.
    pub fn auth(&self) -> Option<&str> {
        self.get("auth")
    }

    /// True when the payload carries [`VERSION_MARKER`].
    pub fn has_version_marker(&self) -> bool {
        self.payload.contains(VERSION_MARKER)
    }

    /// Keys that occur more than once, each reported once.
    pub fn duplicate_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        self.pairs
            .iter()
            .map(|(k, _)| k.as_str())
            .filter(|k| !seen.insert(*k) && reported.insert(*k))
            .collect()
    }
}

/// Check an advertisement record for the version marker and a locator key.
///
/// # Errors
///
/// [`TxtFormatError::MissingVersion`] if `v=aid1` is absent from the
/// payload, otherwise [`TxtFormatError::MissingLocator`] if neither `uri`
/// nor `config` is present.
pub fn validate_txt(raw: &str) -> Result<TxtRecord, TxtFormatError> {
    let record = TxtRecord::parse(raw);
    if !record.has_version_marker() {
        return Err(TxtFormatError::MissingVersion);
    }
    if record.uri().is_none() && record.config().is_none() {
        return Err(TxtFormatError::MissingLocator);
    }
    Ok(record)
}

/// Contents of every double-quoted segment, in order. Unterminated
/// segments are dropped. `\DDD` decimal escapes become the byte they name
/// and `\X` becomes `X` for any other character. Invalid UTF-8 produced by
/// byte escapes is replaced with U+FFFD.
fn quoted_segments(raw: &str) -> Vec<String> {
    let bytes = raw.as_bytes();
    let mut segments = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }
        i += 1;
        let mut segment = Vec::new();
        let mut closed = false;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => {
                    if let Some(byte) = decimal_escape(&bytes[i + 1..]) {
                        segment.push(byte);
                        i += 4;
                    } else if let Some(&escaped) = bytes.get(i + 1) {
                        segment.push(escaped);
                        i += 2;
                    } else {
                        i += 1;
                    }
                }
                b'"' => {
                    closed = true;
                    i += 1;
                    break;
                }
                byte => {
                    segment.push(byte);
                    i += 1;
                }
            }
        }
        if closed {
            segments.push(String::from_utf8_lossy(&segment).into_owned());
        }
    }
    segments
}

/// The byte named by a leading `DDD` triple, if it is at most 255.
fn decimal_escape(rest: &[u8]) -> Option<u8> {
    let digits = rest.get(..3)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    u8::try_from(value).ok()
}

/// Renders the zone-file line advertising a manifest.
///
/// The first remote implementation supplies `uri` and `proto` (and `auth`
/// unless its scheme is `none`). A `config` pointer to the hosted manifest
/// is added when the manifest cannot be summarised by that single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementBuilder {
    domain: String,
    env: Option<String>,
    manifest_path: String,
    ttl: u32,
}

impl AdvertisementBuilder {
    /// Builder for `domain`, e.g. `example.com`. A trailing dot is ignored.
    pub fn new(domain: impl Into<String>) -> Self {
        let domain: String = domain.into();
        Self {
            domain: domain.trim().trim_end_matches('.').to_string(),
            env: None,
            manifest_path: DEFAULT_MANIFEST_PATH.to_string(),
            ttl: DEFAULT_TTL,
        }
    }

    /// Add an `env=` pair, e.g. `staging`.
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Override where the manifest is hosted.
    pub fn manifest_path(mut self, path: impl Into<String>) -> Self {
        self.manifest_path = path.into();
        self
    }

    /// Override the record TTL.
    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Owner name of the record, `_agent.<domain>.`.
    pub fn record_name(&self) -> String {
        format!("_agent.{}.", self.domain)
    }

    /// The semicolon-separated payload for `manifest`.
    pub fn payload(&self, manifest: &Manifest) -> String {
        let mut parts = vec![VERSION_MARKER.to_string()];
        if let Some(env) = &self.env {
            parts.push(format!("env={env}"));
        }

        if let Some(primary) = manifest.remote_implementations().next() {
            if let Some(uri) = primary.uri() {
                parts.push(format!("uri={uri}"));
            }
            parts.push(format!("proto={}", primary.protocol));
            let scheme = primary.authentication.scheme();
            if scheme != AuthScheme::NoAuth {
                parts.push(format!("auth={scheme}"));
            }
        }

        if needs_manifest_pointer(manifest) && !self.domain.is_empty() {
            parts.push(format!(
                "config=https://{}{}",
                self.domain, self.manifest_path
            ));
        }

        parts.join(";")
    }

    /// The full zone-file line for `manifest`.
    pub fn build(&self, manifest: &Manifest) -> String {
        format!(
            "{} {} IN TXT \"{}\"",
            self.record_name(),
            self.ttl,
            self.payload(manifest)
        )
    }
}

fn needs_manifest_pointer(manifest: &Manifest) -> bool {
    match manifest.implementations.as_slice() {
        [] => false,
        [only] => {
            only.kind() == ImplementationKind::Local
                || !only.required_config.is_empty()
                || !only.required_paths.is_empty()
                || only.certificate.is_some()
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    const ZONE_LINE: &str =
        r#"_agent.example.com. 3600 IN TXT "v=aid1;uri=https://api.example.com;proto=mcp""#;

    #[test]
    fn test_zone_line_accepted() {
        let record = validate_txt(ZONE_LINE).unwrap();
        assert_eq!(record.payload(), "v=aid1;uri=https://api.example.com;proto=mcp");
        assert_eq!(record.uri(), Some("https://api.example.com"));
        assert_eq!(record.proto(), Some("mcp"));
        assert_eq!(record.get("v"), Some("aid1"));
    }

    #[test]
    fn test_missing_version_marker() {
        let err = validate_txt(r#"_agent.example.com. 3600 IN TXT "uri=https://api.example.com""#)
            .unwrap_err();
        assert_eq!(err, TxtFormatError::MissingVersion);
    }

    #[test]
    fn test_missing_locator() {
        let err = validate_txt(r#"_agent.example.com. 3600 IN TXT "v=aid1""#).unwrap_err();
        assert_eq!(err, TxtFormatError::MissingLocator);
    }

    #[test]
    fn test_config_key_is_a_locator() {
        let record =
            validate_txt("v=aid1;config=https://example.com/.well-known/aid.json").unwrap();
        assert!(record.uri().is_none());
        assert_eq!(record.config(), Some("https://example.com/.well-known/aid.json"));
    }

    #[test]
    fn test_bare_payload() {
        let record = validate_txt("  v=aid1;uri=https://example.com/api;proto=mcp  ").unwrap();
        assert_eq!(record.pairs().len(), 3);
    }

    #[test]
    fn test_multi_string_zone_line() {
        let zone = r#"_agent.example.com. 3600 IN TXT ( "v=aid1;uri=https://example.com/api" ";proto=mcp" )"#;
        let record = validate_txt(zone).unwrap();
        assert_eq!(record.payload(), "v=aid1;uri=https://example.com/api;proto=mcp");
        assert_eq!(record.proto(), Some("mcp"));
    }

    #[test]
    fn test_escaped_quote_inside_segment() {
        let record = TxtRecord::parse(r#"x IN TXT "v=aid1;uri=https://a.example;note=say \"hi\"""#);
        assert_eq!(record.get("note"), Some("say \"hi\""));
    }

    #[test]
    fn test_decimal_escapes_decoded() {
        let record = TxtRecord::parse(r#"x IN TXT "v=aid1\059uri=https://a.example\059note=a\061b""#);
        assert_eq!(record.uri(), Some("https://a.example"));
        assert_eq!(record.get("note"), Some("a=b"));
        assert!(validate_txt(r#""v=aid1\059config=https://a.example/aid.json""#).is_ok());
    }

    #[test]
    fn test_out_of_range_decimal_escape_is_literal() {
        let record = TxtRecord::parse(r#""v=aid1;uri=https://a.example;note=\256\05""#);
        assert_eq!(record.get("note"), Some("25605"));
    }

    #[test]
    fn test_lookalike_key_is_not_a_locator() {
        let err = validate_txt("v=aid1;xuri=https://example.com").unwrap_err();
        assert_eq!(err, TxtFormatError::MissingLocator);
    }

    #[test]
    fn test_duplicate_keys_reported_not_rejected() {
        let record = validate_txt("v=aid1;proto=mcp;uri=https://example.com/api;proto=a2a").unwrap();
        assert_eq!(record.duplicate_keys(), vec!["proto"]);
        assert_eq!(record.proto(), Some("mcp"));
    }

    fn manifest(implementations: serde_json::Value) -> Manifest {
        Manifest::from_value(json!({
            "schemaVersion": "1",
            "name": "Example",
            "implementations": implementations
        }))
        .unwrap()
    }

    #[test]
    fn test_build_simple_remote() {
        let m = manifest(json!([{
            "type": "remote", "name": "prod", "title": "Prod", "protocol": "mcp",
            "uri": "https://api.example.com/mcp", "authentication": {"scheme": "none"}
        }]));
        let line = AdvertisementBuilder::new("example.com.").build(&m);
        assert_eq!(
            line,
            r#"_agent.example.com. 3600 IN TXT "v=aid1;uri=https://api.example.com/mcp;proto=mcp""#
        );
        assert!(validate_txt(&line).is_ok());
    }

    #[test]
    fn test_build_complex_adds_config_and_auth() {
        let m = manifest(json!([
            {
                "type": "remote", "name": "prod", "title": "Prod", "protocol": "mcp",
                "uri": "https://api.example.com/mcp",
                "authentication": {"scheme": "pat", "placement": {"in": "header", "key": "Authorization"}}
            },
            {
                "type": "local", "name": "cli", "title": "CLI", "protocol": "mcp",
                "authentication": {"scheme": "none"},
                "execution": {"command": "agent", "args": []}
            }
        ]));
        let payload = AdvertisementBuilder::new("example.com").env("staging").payload(&m);
        assert_eq!(
            payload,
            "v=aid1;env=staging;uri=https://api.example.com/mcp;proto=mcp;auth=pat;config=https://example.com/.well-known/aid.json"
        );
    }

    #[test]
    fn test_build_local_only_points_at_manifest() {
        let m = manifest(json!([{
            "type": "local", "name": "cli", "title": "CLI", "protocol": "mcp",
            "authentication": {"scheme": "none"},
            "package": {"manager": "npm", "identifier": "agent"}
        }]));
        let line = AdvertisementBuilder::new("example.com").ttl(300).build(&m);
        assert!(line.starts_with("_agent.example.com. 300 IN TXT"));
        let record = validate_txt(&line).unwrap();
        assert!(record.uri().is_none());
        assert_eq!(record.config(), Some("https://example.com/.well-known/aid.json"));
    }

    proptest! {
        #[test]
        fn prop_parse_never_panics(raw in ".*") {
            let record = TxtRecord::parse(&raw);
            prop_assert!(record.pairs().iter().all(|(k, _)| !k.contains(';')));
        }

        #[test]
        fn prop_uri_round_trips(host in "[a-z]{1,12}", path in "[a-z0-9/]{0,12}") {
            let uri = format!("https://{host}.example/{path}");
            let raw = format!("_agent.{host}.example. 60 IN TXT \"v=aid1;uri={uri};proto=mcp\"");
            let record = validate_txt(&raw).unwrap();
            prop_assert_eq!(record.uri(), Some(uri.as_str()));
        }
    }
}
