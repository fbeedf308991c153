//! Integration test: the conditional-required rules of the manifest schema,
//! exercised by toggling one field at a time on an otherwise valid document.

use aid_schema::{
    validate_manifest, validate_pair, SchemaValidator, ValidatorConfig, Violation,
};
use serde_json::{json, Value};

fn base() -> Value {
    json!({
        "schemaVersion": "1",
        "name": "Example",
        "implementations": [
            {
                "type": "remote",
                "name": "prod",
                "title": "Production",
                "protocol": "mcp",
                "uri": "https://api.example.com/mcp",
                "authentication": { "scheme": "none" }
            }
        ]
    })
}

fn violations(doc: &Value) -> Vec<Violation> {
    SchemaValidator::global().violations(doc, &ValidatorConfig::default())
}

fn is_valid(doc: &Value) -> bool {
    validate_manifest(&serde_json::to_vec(doc).unwrap()).is_ok()
}

#[test]
fn test_schema_version_must_be_one() {
    for version in [json!("2"), json!("1.0"), json!(1), json!(null), json!("")] {
        let mut doc = base();
        doc["schemaVersion"] = version.clone();
        assert!(!is_valid(&doc), "schemaVersion {version} accepted");
    }
    let mut doc = base();
    doc.as_object_mut().unwrap().remove("schemaVersion");
    assert!(!is_valid(&doc));
}

#[test]
fn test_remote_requires_uri() {
    let mut doc = base();
    assert!(is_valid(&doc));
    doc["implementations"][0].as_object_mut().unwrap().remove("uri");
    assert!(!is_valid(&doc));
}

#[test]
fn test_local_requires_execution_or_package() {
    let mut doc = base();
    let imp = doc["implementations"][0].as_object_mut().unwrap();
    imp.remove("uri");
    imp.insert("type".into(), json!("local"));
    assert!(!is_valid(&doc));

    let mut with_execution = doc.clone();
    with_execution["implementations"][0]["execution"] = json!({ "command": "agent", "args": ["--stdio"] });
    assert!(is_valid(&with_execution));

    let mut with_package = doc.clone();
    with_package["implementations"][0]["package"] = json!({ "manager": "npm", "identifier": "agent" });
    assert!(is_valid(&with_package));

    let mut with_bad_package = doc;
    with_bad_package["implementations"][0]["package"] = json!({ "manager": "npm" });
    assert!(!is_valid(&with_bad_package));
}

#[test]
fn test_default_value_must_match_type() {
    let mut doc = base();
    doc["implementations"][0]["requiredConfig"] = json!([
        { "key": "MODE", "description": "Mode", "type": "string", "defaultValue": true }
    ]);
    assert!(!is_valid(&doc));

    doc["implementations"][0]["requiredConfig"][0]["defaultValue"] = json!("fast");
    assert!(is_valid(&doc));

    doc["implementations"][0]["requiredConfig"][0]["type"] = json!("integer");
    assert!(!is_valid(&doc));
    doc["implementations"][0]["requiredConfig"][0]["defaultValue"] = json!(3);
    assert!(is_valid(&doc));
    doc["implementations"][0]["requiredConfig"][0]["defaultValue"] = json!(3.5);
    assert!(!is_valid(&doc));

    doc["implementations"][0]["requiredConfig"][0]["type"] = json!("boolean");
    doc["implementations"][0]["requiredConfig"][0]["defaultValue"] = json!(true);
    assert!(is_valid(&doc));
}

#[test]
fn test_scheme_selects_companions() {
    let cases = [
        (json!({ "scheme": "none" }), true),
        (json!({ "scheme": "pat" }), false),
        (json!({ "scheme": "pat", "placement": { "in": "header", "key": "Authorization" } }), true),
        (json!({ "scheme": "basic", "credentials": [ { "key": "USER", "description": "User" } ] }), true),
        (json!({ "scheme": "basic", "credentials": [] }), false),
        (json!({ "scheme": "custom", "placement": { "in": "cookie", "key": "sid" } }), false),
        (json!({ "scheme": "oauth2_code" }), false),
        (json!({ "scheme": "oauth2_code", "oauth": {} }), true),
        (json!({ "scheme": "none", "oauth": {} }), false),
    ];
    for (auth, expected) in cases {
        let mut doc = base();
        doc["implementations"][0]["authentication"] = auth.clone();
        assert_eq!(is_valid(&doc), expected, "authentication {auth}");
    }
}

#[test]
fn test_mtls_requires_certificate() {
    let mut doc = base();
    doc["implementations"][0]["authentication"] = json!({ "scheme": "mtls" });
    assert!(!is_valid(&doc));
    doc["implementations"][0]["certificate"] = json!({ "source": "file" });
    assert!(is_valid(&doc));
    doc["implementations"][0]["certificate"] = json!({ "source": "hsm" });
    assert!(!is_valid(&doc));
}

#[test]
fn test_independent_violations_all_reported() {
    let mut doc = base();
    let second = doc["implementations"][0].clone();
    doc["implementations"].as_array_mut().unwrap().push(second);
    doc["implementations"][1]["name"] = json!("dev");
    doc["implementations"][0].as_object_mut().unwrap().remove("title");
    doc["implementations"][1].as_object_mut().unwrap().remove("protocol");

    let found = violations(&doc);
    let paths: Vec<&str> = found.iter().map(|v| v.instance_path.as_str()).collect();
    assert_eq!(paths, vec!["/implementations/0", "/implementations/1"], "{found:?}");
    assert!(found[0].message.contains("title"));
    assert!(found[1].message.contains("protocol"));
}

#[test]
fn test_only_selected_branch_reported() {
    let mut doc = base();
    doc["implementations"][0]["authentication"] = json!({
        "scheme": "oauth2_service",
        "placement": { "in": "query", "key": "" }
    });
    let found = violations(&doc);
    // Missing `oauth` and the empty placement key; nothing from the other
    // scheme branches.
    let paths: Vec<&str> = found.iter().map(|v| v.instance_path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "/implementations/0/authentication",
            "/implementations/0/authentication/placement/key"
        ],
        "{found:?}"
    );
}

#[test]
fn test_concurrent_validation_shares_schema() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            std::thread::spawn(move || {
                let mut doc = base();
                if i % 2 == 1 {
                    doc["schemaVersion"] = json!("2");
                }
                is_valid(&doc)
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i % 2 == 0);
    }
}

#[test]
fn test_pair_does_not_cross_reference() {
    let bytes = serde_json::to_vec(&base()).unwrap();
    let txt = r#"_agent.example.com. 300 IN TXT "v=aid1;uri=https://other.example.net/agent;proto=a2a""#;
    assert!(validate_pair(&bytes, txt).is_ok());
}
