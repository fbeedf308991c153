//! # Discriminator Lowering
//!
//! A plain `oneOf` reports a failure as "not valid under any of the
//! schemas", and the alternative of reporting every branch's errors
//! explodes combinatorially. The AID schema instead annotates its
//! alternative-branch nodes with a discriminator:
//!
//! ```json
//! { "discriminator": { "propertyName": "scheme" },
//!   "oneOf": [ { "$ref": "#/$defs/noneAuthentication" }, ... ] }
//! ```
//!
//! Before compilation every such node is rewritten so that the
//! discriminant is matched first and only the selected branch is
//! evaluated:
//!
//! ```json
//! { "allOf": [
//!     { "required": ["scheme"] },
//!     { "properties": { "scheme": { "enum": ["none", "apikey", ...] } } },
//!     { "if": { "required": ["scheme"], "properties": { "scheme": { "enum": ["none"] } } },
//!       "then": { "$ref": "#/$defs/noneAuthentication" } },
//!     ...
//! ] }
//! ```
//!
//! Branch values come from `properties.<prop>.const` or `.enum` of each
//! branch, following local `#/...` references. Any existing `allOf` on the
//! node is kept after the generated clauses.

use serde_json::{json, Map, Value};

use crate::error::SchemaCompileError;

/// Annotation keyword marking a discriminated `oneOf`.
pub const DISCRIMINATOR: &str = "discriminator";

/// Longest `$ref` chain followed when resolving a branch.
const MAX_REF_DEPTH: usize = 16;

/// Return a copy of `document` with every discriminated `oneOf` lowered.
///
/// # Errors
///
/// [`SchemaCompileError::InvalidDiscriminator`] when an annotation has no
/// `propertyName`, is not paired with a `oneOf` array, or a branch has no
/// (or a repeated) discriminant value.
pub fn lower_discriminators(document: &Value) -> Result<Value, SchemaCompileError> {
    let mut lowered = document.clone();
    lower_node(document, &mut lowered, "")?;
    Ok(lowered)
}

fn lower_node(root: &Value, node: &mut Value, pointer: &str) -> Result<(), SchemaCompileError> {
    match node {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                lower_node(root, child, &format!("{pointer}/{}", escape_segment(key)))?;
            }
            let annotated = map.get(DISCRIMINATOR).is_some_and(Value::is_object);
            if annotated {
                rewrite(root, map, pointer)?;
            }
        }
        Value::Array(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                lower_node(root, item, &format!("{pointer}/{i}"))?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn rewrite(
    root: &Value,
    map: &mut Map<String, Value>,
    pointer: &str,
) -> Result<(), SchemaCompileError> {
    let invalid = |reason: String| SchemaCompileError::InvalidDiscriminator {
        pointer: if pointer.is_empty() { "/".to_string() } else { pointer.to_string() },
        reason,
    };

    let property = map
        .get(DISCRIMINATOR)
        .and_then(|d| d.get("propertyName"))
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing string propertyName".to_string()))?
        .to_string();

    let branches = match map.remove("oneOf") {
        Some(Value::Array(branches)) if !branches.is_empty() => branches,
        _ => return Err(invalid("discriminator requires a non-empty oneOf".to_string())),
    };
    map.remove(DISCRIMINATOR);

    let mut all_values: Vec<Value> = Vec::new();
    let mut clauses = Vec::with_capacity(branches.len());
    for (i, branch) in branches.into_iter().enumerate() {
        let resolved = resolve(root, &branch)
            .ok_or_else(|| invalid(format!("branch {i} has an unresolvable $ref")))?;
        let values = discriminant_values(resolved, &property).ok_or_else(|| {
            invalid(format!("branch {i} declares no const or enum for \"{property}\""))
        })?;
        if let Some(repeated) = values.iter().find(|v| all_values.contains(v)) {
            return Err(invalid(format!(
                "value {repeated} of \"{property}\" selects more than one branch"
            )));
        }
        all_values.extend(values.iter().cloned());
        clauses.push(json!({
            "if": {
                "required": [property],
                "properties": { property.as_str(): { "enum": values } }
            },
            "then": branch
        }));
    }

    let mut all_of = vec![
        json!({ "required": [property] }),
        json!({ "properties": { property.as_str(): { "enum": all_values } } }),
    ];
    all_of.extend(clauses);
    match map.remove("allOf") {
        Some(Value::Array(existing)) => all_of.extend(existing),
        Some(_) => return Err(invalid("allOf must be an array".to_string())),
        None => {}
    }
    map.insert("allOf".to_string(), Value::Array(all_of));
    Ok(())
}

/// Follow local `$ref`s from `schema` to the node that defines it.
fn resolve<'a>(root: &'a Value, schema: &'a Value) -> Option<&'a Value> {
    let mut current = schema;
    for _ in 0..MAX_REF_DEPTH {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                let fragment = reference.strip_prefix('#')?;
                current = root.pointer(fragment)?;
            }
            None => return Some(current),
        }
    }
    None
}

fn discriminant_values(branch: &Value, property: &str) -> Option<Vec<Value>> {
    let declared = branch.get("properties")?.get(property)?;
    if let Some(constant) = declared.get("const") {
        return Some(vec![constant.clone()]);
    }
    match declared.get("enum") {
        Some(Value::Array(values)) if !values.is_empty() => Some(values.clone()),
        _ => None,
    }
}

fn escape_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}
