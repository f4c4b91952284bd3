//! Schema validation for DreamARC JSON5 configuration layers.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Expected JSON type of a leaf field.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    String,
    Bool,
    UnsignedInt,
}

/// Sections and the leaf fields each one accepts.
const SECTIONS: &[(&str, &[(&str, FieldKind)])] = &[
    (
        "backend",
        &[
            ("base_url", FieldKind::String),
            ("timeout_secs", FieldKind::UnsignedInt),
        ],
    ),
    (
        "session",
        &[("enabled", FieldKind::Bool), ("path", FieldKind::String)],
    ),
    (
        "tutor",
        &[
            ("default_persona", FieldKind::String),
            ("language", FieldKind::String),
        ],
    ),
    ("speech", &[("output_path", FieldKind::String)]),
];

/// Validate a single config layer against the schema.
///
/// Unknown keys are rejected at every level. `null` is accepted for any
/// field and means "reset to default" when layers are merged.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    for (key, value) in map {
        if key == "$schema" {
            if !value.is_null() && value.as_str().is_none() {
                return Err(invalid_field(layer, key, "expected string"));
            }
            continue;
        }
        let Some((_, fields)) = SECTIONS.iter().find(|(name, _)| name == key) else {
            return Err(invalid_field(layer, key, "unknown key"));
        };
        if value.is_null() {
            continue;
        }
        validate_section(value, fields, layer, key)?;
    }
    Ok(())
}

fn validate_section(
    value: &Value,
    fields: &[(&str, FieldKind)],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    for (key, value) in map {
        let field_path = join_path(path, key);
        let Some((_, kind)) = fields.iter().find(|(name, _)| name == key) else {
            return Err(invalid_field(layer, &field_path, "unknown key"));
        };
        if value.is_null() {
            continue;
        }
        expect_kind(value, *kind, layer, &field_path)?;
    }
    Ok(())
}

fn expect_kind(value: &Value, kind: FieldKind, layer: &str, path: &str) -> Result<(), ConfigError> {
    let (ok, expected) = match kind {
        FieldKind::String => (value.is_string(), "expected string"),
        FieldKind::Bool => (value.is_boolean(), "expected bool"),
        FieldKind::UnsignedInt => (value.is_u64(), "expected non-negative integer"),
    };
    if ok {
        Ok(())
    } else {
        Err(invalid_field(layer, path, expected))
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
