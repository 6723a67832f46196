//! Request parameter normalization and encoding.
//!
//! # Design
//! A parameter set is a plain `serde_json::Map`. `Value::Null` marks an absent
//! value and `""` an empty one; both are dropped by `clean` before anything is
//! encoded. Every other value survives, including `0` and `false`.
//!
//! serde_json's default map is ordered by key, so encoded query strings and
//! bodies are deterministic.

use serde::Serialize;
use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::error::ApiError;

/// Request parameters keyed by name.
pub type Params = Map<String, Value>;

/// Return a copy of `params` without `null` and empty-string entries.
pub fn clean(params: &Params) -> Params {
    params
        .iter()
        .filter(|(_, value)| !is_blank(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Serialize a typed value into a parameter set.
///
/// `Option::None` fields become `null` and are later removed by `clean`, so
/// a filter struct with optional fields behaves like keyword arguments.
pub fn to_params<T: Serialize>(value: &T) -> Result<Params, ApiError> {
    match serde_json::to_value(value).map_err(|e| ApiError::Serialization(e.to_string()))? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::Serialization(format!(
            "parameters must serialize to an object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Encode `params` as `application/x-www-form-urlencoded`.
///
/// Nested objects use bracket keys (`customer[name]=Acme`) and arrays use
/// `key[]=v` pairs. `null` values are skipped at every depth.
pub fn encode_form(params: &Params) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_pair(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_pair(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Bool(_) | Value::Number(_) => {
            serializer.append_pair(key, &value.to_string());
        }
        Value::Array(items) => {
            let nested = format!("{key}[]");
            for item in items {
                append_pair(serializer, &nested, item);
            }
        }
        Value::Object(map) => {
            for (inner, item) in map {
                append_pair(serializer, &format!("{key}[{inner}]"), item);
            }
        }
    }
}

/// Human-readable JSON type name, used in error messages.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
