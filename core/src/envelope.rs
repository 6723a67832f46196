//! Envelope unwrapping for mite responses.
//!
//! mite nests every entity under a single key named after its type:
//! `GET /projects.json` returns `[{"project": {...}}, ...]` and
//! `GET /projects/1.json` returns `{"project": {...}}`. Unwrapping removes
//! that one level of nesting.
//!
//! A missing key means "nothing to unwrap" and the value passes through.
//! Arrays fall back per element, so a list mixing enveloped and bare objects
//! keeps its length and order.

use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::params::json_kind;

/// Strip `key` from `value`.
///
/// - array: each object element holding `key` is replaced by `element[key]`;
///   every other element is kept as is.
/// - object: `object[key]` if present, otherwise the object itself.
/// - anything else: `ApiError::InvalidResponseShape`.
pub fn unwrap_envelope(key: &str, value: Value) -> Result<Value, ApiError> {
    match value {
        Value::Array(items) => {
            debug!(envelope = key, len = items.len(), "unwrapping list");
            Ok(Value::Array(
                items.into_iter().map(|item| unwrap_item(key, item)).collect(),
            ))
        }
        Value::Object(_) => {
            debug!(envelope = key, "unwrapping object");
            Ok(unwrap_item(key, value))
        }
        other => Err(ApiError::InvalidResponseShape {
            key: key.to_string(),
            found: json_kind(&other),
        }),
    }
}

fn unwrap_item(key: &str, item: Value) -> Value {
    match item {
        Value::Object(mut map) => match map.remove(key) {
            Some(inner) => inner,
            None => Value::Object(map),
        },
        other => other,
    }
}

/// Wrap `f` so that its JSON result is passed through `unwrap_envelope`.
///
/// Errors returned by `f` propagate untouched. The returned closure takes the
/// same argument as `f`.
///
/// ```
/// use mite_core::{declassify, ApiError};
/// use serde_json::{json, Value};
///
/// let fetch = |id: u64| -> Result<Value, ApiError> { Ok(json!({"project": {"id": id}})) };
/// let fetch_project = declassify("project", fetch);
/// assert_eq!(fetch_project(7).unwrap(), json!({"id": 7}));
/// ```
pub fn declassify<'a, A, F>(key: &'a str, f: F) -> impl Fn(A) -> Result<Value, ApiError> + 'a
where
    F: Fn(A) -> Result<Value, ApiError> + 'a,
{
    move |args| unwrap_envelope(key, f(args)?)
}
