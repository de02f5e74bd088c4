//! Query-string and payload sanitization
//!
//! Pure functions applied to every outgoing request before headers are
//! built. Path sanitization is idempotent; both payload sanitizers
//! normalize in place.

use serde_json::{Map, Value};

/// Strips query parameters whose value is empty, missing, or the literal
/// string `undefined`.
///
/// Splits on the first `?`; a pair is retained only when it has exactly
/// one `=` separator and a usable value. The `?` is dropped entirely when
/// nothing survives.
#[must_use]
pub fn sanitize_path(path: &str) -> String {
    let Some((base, query)) = path.split_once('?') else {
        return path.to_string();
    };
    let retained: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let parts: Vec<&str> = pair.split('=').collect();
            parts.len() == 2 && !parts[1].is_empty() && parts[1] != "undefined"
        })
        .collect();
    if retained.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{}", retained.join("&"))
    }
}

/// Removes every key whose value is the empty string or `null`.
///
/// Used for create operations where an absent field and a cleared field
/// mean the same thing to the server.
pub fn drop_empty_fields(payload: &mut Map<String, Value>) {
    payload.retain(|_, value| !(value.is_null() || value.as_str() == Some("")));
}

/// Rewrites empty-string values to explicit `null`, preserving the key.
///
/// Used for update operations where the server must distinguish "field
/// cleared" from "field omitted". Values already `null` are left as-is.
pub fn null_empty_fields(payload: &mut Map<String, Value>) {
    for value in payload.values_mut() {
        if value.as_str() == Some("") {
            *value = Value::Null;
        }
    }
}
