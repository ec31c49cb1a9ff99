//! Tolerant field deserializers for model records.
//!
//! Language models do not reliably respect the requested JSON types. Text
//! fields accept any JSON value: strings are taken as they are and anything
//! else is kept as its compact JSON text.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

fn into_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

/// Deserialize an optional string from any JSON value.
///
/// `null` maps to `None`; numbers, booleans, arrays and objects map to their
/// JSON text.
pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(into_text)
}

/// Like [`opt_string`], but records that the key was present.
///
/// Combined with `#[serde(default)]`, a missing key yields `None` while a
/// present key yields `Some(text)`.
pub(crate) fn present_string<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    opt_string(deserializer).map(Some)
}

/// Mark a field as present whenever its key appears, even with a `null` value.
///
/// Combined with `#[serde(default)]`, a missing key yields `None` while a
/// present key yields `Some(inner)`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}
