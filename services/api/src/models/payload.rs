//! Shape sniffing and lenient scalar helpers shared by the normalizers
//!
//! Responses from the same logical endpoint differ across backend versions.
//! [`Shape::sniff`] classifies a raw payload before any domain mapping so the
//! priority order is explicit: envelope, then array, then flat object.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use tracing::warn;

use common::error::{ClientError, ClientResult};

/// Raw payload classified by its outer structure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<'a> {
    /// Object with a non-empty `data` key; holds the unwrapped value
    Enveloped(&'a Value),
    /// Non-empty array; holds the first element
    ArrayFirst(&'a Value),
    /// Object carrying the identifying field; holds the object itself
    Flat(&'a Value),
    /// None of the above; holds the whole payload
    Unrecognized(&'a Value),
}

impl<'a> Shape<'a> {
    /// Classify a payload. The checks run in a fixed order and the first
    /// match wins.
    pub fn sniff(raw: &'a Value, identifying_field: &str) -> Self {
        if let Some(inner) = envelope(raw) {
            return Shape::Enveloped(inner);
        }
        if let Some(first) = raw.as_array().and_then(|items| items.first()) {
            return Shape::ArrayFirst(first);
        }
        if raw.get(identifying_field).is_some() {
            return Shape::Flat(raw);
        }
        Shape::Unrecognized(raw)
    }

    /// The value the domain mapping should read
    pub fn into_inner(self) -> &'a Value {
        match self {
            Shape::Enveloped(value)
            | Shape::ArrayFirst(value)
            | Shape::Flat(value)
            | Shape::Unrecognized(value) => value,
        }
    }
}

/// The `data` envelope of an object, when it holds anything
pub fn envelope(raw: &Value) -> Option<&Value> {
    raw.get("data").filter(|inner| is_truthy(inner))
}

/// Unwrap a `data` envelope if present, otherwise return the payload itself
pub fn unwrap_envelope(raw: &Value) -> &Value {
    envelope(raw).unwrap_or(raw)
}

/// First present value among `keys` on `raw`
pub fn first_present<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| is_truthy(value))
}

/// Null, `false`, zero and the empty string carry nothing
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// A backend field that arrives as either a number or a string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrString {
    Number(Number),
    Text(String),
}

impl NumberOrString {
    /// String form; numbers render without quotes
    pub fn into_string(self) -> String {
        match self {
            NumberOrString::Number(number) => number.to_string(),
            NumberOrString::Text(text) => text,
        }
    }

    /// Integer form, parsing numeric strings
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            NumberOrString::Number(number) => number
                .as_i64()
                .or_else(|| number.as_u64().and_then(|n| i64::try_from(n).ok())),
            NumberOrString::Text(text) => text.trim().parse().ok(),
        }
    }

    /// Non-negative integer form, parsing numeric strings
    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|n| u64::try_from(n).ok())
    }
}

/// Integer read from a JSON number or numeric string
pub fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Non-negative integer read from a JSON number or numeric string
pub fn lenient_u64(value: &Value) -> Option<u64> {
    lenient_i64(value).and_then(|n| u64::try_from(n).ok())
}

/// Deserialize an input schema, reporting a mismatch as a malformed response
pub fn decode<T>(value: &Value, what: &str) -> ClientResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    T::deserialize(value).map_err(|e| {
        warn!("Rejected {} payload: {}", what, e);
        ClientError::MalformedResponse(format!("Invalid {} payload: {}", what, e))
    })
}
