use serde::Deserialize;
use serde_json::Value;

use crate::error::{ServiceError, ServiceResult};

/// A candidate's admission profile as sent by a client.
///
/// Fields stay loosely typed here: each operation validates the subset it
/// needs and reports exactly which fields were missing or malformed. An
/// explicit `null` is treated the same as an absent field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfile {
    pub percentile: Option<Value>,
    pub rank: Option<Value>,

    // Recommendation filters: lists of strings. Empty or absent means no
    // restriction.
    pub cities: Option<Value>,
    pub branches: Option<Value>,
    pub seat_types: Option<Value>,

    pub score_type: Option<Value>,
    pub category: Option<Value>,
    pub gender: Option<Value>,

    // Single-valued fields used by prediction.
    pub branch: Option<Value>,
    pub seat_type: Option<Value>,
}

impl UserProfile {
    /// Parse a JSON request body. Anything that is not a JSON object of the
    /// expected shape is a validation failure.
    pub fn from_json(body: &[u8]) -> ServiceResult<Self> {
        serde_json::from_slice(body).map_err(|e| ServiceError::Validation {
            message: format!("Invalid request body: {e}"),
            fields: Vec::new(),
        })
    }
}

/// Read a number from a JSON number or a numeric string.
pub fn parse_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Read an integer from a JSON number (fractions truncate toward zero) or an
/// integer string.
pub fn parse_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Read a string value; other JSON types are rejected.
pub fn parse_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Read a list of strings. Any other shape, or a non-string element, is
/// rejected.
pub fn parse_text_list(value: &Value) -> Option<Vec<String>> {
    value.as_array()?.iter().map(parse_text).collect()
}
