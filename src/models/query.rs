//! Query-related data models.
//!
//! This module defines positional argument values and command results.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A parameter value for parameterized queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Binary data (base64 encoded in JSON)
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
    /// Structured value bound as JSON (text on SQLite)
    Json(JsonValue),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
        }
    }

    /// Convert a JSON value taken from a named argument.
    ///
    /// Scalars map onto their natural variant; arrays and objects are bound as
    /// JSON. Integers outside the `i64` range fall back to `Float`.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(v) => Self::Bool(v),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Self::String(s),
            other => Self::Json(other),
        }
    }
}

/// Serde adapter for binary data carried as base64 text.
///
/// Binary columns are scanned as base64 strings; annotate a `Vec<u8>` field
/// with `#[serde(with = "sqlbridge::models::query::base64_bytes")]` to receive
/// the raw bytes.
pub mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),+) => {
        $(
            impl From<$t> for QueryParam {
                fn from(v: $t) -> Self {
                    Self::Int(v as i64)
                }
            }
        )+
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for QueryParam {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&String> for QueryParam {
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl From<Vec<u8>> for QueryParam {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<&[u8]> for QueryParam {
    fn from(v: &[u8]) -> Self {
        Self::Bytes(v.to_vec())
    }
}

impl From<JsonValue> for QueryParam {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl<T: Into<QueryParam>> From<Option<T>> for QueryParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Generated key, where the driver reports one (MySQL, SQLite).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_insert_id: Option<i64>,
}

impl ExecResult {
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_param_types() {
        assert!(QueryParam::Null.is_null());
        assert!(!QueryParam::Bool(true).is_null());
        assert_eq!(QueryParam::Int(42).type_name(), "int");
        assert_eq!(
            QueryParam::String("hello".to_string()).type_name(),
            "string"
        );
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(QueryParam::from(7u8), QueryParam::Int(7));
        assert_eq!(QueryParam::from("x"), QueryParam::String("x".into()));
        assert_eq!(QueryParam::from(None::<i32>), QueryParam::Null);
        assert_eq!(QueryParam::from(Some(true)), QueryParam::Bool(true));
        assert_eq!(QueryParam::from(vec![1u8, 2]), QueryParam::Bytes(vec![1, 2]));
    }

    #[test]
    fn test_from_json() {
        assert_eq!(QueryParam::from_json(json!(null)), QueryParam::Null);
        assert_eq!(QueryParam::from_json(json!(3)), QueryParam::Int(3));
        assert_eq!(QueryParam::from_json(json!(1.5)), QueryParam::Float(1.5));
        assert_eq!(
            QueryParam::from_json(json!(u64::MAX)),
            QueryParam::Float(u64::MAX as f64)
        );
        assert_eq!(
            QueryParam::from_json(json!({"a": 1})),
            QueryParam::Json(json!({"a": 1}))
        );
    }

    #[test]
    fn test_exec_result_accessors() {
        let result = ExecResult {
            rows_affected: 2,
            last_insert_id: Some(9),
        };
        assert_eq!(result.rows_affected(), 2);
        assert_eq!(result.last_insert_id(), Some(9));
    }
}
