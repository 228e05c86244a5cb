//! Cell values carried by rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The declared type of a row column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// UTF-8 text.
    String,
    /// 64-bit signed integer.
    Integer,
    /// UTC timestamp.
    Timestamp,
    /// Raw bytes.
    Binary,
    /// Structured data (JSON).
    Structured,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::Integer => write!(f, "integer"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::Binary => write!(f, "binary"),
            Self::Structured => write!(f, "structured"),
        }
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent value.
    Null,
    /// Text.
    String(String),
    /// Integer.
    Integer(i64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Raw bytes, base64 in serialized form.
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Structured data.
    Structured(serde_json::Value),
}

impl Value {
    /// Returns true for `Value::Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the bytes if this is a binary value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value type, or `None` for nulls.
    #[must_use]
    pub const fn value_type(&self) -> Option<ValueType> {
        match self {
            Self::Null => None,
            Self::String(_) => Some(ValueType::String),
            Self::Integer(_) => Some(ValueType::Integer),
            Self::Timestamp(_) => Some(ValueType::Timestamp),
            Self::Binary(_) => Some(ValueType::Binary),
            Self::Structured(_) => Some(ValueType::Structured),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map_or(Self::Null, Self::String)
    }
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(ts: Option<DateTime<Utc>>) -> Self {
        ts.map_or(Self::Null, Self::Timestamp)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_conversions() {
        assert_eq!(Value::from(None::<String>), Value::Null);
        assert_eq!(Value::from(Some("x".to_string())), Value::String("x".into()));
        assert!(Value::from(None::<DateTime<Utc>>).is_null());
    }

    #[test]
    fn test_binary_serializes_as_base64() {
        let json = serde_json::to_value(Value::Binary(vec![1, 2, 3])).unwrap();
        assert_eq!(json, serde_json::json!({"type": "binary", "value": "AQID"}));
    }

    #[test]
    fn test_value_type() {
        assert_eq!(Value::Null.value_type(), None);
        assert_eq!(Value::from("a").value_type(), Some(ValueType::String));
        assert_eq!(Value::Integer(3).value_type(), Some(ValueType::Integer));
    }
}
