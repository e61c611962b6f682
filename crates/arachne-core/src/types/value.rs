//! Property values that can be stored on vertices, edges, and bundles.
//!
//! This module provides the [`Value`] enum, which represents all possible
//! value types that can be stored as properties in Arachne.
//!
//! # Example
//!
//! ```
//! use arachne_core::Value;
//!
//! // Create values via From trait
//! let name: Value = "Bob".into();
//! let age: Value = 35i64.into();
//! let active: Value = true.into();
//!
//! // Access typed values
//! assert_eq!(name.as_str(), Some("Bob"));
//! assert_eq!(age.as_int(), Some(35));
//! assert_eq!(active.as_bool(), Some(true));
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A value that can be stored as a property on a graph element.
///
/// Property data forms a tree: maps of named values whose leaves are
/// scalars and whose branches are nested maps or ordered arrays.
///
/// | Variant | Rust Type | Use Case |
/// |---------|-----------|----------|
/// | `Null` | - | Missing/optional values |
/// | `Bool` | `bool` | Boolean flags |
/// | `Int` | `i64` | Integers, counters, timestamps |
/// | `Float` | `f64` | Numeric measurements |
/// | `String` | `String` | Text data |
/// | `Array` | `Vec<Value>` | Ordered sequences |
/// | `Map` | `HashMap<String, Value>` | Nested structures |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered sequence of values
    Array(Vec<Value>),
    /// Nested map of named values
    Map(HashMap<String, Value>),
}

impl Value {
    /// Returns the string content if this is a `String` value.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer content if this is an `Int` value.
    #[inline]
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float content, converting from `Int` if needed.
    #[inline]
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the boolean content if this is a `Bool` value.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the array content if this is an `Array` value.
    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the map content if this is a `Map` value.
    #[inline]
    #[must_use]
    pub fn as_map(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns true if this is the `Null` value.
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the truthiness of this value.
    ///
    /// `Null`, `false`, zero, the empty string, and empty containers are
    /// false; everything else is true.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::Array(items) => !items.is_empty(),
            Self::Map(map) => !map.is_empty(),
        }
    }

    /// Compares two values, treating `Int` and `Float` as one numeric type.
    ///
    /// All other variants compare structurally.
    #[must_use]
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (a, b) => a == b,
        }
    }

    /// Renders a scalar value as a grouping key.
    ///
    /// Arrays, maps, and null have no key and return `None`.
    #[must_use]
    pub fn as_key(&self) -> Option<String> {
        match self {
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::String(s) => Some(s.clone()),
            Self::Null | Self::Array(_) | Self::Map(_) => None,
        }
    }

    /// Returns a short name for the variant, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Null
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

impl From<HashMap<String, Value>> for Value {
    #[inline]
    fn from(map: HashMap<String, Value>) -> Self {
        Self::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_impls() {
        assert_eq!(Value::from(true), Value::Bool(true));
        assert_eq!(Value::from(42i64), Value::Int(42));
        assert_eq!(Value::from(3.5), Value::Float(3.5));
        assert_eq!(Value::from("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn typed_accessors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(7i64).as_int(), Some(7));
        assert_eq!(Value::from(7i64).as_float(), Some(7.0));
        assert_eq!(Value::from(false).as_bool(), Some(false));
        assert_eq!(Value::Null.as_str(), None);
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(!Value::Array(vec![]).is_truthy());
        assert!(!Value::Map(HashMap::new()).is_truthy());

        assert!(Value::Bool(true).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::from("x").is_truthy());
        assert!(Value::Array(vec![Value::Null]).is_truthy());
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Int(35).loose_eq(&Value::Float(35.0)));
        assert!(Value::Float(35.0).loose_eq(&Value::Int(35)));
        assert!(!Value::Int(35).loose_eq(&Value::from("35")));
        assert!(Value::from("a").loose_eq(&Value::from("a")));
    }

    #[test]
    fn grouping_keys() {
        assert_eq!(Value::from("Person").as_key(), Some("Person".to_string()));
        assert_eq!(Value::Int(35).as_key(), Some("35".to_string()));
        assert_eq!(Value::Null.as_key(), None);
        assert_eq!(Value::Array(vec![]).as_key(), None);
    }

    #[test]
    fn serde_untagged() {
        let v: Value = serde_json::from_str(r#"{"name":"Bob","age":35}"#).expect("parse");
        let map = v.as_map().expect("map");
        assert_eq!(map.get("name"), Some(&Value::from("Bob")));
        assert_eq!(map.get("age"), Some(&Value::Int(35)));
    }
}
