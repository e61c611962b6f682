//! Vertex type for the graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{lookup_path, Value};

/// A vertex (node) in a property graph.
///
/// A vertex has a globally unique identifier within its graph, a non-empty
/// label, and a tree of property data.
///
/// # Example
///
/// ```
/// use arachne_core::Vertex;
///
/// let v = Vertex::new("v1", "Person")
///     .with_property("name", "Bob")
///     .with_property("age", 35i64);
///
/// assert_eq!(v.label, "Person");
/// assert_eq!(v.field("name").as_str(), Some("Bob"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Globally unique identifier within a graph.
    pub gid: String,
    /// The vertex label.
    pub label: String,
    /// Property data.
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

impl Vertex {
    /// Creates a new vertex with no properties.
    #[must_use]
    pub fn new(gid: impl Into<String>, label: impl Into<String>) -> Self {
        Self { gid: gid.into(), label: label.into(), data: HashMap::new() }
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Resolves a field path against this vertex.
    ///
    /// `"gid"` and `"label"` address the element itself; any other path is
    /// looked up in the property data, descending into nested maps at each
    /// `.`-separated segment. Missing paths resolve to [`Value::Null`].
    #[must_use]
    pub fn field(&self, path: &str) -> Value {
        match path {
            "gid" => Value::String(self.gid.clone()),
            "label" => Value::String(self.label.clone()),
            _ => lookup_path(&self.data, path).cloned().unwrap_or(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_resolution() {
        let v = Vertex::new("v1", "Person").with_property("age", 35i64);
        assert_eq!(v.field("gid"), Value::from("v1"));
        assert_eq!(v.field("label"), Value::from("Person"));
        assert_eq!(v.field("age"), Value::Int(35));
        assert_eq!(v.field("missing"), Value::Null);
    }

    #[test]
    fn nested_field_resolution() {
        let mut address = HashMap::new();
        address.insert("city".to_string(), Value::from("Boston"));
        let v = Vertex::new("v1", "Person").with_property("address", Value::Map(address));
        assert_eq!(v.field("address.city"), Value::from("Boston"));
        assert_eq!(v.field("address.zip"), Value::Null);
    }
}
