//! Edge type for the graph.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{lookup_path, Value};

/// A directed, labeled edge between two vertices.
///
/// Referential integrity is a backend concern; `from` and `to` may name
/// vertices that no longer resolve, and consumers treat a dangling endpoint
/// as a silently filtered item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Globally unique identifier within a graph.
    pub gid: String,
    /// The edge label.
    pub label: String,
    /// Source vertex gid.
    pub from: String,
    /// Target vertex gid.
    pub to: String,
    /// Property data.
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

impl Edge {
    /// Creates a new edge with no properties.
    #[must_use]
    pub fn new(
        gid: impl Into<String>,
        label: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            gid: gid.into(),
            label: label.into(),
            from: from.into(),
            to: to.into(),
            data: HashMap::new(),
        }
    }

    /// Adds a property, builder style.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Resolves a field path against this edge.
    ///
    /// `"gid"`, `"label"`, `"from"`, and `"to"` address the element itself;
    /// any other path is looked up in the property data.
    #[must_use]
    pub fn field(&self, path: &str) -> Value {
        match path {
            "gid" => Value::String(self.gid.clone()),
            "label" => Value::String(self.label.clone()),
            "from" => Value::String(self.from.clone()),
            "to" => Value::String(self.to.clone()),
            _ => lookup_path(&self.data, path).cloned().unwrap_or(Value::Null),
        }
    }
}
