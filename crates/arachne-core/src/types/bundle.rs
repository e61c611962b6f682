//! Bundle type: a compressed multi-edge.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::Value;

/// A compressed multi-edge from one source vertex to many targets.
///
/// All contained edges share the bundle's label; each target carries its own
/// payload. The target map is ordered by gid so traversals over a bundle are
/// deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    /// Globally unique identifier within a graph.
    pub gid: String,
    /// The shared edge label.
    pub label: String,
    /// Source vertex gid.
    pub from: String,
    /// Target vertex gid to per-target payload.
    #[serde(default)]
    pub bundle: BTreeMap<String, HashMap<String, Value>>,
}

impl Bundle {
    /// Creates a new, empty bundle.
    #[must_use]
    pub fn new(gid: impl Into<String>, label: impl Into<String>, from: impl Into<String>) -> Self {
        Self { gid: gid.into(), label: label.into(), from: from.into(), bundle: BTreeMap::new() }
    }

    /// Adds a target with its payload, builder style.
    #[must_use]
    pub fn with_target(mut self, to: impl Into<String>, data: HashMap<String, Value>) -> Self {
        self.bundle.insert(to.into(), data);
        self
    }

    /// Resolves a field path against this bundle.
    ///
    /// Only `"gid"`, `"label"`, and `"from"` address a bundle; per-target
    /// payloads are reached by traversing to the targets instead.
    #[must_use]
    pub fn field(&self, path: &str) -> Value {
        match path {
            "gid" => Value::String(self.gid.clone()),
            "label" => Value::String(self.label.clone()),
            "from" => Value::String(self.from.clone()),
            _ => Value::Null,
        }
    }
}
