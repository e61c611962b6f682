//! Graph element types.
//!
//! This module provides the data model that flows between storage backends
//! and the traversal engine:
//!
//! - [`Value`] - property values (nested maps, arrays, scalars)
//! - [`Vertex`] - a labeled node with a property map
//! - [`Edge`] - a labeled, directed connection between two vertices
//! - [`Bundle`] - a compressed one-source-to-many-targets multi-edge

mod bundle;
mod edge;
mod value;
mod vertex;

pub use bundle::Bundle;
pub use edge::Edge;
pub use value::Value;
pub use vertex::Vertex;

use std::collections::HashMap;

/// Resolves a `.`-separated path inside a property map.
///
/// Each path segment descends into a [`Value::Map`]; a missing segment or a
/// non-map intermediate resolves to `None`.
#[must_use]
pub fn lookup_path<'a>(data: &'a HashMap<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = data.get(first)?;
    for segment in segments {
        match current {
            Value::Map(map) => current = map.get(segment)?,
            _ => return None,
        }
    }
    Some(current)
}
