//! Result types delivered to the caller.

use serde::{Deserialize, Serialize};

use arachne_core::{Bundle, Edge, Value, Vertex};

use super::traveler::Item;

/// One result position: a graph element or a raw value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ElementValue {
    /// A vertex.
    Vertex(Vertex),
    /// An edge.
    Edge(Edge),
    /// A bundle.
    Bundle(Bundle),
    /// A raw value.
    Value(Value),
}

impl ElementValue {
    /// Returns the vertex, if this holds one.
    #[must_use]
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Self::Vertex(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the edge, if this holds one.
    #[must_use]
    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Self::Edge(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the raw value, if this holds one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    fn from_item(item: &Item) -> Self {
        match item {
            Item::Vertex(v) => Self::Vertex(v.as_ref().clone()),
            Item::Edge(e) => Self::Edge(e.as_ref().clone()),
            Item::Bundle(b) => Self::Bundle(b.as_ref().clone()),
            Item::Value(v) => Self::Value(v.as_ref().clone()),
            // A row inside a row cannot be a wire element; render it as an
            // array value instead.
            Item::Row(_) => Self::Value(item.scope_value()),
        }
    }
}

/// One row of the result stream.
///
/// Linear pipelines emit `Value`; a multi-label `select` emits `Row` with
/// the marked elements in the order the labels were given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultRow {
    /// A single result.
    Value(ElementValue),
    /// An ordered row of results.
    Row(Vec<ElementValue>),
}

impl ResultRow {
    /// Returns the single result, if this is not a row.
    #[must_use]
    pub fn as_value(&self) -> Option<&ElementValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Row(_) => None,
        }
    }

    /// Returns the row entries, if this is a row.
    #[must_use]
    pub fn as_row(&self) -> Option<&[ElementValue]> {
        match self {
            Self::Row(row) => Some(row),
            Self::Value(_) => None,
        }
    }
}

impl From<&Item> for ResultRow {
    fn from(item: &Item) -> Self {
        match item {
            Item::Row(items) => Self::Row(items.iter().map(ElementValue::from_item).collect()),
            other => Self::Value(ElementValue::from_item(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_conversion() {
        let item = Item::vertex(Vertex::new("v1", "Person"));
        let row = ResultRow::from(&item);
        assert_eq!(row.as_value().and_then(ElementValue::as_vertex).map(|v| v.gid.as_str()), Some("v1"));

        let row_item = Item::Row(vec![
            Item::vertex(Vertex::new("v1", "Person")),
            Item::value(Value::Int(3)),
        ]);
        let row = ResultRow::from(&row_item);
        let entries = row.as_row().expect("row");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].as_value(), Some(&Value::Int(3)));
    }

    #[test]
    fn wire_shape() {
        let row = ResultRow::Value(ElementValue::Value(Value::Int(3)));
        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"{"value":{"value":3}}"#);
    }
}
