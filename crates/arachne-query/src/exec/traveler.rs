//! The traveler: the unit of data flowing between processors.
//!
//! A [`Traveler`] is immutable. Processors derive new travelers from their
//! inputs via [`with_current`](Traveler::with_current) and
//! [`with_mark`](Traveler::with_mark); the mark table is an `Arc` chain so
//! derivation shares structure instead of copying, which keeps `as` and
//! `select` cheap across deep pipelines.

use std::collections::HashMap;
use std::sync::Arc;

use arachne_core::{lookup_path, Bundle, Edge, Value, Vertex};

use crate::expr::Scope;

/// The item a traveler currently holds.
///
/// Graph elements are shared behind `Arc` because the same element is
/// routinely referenced by several marks at once.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// A vertex.
    Vertex(Arc<Vertex>),
    /// An edge.
    Edge(Arc<Edge>),
    /// A bundle.
    Bundle(Arc<Bundle>),
    /// A raw value, produced by projections, aggregations, and `map`.
    Value(Arc<Value>),
    /// An ordered row of items, produced by multi-label `select`.
    Row(Vec<Item>),
}

impl Item {
    /// Wraps a vertex.
    #[must_use]
    pub fn vertex(v: Vertex) -> Self {
        Self::Vertex(Arc::new(v))
    }

    /// Wraps an edge.
    #[must_use]
    pub fn edge(e: Edge) -> Self {
        Self::Edge(Arc::new(e))
    }

    /// Wraps a bundle.
    #[must_use]
    pub fn bundle(b: Bundle) -> Self {
        Self::Bundle(Arc::new(b))
    }

    /// Wraps a value.
    #[must_use]
    pub fn value(v: Value) -> Self {
        Self::Value(Arc::new(v))
    }

    /// Returns the element gid, if this item is a graph element.
    #[must_use]
    pub fn gid(&self) -> Option<&str> {
        match self {
            Self::Vertex(v) => Some(&v.gid),
            Self::Edge(e) => Some(&e.gid),
            Self::Bundle(b) => Some(&b.gid),
            Self::Value(_) | Self::Row(_) => None,
        }
    }

    /// Returns the element label, if this item is a graph element.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Vertex(v) => Some(&v.label),
            Self::Edge(e) => Some(&e.label),
            Self::Bundle(b) => Some(&b.label),
            Self::Value(_) | Self::Row(_) => None,
        }
    }

    /// Returns the vertex, if this item holds one.
    #[must_use]
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Self::Vertex(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the value, if this item holds one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Resolves a field path against this item.
    ///
    /// Graph elements resolve through their own field resolvers (`"gid"`,
    /// `"label"`, endpoints, then property data); a map value resolves
    /// directly into the map. Other items resolve to `Null`.
    #[must_use]
    pub fn field(&self, path: &str) -> Value {
        match self {
            Self::Vertex(v) => v.field(path),
            Self::Edge(e) => e.field(path),
            Self::Bundle(b) => b.field(path),
            Self::Value(v) => match v.as_ref() {
                Value::Map(map) => lookup_path(map, path).cloned().unwrap_or(Value::Null),
                _ => Value::Null,
            },
            Self::Row(_) => Value::Null,
        }
    }

    /// Renders the item as the structured value expressions see.
    #[must_use]
    pub fn scope_value(&self) -> Value {
        match self {
            Self::Vertex(v) => {
                let mut map = HashMap::new();
                map.insert("gid".to_string(), Value::String(v.gid.clone()));
                map.insert("label".to_string(), Value::String(v.label.clone()));
                map.insert("data".to_string(), Value::Map(v.data.clone()));
                Value::Map(map)
            }
            Self::Edge(e) => {
                let mut map = HashMap::new();
                map.insert("gid".to_string(), Value::String(e.gid.clone()));
                map.insert("label".to_string(), Value::String(e.label.clone()));
                map.insert("from".to_string(), Value::String(e.from.clone()));
                map.insert("to".to_string(), Value::String(e.to.clone()));
                map.insert("data".to_string(), Value::Map(e.data.clone()));
                Value::Map(map)
            }
            Self::Bundle(b) => {
                let mut targets = HashMap::new();
                for (to, data) in &b.bundle {
                    targets.insert(to.clone(), Value::Map(data.clone()));
                }
                let mut map = HashMap::new();
                map.insert("gid".to_string(), Value::String(b.gid.clone()));
                map.insert("label".to_string(), Value::String(b.label.clone()));
                map.insert("from".to_string(), Value::String(b.from.clone()));
                map.insert("bundle".to_string(), Value::Map(targets));
                Value::Map(map)
            }
            Self::Value(v) => v.as_ref().clone(),
            Self::Row(items) => Value::Array(items.iter().map(Item::scope_value).collect()),
        }
    }
}

#[derive(Debug)]
struct MarkNode {
    name: Arc<str>,
    item: Item,
    prev: Option<Arc<MarkNode>>,
}

/// The mark table: named slots recording earlier items.
///
/// Stored as an `Arc` chain. [`set`](Self::set) pushes a node; lookup walks
/// from the newest node, so re-marking a name overwrites without touching
/// shared history.
#[derive(Debug, Clone, Default)]
pub struct Marks {
    head: Option<Arc<MarkNode>>,
}

impl Marks {
    /// Creates an empty mark table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no marks are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns a table with `name` bound to `item`, sharing this table's
    /// history.
    #[must_use]
    pub fn set(&self, name: &str, item: Item) -> Marks {
        Marks {
            head: Some(Arc::new(MarkNode {
                name: Arc::from(name),
                item,
                prev: self.head.clone(),
            })),
        }
    }

    /// Looks up a mark; the newest binding for a name wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Item> {
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            if n.name.as_ref() == name {
                return Some(&n.item);
            }
            node = n.prev.as_deref();
        }
        None
    }

    /// Returns the entries added to this table since `base`, oldest first.
    ///
    /// `base` must be an ancestor of this table (which holds whenever this
    /// table was derived from it); entries are detected by pointer equality
    /// on the shared tail.
    #[must_use]
    pub fn added_since(&self, base: &Marks) -> Vec<(Arc<str>, Item)> {
        let mut added = Vec::new();
        let mut node = self.head.as_ref();
        while let Some(n) = node {
            if let Some(base_head) = base.head.as_ref() {
                if Arc::ptr_eq(n, base_head) {
                    break;
                }
            }
            added.push((Arc::clone(&n.name), n.item.clone()));
            node = n.prev.as_ref();
        }
        added.reverse();
        added
    }

    /// Renders the table as the map expressions see; shadowed bindings are
    /// omitted.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = HashMap::new();
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            map.entry(n.name.to_string()).or_insert_with(|| n.item.scope_value());
            node = n.prev.as_deref();
        }
        Value::Map(map)
    }
}

/// A streaming record: a current item plus the mark table of its path.
#[derive(Debug, Clone)]
pub struct Traveler {
    current: Item,
    marks: Marks,
    /// Gid of the most recent vertex on the derivation chain, for
    /// per-vertex grouping in `vertexFold`.
    last_vertex: Option<Arc<str>>,
}

impl Traveler {
    /// Starts a traveler at an item with no marks.
    #[must_use]
    pub fn new(current: Item) -> Self {
        let last_vertex = current.as_vertex().map(|v| Arc::from(v.gid.as_str()));
        Self { current, marks: Marks::new(), last_vertex }
    }

    /// Derives a traveler at a new item, carrying marks through unchanged.
    #[must_use]
    pub fn with_current(&self, current: Item) -> Self {
        let last_vertex = match current.as_vertex() {
            Some(v) => Some(Arc::from(v.gid.as_str())),
            None => self.last_vertex.clone(),
        };
        Self { current, marks: self.marks.clone(), last_vertex }
    }

    /// Derives a traveler with the current item recorded under `name`.
    #[must_use]
    pub fn with_mark(&self, name: &str) -> Self {
        Self {
            current: self.current.clone(),
            marks: self.marks.set(name, self.current.clone()),
            last_vertex: self.last_vertex.clone(),
        }
    }

    /// Derives a traveler with a replacement mark table.
    #[must_use]
    pub fn with_marks(&self, marks: Marks) -> Self {
        Self { current: self.current.clone(), marks, last_vertex: self.last_vertex.clone() }
    }

    /// The item under consideration.
    #[must_use]
    pub fn current(&self) -> &Item {
        &self.current
    }

    /// The mark table.
    #[must_use]
    pub fn marks(&self) -> &Marks {
        &self.marks
    }

    /// Gid of the most recent vertex on the derivation chain.
    #[must_use]
    pub fn last_vertex(&self) -> Option<&str> {
        self.last_vertex.as_deref()
    }

    /// Builds the expression scope for this traveler.
    #[must_use]
    pub fn scope(&self) -> Scope {
        Scope::new()
            .with("current", self.current.scope_value())
            .with("marks", self.marks.to_value())
    }

    /// Builds the expression scope with a fold accumulator bound as `acc`.
    #[must_use]
    pub fn scope_with_acc(&self, acc: &Value) -> Scope {
        self.scope().with("acc", acc.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(gid: &str) -> Item {
        Item::vertex(Vertex::new(gid, "Person"))
    }

    #[test]
    fn marks_overwrite_without_touching_history() {
        let empty = Marks::new();
        let first = empty.set("a", v("v1"));
        let second = first.set("a", v("v2"));

        assert_eq!(second.get("a").and_then(Item::gid), Some("v2"));
        assert_eq!(first.get("a").and_then(Item::gid), Some("v1"));
        assert!(empty.get("a").is_none());
    }

    #[test]
    fn added_since_reports_new_entries_oldest_first() {
        let base = Marks::new().set("a", v("v1"));
        let derived = base.set("b", v("v2")).set("c", v("v3"));

        let added = derived.added_since(&base);
        let names: Vec<&str> = added.iter().map(|(n, _)| n.as_ref()).collect();
        assert_eq!(names, ["b", "c"]);

        assert!(base.added_since(&base).is_empty());
    }

    #[test]
    fn to_value_hides_shadowed_bindings() {
        let marks = Marks::new().set("a", v("v1")).set("a", v("v2"));
        let rendered = marks.to_value();
        let map = rendered.as_map().expect("map");
        let a = map.get("a").and_then(Value::as_map).expect("mark a");
        assert_eq!(a.get("gid"), Some(&Value::from("v2")));
    }

    #[test]
    fn derivation_keeps_marks_and_tracks_vertices() {
        let start = Traveler::new(v("v1")).with_mark("a");
        let moved = start.with_current(Item::value(Value::Int(1)));

        assert_eq!(moved.marks().get("a").and_then(Item::gid), Some("v1"));
        assert_eq!(moved.last_vertex(), Some("v1"));

        let at_v2 = moved.with_current(v("v2"));
        assert_eq!(at_v2.last_vertex(), Some("v2"));
    }

    #[test]
    fn scope_exposes_current_and_marks() {
        let t = Traveler::new(v("v1")).with_mark("a");
        let scope = t.scope();
        let current = scope.get("current").and_then(Value::as_map).expect("current");
        assert_eq!(current.get("gid"), Some(&Value::from("v1")));
        let marks = scope.get("marks").and_then(Value::as_map).expect("marks");
        assert!(marks.contains_key("a"));
    }

    #[test]
    fn field_resolution_by_item_kind() {
        let vertex = Item::vertex(Vertex::new("v1", "Person").with_property("age", 35i64));
        assert_eq!(vertex.field("age"), Value::Int(35));
        assert_eq!(vertex.field("label"), Value::from("Person"));

        let mut record = HashMap::new();
        record.insert("name".to_string(), Value::from("Jack"));
        let value = Item::value(Value::Map(record));
        assert_eq!(value.field("name"), Value::from("Jack"));
        assert_eq!(value.field("label"), Value::Null);

        let row = Item::Row(vec![vertex]);
        assert_eq!(row.field("age"), Value::Null);
    }
}
