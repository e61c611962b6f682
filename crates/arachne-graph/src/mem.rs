//! In-memory reference backend.
//!
//! [`MemGraph`] keeps everything in `BTreeMap`s so every stream it hands the
//! engine is deterministic, which the traversal ordering guarantees depend
//! on. It doubles as the reference implementation of [`GraphInterface`] and
//! as the substrate for the engine test suite.

use std::collections::BTreeMap;
use std::sync::Arc;

use arachne_core::{validate_graph_name, Bundle, Edge, Value, Vertex};
use parking_lot::RwLock;

use crate::error::{GraphError, GraphResult};
use crate::interface::{
    BundleStream, EdgeStream, GidStream, GraphDB, GraphInterface, VertexStream,
};
use crate::timestamp::Timestamp;

#[derive(Debug, Default)]
struct GraphData {
    vertices: BTreeMap<String, Vertex>,
    edges: BTreeMap<String, Edge>,
    bundles: BTreeMap<String, Bundle>,
    /// Source vertex gid to edge gids, in insertion order.
    out_edges: BTreeMap<String, Vec<String>>,
    /// Target vertex gid to edge gids, in insertion order.
    in_edges: BTreeMap<String, Vec<String>>,
    /// Source vertex gid to bundle gids, in insertion order.
    out_bundles: BTreeMap<String, Vec<String>>,
}

/// A single in-memory graph.
///
/// Reads take a short read lock per item, so streams observe edits made
/// while they are being consumed; the engine only requires that iteration
/// order be deterministic for a fixed graph state.
pub struct MemGraph {
    name: String,
    data: Arc<RwLock<GraphData>>,
    ts: Arc<Timestamp>,
}

impl MemGraph {
    fn new(name: impl Into<String>, ts: Arc<Timestamp>) -> Self {
        Self { name: name.into(), data: Arc::new(RwLock::new(GraphData::default())), ts }
    }

    /// Returns the graph name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts or replaces a vertex.
    pub fn add_vertex(&self, vertex: Vertex) {
        self.data.write().vertices.insert(vertex.gid.clone(), vertex);
        self.ts.touch(&self.name);
    }

    /// Inserts or replaces an edge, maintaining the adjacency indexes.
    pub fn add_edge(&self, edge: Edge) {
        let mut data = self.data.write();
        if let Some(old) = data.edges.remove(&edge.gid) {
            detach(&mut data.out_edges, &old.from, &old.gid);
            detach(&mut data.in_edges, &old.to, &old.gid);
        }
        data.out_edges.entry(edge.from.clone()).or_default().push(edge.gid.clone());
        data.in_edges.entry(edge.to.clone()).or_default().push(edge.gid.clone());
        data.edges.insert(edge.gid.clone(), edge);
        drop(data);
        self.ts.touch(&self.name);
    }

    /// Inserts or replaces a bundle, maintaining the adjacency index.
    pub fn add_bundle(&self, bundle: Bundle) {
        let mut data = self.data.write();
        if let Some(old) = data.bundles.remove(&bundle.gid) {
            detach(&mut data.out_bundles, &old.from, &old.gid);
        }
        data.out_bundles.entry(bundle.from.clone()).or_default().push(bundle.gid.clone());
        data.bundles.insert(bundle.gid.clone(), bundle);
        drop(data);
        self.ts.touch(&self.name);
    }

    fn vertex_stream(&self, gids: Vec<String>, labels: Vec<String>) -> VertexStream {
        let data = Arc::clone(&self.data);
        Box::new(gids.into_iter().filter_map(move |gid| {
            let guard = data.read();
            let vertex = guard.vertices.get(&gid)?;
            if !labels.is_empty() && !labels.iter().any(|l| *l == vertex.label) {
                return None;
            }
            Some(Ok(vertex.clone()))
        }))
    }

    fn edge_stream(&self, gids: Vec<String>, labels: Vec<String>) -> EdgeStream {
        let data = Arc::clone(&self.data);
        Box::new(gids.into_iter().filter_map(move |gid| {
            let guard = data.read();
            let edge = guard.edges.get(&gid)?;
            if !labels.is_empty() && !labels.iter().any(|l| *l == edge.label) {
                return None;
            }
            Some(Ok(edge.clone()))
        }))
    }

    fn bundle_stream(&self, gids: Vec<String>, labels: Vec<String>) -> BundleStream {
        let data = Arc::clone(&self.data);
        Box::new(gids.into_iter().filter_map(move |gid| {
            let guard = data.read();
            let bundle = guard.bundles.get(&gid)?;
            if !labels.is_empty() && !labels.iter().any(|l| *l == bundle.label) {
                return None;
            }
            Some(Ok(bundle.clone()))
        }))
    }
}

fn detach(index: &mut BTreeMap<String, Vec<String>>, key: &str, gid: &str) {
    if let Some(gids) = index.get_mut(key) {
        gids.retain(|g| g != gid);
        if gids.is_empty() {
            index.remove(key);
        }
    }
}

impl GraphInterface for MemGraph {
    fn get_vertex(&self, gid: &str) -> GraphResult<Option<Vertex>> {
        Ok(self.data.read().vertices.get(gid).cloned())
    }

    fn get_edge(&self, gid: &str) -> GraphResult<Option<Edge>> {
        Ok(self.data.read().edges.get(gid).cloned())
    }

    fn list_vertices(&self, labels: &[String]) -> VertexStream {
        let gids: Vec<String> = self.data.read().vertices.keys().cloned().collect();
        self.vertex_stream(gids, labels.to_vec())
    }

    fn list_edges(&self, labels: &[String]) -> EdgeStream {
        let gids: Vec<String> = self.data.read().edges.keys().cloned().collect();
        self.edge_stream(gids, labels.to_vec())
    }

    fn out_edges(&self, from: &str, labels: &[String]) -> EdgeStream {
        let gids = self.data.read().out_edges.get(from).cloned().unwrap_or_default();
        self.edge_stream(gids, labels.to_vec())
    }

    fn in_edges(&self, to: &str, labels: &[String]) -> EdgeStream {
        let gids = self.data.read().in_edges.get(to).cloned().unwrap_or_default();
        self.edge_stream(gids, labels.to_vec())
    }

    fn out_bundles(&self, from: &str, labels: &[String]) -> BundleStream {
        let gids = self.data.read().out_bundles.get(from).cloned().unwrap_or_default();
        self.bundle_stream(gids, labels.to_vec())
    }

    fn has_candidates(&self, field: &str, within: &[Value]) -> Option<GidStream> {
        let matches: Vec<GraphResult<String>> = self
            .data
            .read()
            .vertices
            .values()
            .filter(|v| {
                let resolved = v.field(field);
                within.iter().any(|w| resolved.loose_eq(w))
            })
            .map(|v| Ok(v.gid.clone()))
            .collect();
        Some(Box::new(matches.into_iter()))
    }
}

/// The multi-graph in-memory backend.
#[derive(Default)]
pub struct MemGraphDB {
    graphs: RwLock<BTreeMap<String, Arc<MemGraph>>>,
    ts: Arc<Timestamp>,
}

impl MemGraphDB {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new named graph.
    ///
    /// # Errors
    ///
    /// Fails if the name is invalid or the graph already exists.
    pub fn add_graph(&self, name: &str) -> GraphResult<Arc<MemGraph>> {
        validate_graph_name(name)?;
        let mut graphs = self.graphs.write();
        if graphs.contains_key(name) {
            return Err(GraphError::backend(format!("graph '{name}' already exists")));
        }
        let graph = Arc::new(MemGraph::new(name, Arc::clone(&self.ts)));
        graphs.insert(name.to_string(), Arc::clone(&graph));
        Ok(graph)
    }

    /// Returns the shared modification tracker.
    #[must_use]
    pub fn timestamp(&self) -> Arc<Timestamp> {
        Arc::clone(&self.ts)
    }
}

impl GraphDB for MemGraphDB {
    fn graph(&self, name: &str) -> GraphResult<Arc<dyn GraphInterface>> {
        let graphs = self.graphs.read();
        match graphs.get(name) {
            Some(graph) => Ok(Arc::clone(graph) as Arc<dyn GraphInterface>),
            None => Err(GraphError::GraphNotFound(name.to_string())),
        }
    }

    fn list_graphs(&self) -> Vec<String> {
        self.graphs.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_graph() -> (MemGraphDB, Arc<MemGraph>) {
        let db = MemGraphDB::new();
        let g = db.add_graph("people").expect("add graph");
        g.add_vertex(Vertex::new("v1", "Person").with_property("age", 35i64));
        g.add_vertex(Vertex::new("v2", "Person").with_property("age", 50i64));
        g.add_vertex(Vertex::new("v3", "Robot"));
        g.add_edge(Edge::new("e1", "knows", "v1", "v2"));
        g.add_edge(Edge::new("e2", "made", "v2", "v3"));
        (db, g)
    }

    #[test]
    fn point_lookups() {
        let (_db, g) = person_graph();
        assert_eq!(g.get_vertex("v1").expect("get").map(|v| v.label), Some("Person".into()));
        assert_eq!(g.get_vertex("nope").expect("get"), None);
        assert_eq!(g.get_edge("e1").expect("get").map(|e| e.to), Some("v2".into()));
    }

    #[test]
    fn list_vertices_is_deterministic() {
        let (_db, g) = person_graph();
        let gids: Vec<String> = g
            .list_vertices(&[])
            .map(|r| r.expect("vertex").gid)
            .collect();
        assert_eq!(gids, ["v1", "v2", "v3"]);
    }

    #[test]
    fn label_filters() {
        let (_db, g) = person_graph();
        let labels = vec!["Person".to_string()];
        assert_eq!(g.list_vertices(&labels).count(), 2);
        let labels = vec!["knows".to_string()];
        assert_eq!(g.list_edges(&labels).count(), 1);
    }

    #[test]
    fn adjacency() {
        let (_db, g) = person_graph();
        let out: Vec<String> =
            g.out_edges("v1", &[]).map(|r| r.expect("edge").gid).collect();
        assert_eq!(out, ["e1"]);
        let into: Vec<String> =
            g.in_edges("v3", &[]).map(|r| r.expect("edge").gid).collect();
        assert_eq!(into, ["e2"]);
        assert_eq!(g.out_edges("v3", &[]).count(), 0);
    }

    #[test]
    fn edge_replacement_rewires_adjacency() {
        let (_db, g) = person_graph();
        g.add_edge(Edge::new("e1", "knows", "v2", "v1"));
        assert_eq!(g.out_edges("v1", &[]).count(), 0);
        let out: Vec<String> =
            g.out_edges("v2", &[]).map(|r| r.expect("edge").gid).collect();
        assert_eq!(out, ["e2", "e1"]);
    }

    #[test]
    fn bundles() {
        let (_db, g) = person_graph();
        g.add_bundle(
            Bundle::new("b1", "reads", "v1")
                .with_target("v2", Default::default())
                .with_target("v3", Default::default()),
        );
        let bundles: Vec<Bundle> =
            g.out_bundles("v1", &[]).map(|r| r.expect("bundle")).collect();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].bundle.len(), 2);
    }

    #[test]
    fn candidate_pushdown() {
        let (_db, g) = person_graph();
        let within = vec![Value::Int(35)];
        let gids: Vec<String> = g
            .has_candidates("age", &within)
            .expect("mem backend always answers")
            .map(|r| r.expect("gid"))
            .collect();
        assert_eq!(gids, ["v1"]);
    }

    #[test]
    fn graph_db_resolution() {
        let (db, _g) = person_graph();
        assert_eq!(db.list_graphs(), ["people"]);
        assert!(db.graph("people").is_ok());
        assert!(matches!(db.graph("other"), Err(GraphError::GraphNotFound(_))));
        assert!(db.add_graph("People").is_err());
        assert!(db.add_graph("people").is_err());
    }

    #[test]
    fn edits_touch_the_timestamp() {
        let (db, g) = person_graph();
        let before = db.timestamp().get("people").expect("tick");
        g.add_vertex(Vertex::new("v9", "Person"));
        assert!(db.timestamp().get("people").expect("tick") > before);
    }
}
