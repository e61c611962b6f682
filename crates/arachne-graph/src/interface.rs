//! The storage contract consumed by the traversal engine.
//!
//! This module defines [`GraphInterface`], the narrow read-only capability
//! set any backend exposes, and [`GraphDB`], the multi-graph handle that
//! resolves graph names to interfaces. The traits are object-safe so the
//! engine can hold them behind `Arc<dyn _>`.

use std::sync::Arc;

use arachne_core::{Bundle, Edge, Value, Vertex};

use crate::error::GraphResult;

/// A lazy, cancelable sequence of vertices.
///
/// Backend failures surface as an `Err` item that terminates the sequence;
/// dropping the stream cancels it.
pub type VertexStream = Box<dyn Iterator<Item = GraphResult<Vertex>> + Send>;

/// A lazy, cancelable sequence of edges.
pub type EdgeStream = Box<dyn Iterator<Item = GraphResult<Edge>> + Send>;

/// A lazy, cancelable sequence of bundles.
pub type BundleStream = Box<dyn Iterator<Item = GraphResult<Bundle>> + Send>;

/// A lazy, cancelable sequence of vertex gids.
pub type GidStream = Box<dyn Iterator<Item = GraphResult<String>> + Send>;

/// Read-only access to a single graph.
///
/// The traversal engine treats a backend purely as this capability set; it
/// never mutates through it. Implementations must be safe for concurrent
/// read access, as many queries execute against one graph in parallel.
///
/// Everywhere a `labels` slice appears, an empty slice means "no label
/// filter".
pub trait GraphInterface: Send + Sync {
    /// Looks up a vertex by gid.
    fn get_vertex(&self, gid: &str) -> GraphResult<Option<Vertex>>;

    /// Looks up an edge by gid.
    fn get_edge(&self, gid: &str) -> GraphResult<Option<Edge>>;

    /// Streams all vertices, optionally filtered by label.
    fn list_vertices(&self, labels: &[String]) -> VertexStream;

    /// Streams all edges, optionally filtered by label.
    fn list_edges(&self, labels: &[String]) -> EdgeStream;

    /// Streams the edges leaving `from`.
    fn out_edges(&self, from: &str, labels: &[String]) -> EdgeStream;

    /// Streams the edges arriving at `to`.
    fn in_edges(&self, to: &str, labels: &[String]) -> EdgeStream;

    /// Streams the bundles leaving `from`.
    fn out_bundles(&self, from: &str, labels: &[String]) -> BundleStream;

    /// Returns gids of vertices whose `field` matches any value in `within`,
    /// if the backend can answer from an index.
    ///
    /// This is a pushdown hint: `None` means no usable index exists and the
    /// caller falls back to scan-and-filter. Implementations may
    /// over-approximate; callers re-check the predicate on fetched vertices.
    fn has_candidates(&self, field: &str, within: &[Value]) -> Option<GidStream>;
}

/// A handle over the set of graphs a backend manages.
pub trait GraphDB: Send + Sync {
    /// Resolves a graph name to its read interface.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::GraphNotFound`](crate::GraphError::GraphNotFound)
    /// for unknown names.
    fn graph(&self, name: &str) -> GraphResult<Arc<dyn GraphInterface>>;

    /// Lists the graphs managed by this backend, in deterministic order.
    fn list_graphs(&self) -> Vec<String>;
}
