//! Arachne Query
//!
//! This crate implements the traversal query engine for Arachne: a
//! Gremlin-inspired statement list is compiled into a pipeline of streaming
//! processors and executed against any backend implementing the
//! `arachne-graph` contract.
//!
//! # Modules
//!
//! - [`ast`] - the traversal statement model and fluent builder
//! - [`expr`] - the embedded expression language and evaluator contract
//! - [`compile`] - lowering of statement lists into processor pipelines
//! - [`exec`] - the streaming runtime: travelers, processors, result rows
//! - [`error`] - error types for compilation and execution
//!
//! # Quick Start
//!
//! ```
//! use arachne_core::{Edge, Vertex};
//! use arachne_graph::MemGraphDB;
//! use arachne_query::{ast::Query, traversal};
//!
//! let db = MemGraphDB::new();
//! let g = db.add_graph("people").unwrap();
//! g.add_vertex(Vertex::new("v1", "Person").with_property("name", "Bob"));
//! g.add_vertex(Vertex::new("v2", "Person").with_property("name", "Jack"));
//! g.add_edge(Edge::new("e1", "knows", "v1", "v2"));
//!
//! let query = Query::new().v(["v1"]).out(["knows"]).values(["name"]).on("people");
//! let rows: Vec<_> = traversal(&db, &query).unwrap().collect();
//! assert_eq!(rows.len(), 1);
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod ast;
pub mod compile;
pub mod error;
pub mod exec;
pub mod expr;

pub use ast::{GraphQuery, GraphStatement, Query};
pub use error::{QueryError, QueryResult};
pub use exec::{
    CancelToken, ElementValue, ExecContext, Pipeline, ResultRow, TraversalStream,
};

use arachne_graph::GraphDB;

/// Compiles and starts a traversal: the engine-facing RPC.
///
/// Validates the graph name, resolves the graph, compiles the statement
/// list, and returns the lazy result stream. Every compile-time failure
/// surfaces here, before any output; runtime failures arrive as stream
/// items.
///
/// # Errors
///
/// [`QueryError::InvalidArgument`] for a malformed graph name;
/// [`QueryError::Backend`] when the graph cannot be resolved;
/// [`QueryError::InvalidPipeline`], [`QueryError::UnknownLabel`], and
/// [`QueryError::Compile`] from compilation.
pub fn traversal(db: &dyn GraphDB, query: &GraphQuery) -> QueryResult<TraversalStream> {
    arachne_core::validate_graph_name(&query.graph)
        .map_err(|e| QueryError::InvalidArgument(e.to_string()))?;
    let graph = db.graph(&query.graph)?;
    let root = compile::compile(&query.query)?;
    Ok(Pipeline::new(root, ExecContext::new(graph)).run())
}

/// Like [`traversal`], with a caller-supplied expression evaluator.
///
/// # Errors
///
/// As [`traversal`].
pub fn traversal_with(
    db: &dyn GraphDB,
    query: &GraphQuery,
    evaluator: &dyn expr::Evaluator,
) -> QueryResult<TraversalStream> {
    arachne_core::validate_graph_name(&query.graph)
        .map_err(|e| QueryError::InvalidArgument(e.to_string()))?;
    let graph = db.graph(&query.graph)?;
    let root = compile::compile_with(&query.query, evaluator)?;
    Ok(Pipeline::new(root, ExecContext::new(graph)).run())
}
