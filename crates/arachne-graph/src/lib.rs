//! Arachne Graph
//!
//! This crate defines the contract between the traversal engine and any
//! storage backend, plus the pieces every backend shares:
//!
//! - [`interface`] - the read-only [`GraphInterface`] capability set and the
//!   multi-graph [`GraphDB`] handle
//! - [`timestamp`] - the per-graph last-modification tick
//! - [`mem`] - an in-memory reference backend with deterministic iteration
//!   order, used by the engine test suite
//!
//! Production backends live in their own crates and implement the traits
//! defined here.

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod interface;
pub mod mem;
pub mod timestamp;

pub use error::{GraphError, GraphResult};
pub use interface::{
    BundleStream, EdgeStream, GidStream, GraphDB, GraphInterface, VertexStream,
};
pub use mem::{MemGraph, MemGraphDB};
pub use timestamp::Timestamp;
