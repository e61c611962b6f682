//! The streaming execution runtime.
//!
//! A compiled pipeline is a linear chain of [`Processor`]s, each owning its
//! upstream. Execution is demand-driven: the caller pulls one result row at
//! a time from the [`TraversalStream`], each processor pulls from its
//! upstream only when asked to emit, and backend streams are consumed
//! lazily. Dropping the stream, or cancelling via its token, closes every
//! processor and backend stream promptly.

pub mod context;
pub mod pipeline;
pub mod processor;
pub mod processors;
pub mod result;
pub mod traveler;

pub use context::{CancelToken, ExecContext, ExecStats};
pub use pipeline::{Pipeline, TraversalStream};
pub use processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
pub use result::{ElementValue, ResultRow};
pub use traveler::{Item, Marks, Traveler};
