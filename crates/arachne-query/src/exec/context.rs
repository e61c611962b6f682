//! Execution context shared by a pipeline's processors.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arachne_graph::GraphInterface;

/// A handle for cancelling a running traversal.
///
/// Clones share the flag, so the token can be handed to another thread
/// while the stream is being consumed. Cancellation is idempotent.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-canceled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    #[inline]
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Checks whether cancellation was requested.
    #[inline]
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

/// Counters collected while a pipeline runs.
#[derive(Debug)]
pub struct ExecStats {
    start: Instant,
    rows_emitted: AtomicU64,
}

impl ExecStats {
    fn new() -> Self {
        Self { start: Instant::now(), rows_emitted: AtomicU64::new(0) }
    }

    /// Counts an emitted result row.
    #[inline]
    pub fn record_row(&self) {
        self.rows_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of result rows emitted so far.
    #[inline]
    #[must_use]
    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted.load(Ordering::Relaxed)
    }

    /// Returns the elapsed time since the context was created.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}

/// Per-query execution context.
///
/// Cheap to clone: the graph handle, cancellation flag, and statistics are
/// shared. Every piece of per-query mutable state lives in the processor
/// instances instead, so contexts carry no query results.
#[derive(Clone)]
pub struct ExecContext {
    graph: Arc<dyn GraphInterface>,
    token: CancelToken,
    stats: Arc<ExecStats>,
}

impl ExecContext {
    /// Creates a context over a graph.
    #[must_use]
    pub fn new(graph: Arc<dyn GraphInterface>) -> Self {
        Self { graph, token: CancelToken::new(), stats: Arc::new(ExecStats::new()) }
    }

    /// Returns the graph handle.
    #[inline]
    #[must_use]
    pub fn graph(&self) -> Arc<dyn GraphInterface> {
        Arc::clone(&self.graph)
    }

    /// Returns a cancellation handle for this query.
    #[inline]
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Checks whether this query was canceled.
    #[inline]
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }

    /// Returns the execution statistics.
    #[inline]
    #[must_use]
    pub fn stats(&self) -> &ExecStats {
        &self.stats
    }
}

impl std::fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("graph", &"<GraphInterface>")
            .field("canceled", &self.token.is_canceled())
            .field("stats", &self.stats)
            .finish()
    }
}
