//! The pipeline driver.
//!
//! [`Pipeline`] owns the compiled processor chain; [`run`](Pipeline::run)
//! turns it into a [`TraversalStream`], the lazy iterator of result rows
//! handed to the caller.

use tracing::debug;

use crate::error::{QueryError, QueryResult};

use super::context::{CancelToken, ExecContext};
use super::processor::BoxedProcessor;
use super::result::ResultRow;

/// A compiled, not-yet-running traversal.
pub struct Pipeline {
    root: BoxedProcessor,
    ctx: ExecContext,
}

impl Pipeline {
    /// Pairs a compiled processor chain with its execution context.
    #[must_use]
    pub fn new(root: BoxedProcessor, ctx: ExecContext) -> Self {
        Self { root, ctx }
    }

    /// Returns a cancellation handle usable while the stream runs.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.ctx.cancel_token()
    }

    /// Starts execution, returning the lazy result stream.
    #[must_use]
    pub fn run(self) -> TraversalStream {
        debug!(processor = self.root.name(), "starting traversal pipeline");
        TraversalStream { root: self.root, ctx: self.ctx, opened: false, finished: false }
    }
}

/// The lazy sequence of result rows.
///
/// Pulls one row per `next()` call, which drives the whole processor chain
/// on demand. The stream ends quietly on exhaustion or cancellation, and
/// with a single `Err` item on the first backend failure. Dropping the
/// stream closes every processor and backend sequence.
pub struct TraversalStream {
    root: BoxedProcessor,
    ctx: ExecContext,
    opened: bool,
    finished: bool,
}

impl TraversalStream {
    /// Returns a cancellation handle for this stream.
    #[must_use]
    pub fn cancel_token(&self) -> CancelToken {
        self.ctx.cancel_token()
    }

    /// Returns the execution context.
    #[must_use]
    pub fn context(&self) -> &ExecContext {
        &self.ctx
    }

    fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        if self.opened {
            if let Err(e) = self.root.close() {
                debug!(error = %e, "error while closing pipeline");
            }
        }
    }
}

impl Iterator for TraversalStream {
    type Item = QueryResult<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if self.ctx.is_canceled() {
            self.finish();
            return None;
        }
        if !self.opened {
            if let Err(e) = self.root.open(&self.ctx) {
                self.finished = true;
                return Some(Err(e));
            }
            self.opened = true;
        }
        match self.root.next() {
            Ok(Some(t)) => {
                self.ctx.stats().record_row();
                Some(Ok(ResultRow::from(t.current())))
            }
            Ok(None) => {
                self.finish();
                None
            }
            Err(e) => {
                self.finish();
                Some(Err(e))
            }
        }
    }
}

impl Drop for TraversalStream {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Collects a stream, failing on the first error item.
///
/// Convenience for embedders and tests; streaming callers iterate instead.
pub fn collect_rows(stream: TraversalStream) -> QueryResult<Vec<ResultRow>> {
    stream.collect::<Result<Vec<_>, QueryError>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::processor::testing::InjectOp;
    use crate::exec::testing::{person_ctx, test_ctx};
    use crate::exec::traveler::{Item, Traveler};
    use arachne_core::Value;

    fn number_stream(ctx: &ExecContext, n: i64) -> TraversalStream {
        let travelers: Vec<Traveler> =
            (0..n).map(|i| Traveler::new(Item::value(Value::Int(i)))).collect();
        Pipeline::new(InjectOp::boxed(travelers), ctx.clone()).run()
    }

    #[test]
    fn streams_rows_in_order() {
        let ctx = test_ctx();
        let rows = collect_rows(number_stream(&ctx, 3)).expect("rows");
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0].as_value().and_then(crate::exec::ElementValue::as_value),
            Some(&Value::Int(0))
        );
        assert_eq!(ctx.stats().rows_emitted(), 3);
    }

    #[test]
    fn cancellation_ends_the_stream_quietly() {
        let ctx = person_ctx();
        let mut stream = number_stream(&ctx, 100);
        let token = stream.cancel_token();

        assert!(stream.next().is_some());
        token.cancel();
        assert!(stream.next().is_none());
        assert!(stream.next().is_none());
    }
}
