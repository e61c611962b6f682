//! The `limit(n)` processor.

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::Traveler;

/// Passes through the first `n` travelers, then closes upstream so backend
/// streams are released before the caller finishes consuming.
///
/// `limit(0)` closes the upstream as soon as it is opened.
pub struct LimitOp {
    base: ProcessorBase,
    limit: u64,
    returned: u64,
    input: BoxedProcessor,
    upstream_closed: bool,
}

impl LimitOp {
    /// Creates a limit processor.
    #[must_use]
    pub fn new(limit: u64, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), limit, returned: 0, input, upstream_closed: false }
    }

    fn close_upstream(&mut self) -> QueryResult<()> {
        if !self.upstream_closed {
            self.input.close()?;
            self.upstream_closed = true;
        }
        Ok(())
    }
}

impl Processor for LimitOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.returned = 0;
        self.upstream_closed = false;
        if self.limit == 0 {
            self.close_upstream()?;
        }
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        if self.returned >= self.limit {
            self.close_upstream()?;
            self.base.set_drained();
            return Ok(None);
        }
        match self.input.next()? {
            Some(t) => {
                self.returned += 1;
                self.base.inc_emitted();
                if self.returned >= self.limit {
                    self.close_upstream()?;
                }
                Ok(Some(t))
            }
            None => {
                self.base.set_drained();
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.base.state().is_closed() {
            return Ok(());
        }
        self.close_upstream()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Limit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::processor::testing::InjectOp;
    use crate::exec::testing::test_ctx;
    use crate::exec::traveler::Item;
    use arachne_core::Value;

    fn numbers(n: i64) -> Vec<Traveler> {
        (0..n).map(|i| Traveler::new(Item::value(Value::Int(i)))).collect()
    }

    #[test]
    fn passes_first_n() {
        let ctx = test_ctx();
        let mut op = LimitOp::new(2, InjectOp::boxed(numbers(5)));
        op.open(&ctx).expect("open");
        assert!(op.next().expect("next").is_some());
        assert!(op.next().expect("next").is_some());
        assert!(op.next().expect("next").is_none());
        assert!(op.state().is_drained());
        op.close().expect("close");
    }

    #[test]
    fn limit_zero_closes_upstream_at_open() {
        let ctx = test_ctx();
        let mut op = LimitOp::new(0, InjectOp::boxed(numbers(5)));
        op.open(&ctx).expect("open");
        assert!(op.next().expect("next").is_none());
        op.close().expect("close");
    }

    #[test]
    fn short_input_drains_normally() {
        let ctx = test_ctx();
        let mut op = LimitOp::new(10, InjectOp::boxed(numbers(3)));
        op.open(&ctx).expect("open");
        let mut count = 0;
        while op.next().expect("next").is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        op.close().expect("close");
    }
}
