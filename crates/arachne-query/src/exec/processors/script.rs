//! Expression-driven processors: `map`, `filter`, and `filterValues`.
//!
//! A runtime evaluation failure drops the offending traveler and the stream
//! continues; only compile-time rejection aborts a pipeline.

use std::sync::Arc;

use tracing::warn;

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};
use crate::expr::Program;

/// The `map(source)` statement: rebinds the current item to the expression
/// result.
pub struct MapOp {
    base: ProcessorBase,
    program: Arc<dyn Program>,
    input: BoxedProcessor,
}

impl MapOp {
    /// Creates a map processor.
    #[must_use]
    pub fn new(program: Arc<dyn Program>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), program, input }
    }
}

impl Processor for MapOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => match self.program.evaluate(&t.scope()) {
                    Ok(value) => {
                        self.base.inc_emitted();
                        return Ok(Some(t.with_current(Item::value(value))));
                    }
                    Err(e) => warn!(error = %e, "map expression failed; traveler dropped"),
                },
                None => {
                    self.base.set_drained();
                    return Ok(None);
                }
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.base.state().is_closed() {
            return Ok(());
        }
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Map"
    }
}

/// The `filter(source)` statement: retains travelers for which the
/// expression is truthy.
pub struct FilterOp {
    base: ProcessorBase,
    program: Arc<dyn Program>,
    input: BoxedProcessor,
    /// When set, only value travelers are considered (`filterValues`); all
    /// other kinds are dropped without evaluation.
    values_only: bool,
}

impl FilterOp {
    /// Creates a `filter` processor.
    #[must_use]
    pub fn new(program: Arc<dyn Program>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), program, input, values_only: false }
    }

    /// Creates a `filterValues` processor.
    #[must_use]
    pub fn values_only(program: Arc<dyn Program>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), program, input, values_only: true }
    }
}

impl Processor for FilterOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => {
                    if self.values_only && !matches!(t.current(), Item::Value(_)) {
                        continue;
                    }
                    match self.program.evaluate(&t.scope()) {
                        Ok(value) => {
                            if value.is_truthy() {
                                self.base.inc_emitted();
                                return Ok(Some(t));
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "filter expression failed; traveler dropped");
                        }
                    }
                }
                None => {
                    self.base.set_drained();
                    return Ok(None);
                }
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.base.state().is_closed() {
            return Ok(());
        }
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        if self.values_only {
            "FilterValues"
        } else {
            "Filter"
        }
    }
}
