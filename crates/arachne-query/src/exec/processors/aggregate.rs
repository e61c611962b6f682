//! Terminal aggregators: `count`, `groupCount`, `fold`, and `vertexFold`.
//!
//! Each drains its upstream completely, emits once (or once per group for
//! `vertexFold`), and closes. Travelers whose fold expression fails to
//! evaluate are dropped, never fatal.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use arachne_core::Value;

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};
use crate::expr::Program;

/// The `count(name)` aggregator.
///
/// Emits the stream length as a value traveler; a non-empty name also marks
/// the emitted value.
pub struct CountOp {
    base: ProcessorBase,
    mark_name: String,
    input: BoxedProcessor,
    result: Option<Traveler>,
    drained: bool,
}

impl CountOp {
    /// Creates a count aggregator.
    #[must_use]
    pub fn new(mark_name: String, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), mark_name, input, result: None, drained: false }
    }
}

impl Processor for CountOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.result = None;
        self.drained = false;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        if !self.drained {
            let mut count: i64 = 0;
            while self.input.next()?.is_some() {
                count += 1;
            }
            self.input.close()?;
            let mut out = Traveler::new(Item::value(Value::Int(count)));
            if !self.mark_name.is_empty() {
                out = out.with_mark(&self.mark_name);
            }
            self.result = Some(out);
            self.drained = true;
        }
        match self.result.take() {
            Some(t) => {
                self.base.inc_emitted();
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
        self.result = None;
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Count"
    }
}

/// The `groupCount(field)` aggregator.
///
/// Emits one value traveler holding a histogram map: field value (as a
/// scalar key) to occurrence count. Travelers whose field has no scalar key
/// are not counted.
pub struct GroupCountOp {
    base: ProcessorBase,
    field: String,
    input: BoxedProcessor,
    result: Option<Traveler>,
    drained: bool,
}

impl GroupCountOp {
    /// Creates a group-count aggregator.
    #[must_use]
    pub fn new(field: String, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), field, input, result: None, drained: false }
    }
}

impl Processor for GroupCountOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.result = None;
        self.drained = false;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        if !self.drained {
            let mut histogram: HashMap<String, Value> = HashMap::new();
            while let Some(t) = self.input.next()? {
                if let Some(key) = t.current().field(&self.field).as_key() {
                    let slot = histogram.entry(key).or_insert(Value::Int(0));
                    if let Value::Int(n) = slot {
                        *n += 1;
                    }
                }
            }
            self.input.close()?;
            self.result = Some(Traveler::new(Item::value(Value::Map(histogram))));
            self.drained = true;
        }
        match self.result.take() {
            Some(t) => {
                self.base.inc_emitted();
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
        self.result = None;
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "GroupCount"
    }
}

/// The `fold(source, init)` aggregator: a left-fold over the whole stream.
pub struct FoldOp {
    base: ProcessorBase,
    program: Arc<dyn Program>,
    init: Value,
    input: BoxedProcessor,
    result: Option<Traveler>,
    drained: bool,
}

impl FoldOp {
    /// Creates a fold aggregator.
    #[must_use]
    pub fn new(program: Arc<dyn Program>, init: Value, input: BoxedProcessor) -> Self {
        Self {
            base: ProcessorBase::new(),
            program,
            init,
            input,
            result: None,
            drained: false,
        }
    }
}

impl Processor for FoldOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.result = None;
        self.drained = false;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        if !self.drained {
            let mut acc = self.init.clone();
            while let Some(t) = self.input.next()? {
                match self.program.evaluate(&t.scope_with_acc(&acc)) {
                    Ok(next) => acc = next,
                    Err(e) => warn!(error = %e, "fold expression failed; traveler dropped"),
                }
            }
            self.input.close()?;
            self.result = Some(Traveler::new(Item::value(acc)));
            self.drained = true;
        }
        match self.result.take() {
            Some(t) => {
                self.base.inc_emitted();
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
        self.result = None;
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Fold"
    }
}

/// The `vertexFold(source, init)` aggregator.
///
/// Folds like [`FoldOp`], but keeps one accumulator per distinct source
/// vertex (the most recent vertex on each traveler's derivation chain) and
/// emits the accumulators in first-seen group order. Travelers with no
/// vertex ancestor are dropped.
pub struct VertexFoldOp {
    base: ProcessorBase,
    program: Arc<dyn Program>,
    init: Value,
    input: BoxedProcessor,
    results: Vec<Traveler>,
    next_result: usize,
    drained: bool,
}

impl VertexFoldOp {
    /// Creates a per-vertex fold aggregator.
    #[must_use]
    pub fn new(program: Arc<dyn Program>, init: Value, input: BoxedProcessor) -> Self {
        Self {
            base: ProcessorBase::new(),
            program,
            init,
            input,
            results: Vec::new(),
            next_result: 0,
            drained: false,
        }
    }
}

impl Processor for VertexFoldOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.results.clear();
        self.next_result = 0;
        self.drained = false;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        if !self.drained {
            let mut groups: HashMap<String, Value> = HashMap::new();
            let mut order: Vec<String> = Vec::new();
            while let Some(t) = self.input.next()? {
                let Some(gid) = t.last_vertex().map(ToString::to_string) else {
                    continue;
                };
                let acc = groups.entry(gid.clone()).or_insert_with(|| {
                    order.push(gid);
                    self.init.clone()
                });
                match self.program.evaluate(&t.scope_with_acc(acc)) {
                    Ok(next) => *acc = next,
                    Err(e) => {
                        warn!(error = %e, "vertexFold expression failed; traveler dropped");
                    }
                }
            }
            self.input.close()?;
            self.results = order
                .into_iter()
                .filter_map(|gid| groups.remove(&gid))
                .map(|acc| Traveler::new(Item::value(acc)))
                .collect();
            self.drained = true;
        }
        if self.next_result < self.results.len() {
            let t = self.results[self.next_result].clone();
            self.next_result += 1;
            self.base.inc_emitted();
            return Ok(Some(t));
        }
        self.base.set_drained();
        Ok(None)
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.base.state().is_closed() {
            return Ok(());
        }
        self.results.clear();
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "VertexFold"
    }
}
