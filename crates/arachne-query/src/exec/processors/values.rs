//! Projection: `values` and `vertexFromValues`.

use std::collections::HashMap;
use std::sync::Arc;

use arachne_core::Value;
use arachne_graph::GraphInterface;

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};

/// The `values(fields)` statement: projects fields of the current element
/// into a value record.
///
/// Fields resolve through the shared path resolver, so `"gid"` and
/// `"label"` address the element itself; missing fields project as null.
/// Inputs with no projectable data (rows, scalar values) are dropped.
pub struct ValuesOp {
    base: ProcessorBase,
    fields: Vec<String>,
    input: BoxedProcessor,
}

impl ValuesOp {
    /// Creates a projection processor.
    #[must_use]
    pub fn new(fields: Vec<String>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), fields, input }
    }

    fn project(&self, t: &Traveler) -> Option<Traveler> {
        let projectable = matches!(
            t.current(),
            Item::Vertex(_) | Item::Edge(_) | Item::Bundle(_)
        ) || matches!(t.current(), Item::Value(v) if v.as_map().is_some());
        if !projectable {
            return None;
        }
        let mut record = HashMap::with_capacity(self.fields.len());
        for field in &self.fields {
            record.insert(field.clone(), t.current().field(field));
        }
        Some(t.with_current(Item::value(Value::Map(record))))
    }
}

impl Processor for ValuesOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => {
                    if let Some(projected) = self.project(&t) {
                        self.base.inc_emitted();
                        return Ok(Some(projected));
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
        "Values"
    }
}

/// The `vertexFromValues` statement: lifts a value record back into a
/// vertex by looking up its `gid` field.
///
/// Records without a string `gid`, and gids the backend cannot resolve, are
/// silently filtered.
pub struct VertexFromValuesOp {
    base: ProcessorBase,
    input: BoxedProcessor,
    graph: Option<Arc<dyn GraphInterface>>,
}

impl VertexFromValuesOp {
    /// Creates a lookup processor.
    #[must_use]
    pub fn new(input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), input, graph: None }
    }
}

impl Processor for VertexFromValuesOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.graph = Some(ctx.graph());
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            let t = match self.input.next()? {
                Some(t) => t,
                None => {
                    self.base.set_drained();
                    return Ok(None);
                }
            };
            let Some(graph) = self.graph.as_ref() else {
                self.base.set_drained();
                return Ok(None);
            };
            let gid = match t.current() {
                Item::Value(v) => v
                    .as_map()
                    .and_then(|m| m.get("gid"))
                    .and_then(Value::as_str)
                    .map(ToString::to_string),
                _ => None,
            };
            if let Some(gid) = gid {
                if let Some(vertex) = graph.get_vertex(&gid)? {
                    self.base.inc_emitted();
                    return Ok(Some(t.with_current(Item::vertex(vertex))));
                }
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.base.state().is_closed() {
            return Ok(());
        }
        self.graph = None;
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "VertexFromValues"
    }
}
