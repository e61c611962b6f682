//! Path labeling: `as` and `select`.

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};

/// The `as(name)` statement: records the current item in the mark table.
///
/// Emits exactly one output per input.
pub struct MarkOp {
    base: ProcessorBase,
    name: String,
    input: BoxedProcessor,
}

impl MarkOp {
    /// Creates a mark processor.
    #[must_use]
    pub fn new(name: String, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), name, input }
    }
}

impl Processor for MarkOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        match self.input.next()? {
            Some(t) => {
                self.base.inc_emitted();
                Ok(Some(t.with_mark(&self.name)))
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
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Mark"
    }
}

/// The `select(labels)` statement.
///
/// With one label, rebinds the current item to the marked one; with many,
/// emits a row of the marked items in the order given. Inputs missing any
/// requested mark are dropped.
pub struct SelectOp {
    base: ProcessorBase,
    labels: Vec<String>,
    input: BoxedProcessor,
}

impl SelectOp {
    /// Creates a select processor.
    #[must_use]
    pub fn new(labels: Vec<String>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), labels, input }
    }

    fn select(&self, t: &Traveler) -> Option<Traveler> {
        if self.labels.len() == 1 {
            let item = t.marks().get(&self.labels[0])?.clone();
            return Some(t.with_current(item));
        }
        let mut row = Vec::with_capacity(self.labels.len());
        for label in &self.labels {
            row.push(t.marks().get(label)?.clone());
        }
        Some(t.with_current(Item::Row(row)))
    }
}

impl Processor for SelectOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => {
                    if let Some(selected) = self.select(&t) {
                        self.base.inc_emitted();
                        return Ok(Some(selected));
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
        "Select"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::processor::testing::InjectOp;
    use crate::exec::testing::test_ctx;
    use arachne_core::Vertex;

    fn vertex(gid: &str) -> Traveler {
        Traveler::new(Item::vertex(Vertex::new(gid, "Person")))
    }

    #[test]
    fn mark_then_single_select_is_identity_on_current() {
        let ctx = test_ctx();
        let mark = MarkOp::new("a".to_string(), InjectOp::boxed(vec![vertex("v1")]));
        let mut select = SelectOp::new(vec!["a".to_string()], Box::new(mark));

        select.open(&ctx).expect("open");
        let t = select.next().expect("next").expect("traveler");
        assert_eq!(t.current().gid(), Some("v1"));
        assert!(select.next().expect("next").is_none());
        select.close().expect("close");
    }

    #[test]
    fn multi_select_emits_rows_in_label_order() {
        let ctx = test_ctx();
        let input = vertex("v1").with_mark("a").with_current(Item::vertex(Vertex::new(
            "v2", "Person",
        )));
        let marked = input.with_mark("b");
        let mut select =
            SelectOp::new(vec!["b".to_string(), "a".to_string()], InjectOp::boxed(vec![marked]));

        select.open(&ctx).expect("open");
        let t = select.next().expect("next").expect("traveler");
        match t.current() {
            Item::Row(row) => {
                assert_eq!(row[0].gid(), Some("v2"));
                assert_eq!(row[1].gid(), Some("v1"));
            }
            other => panic!("expected a row, got {other:?}"),
        }
        select.close().expect("close");
    }

    #[test]
    fn missing_marks_drop_the_input() {
        let ctx = test_ctx();
        let mut select = SelectOp::new(vec!["a".to_string()], InjectOp::boxed(vec![vertex("v1")]));
        select.open(&ctx).expect("open");
        assert!(select.next().expect("next").is_none());
        select.close().expect("close");
    }

    #[test]
    fn remarking_overwrites() {
        let ctx = test_ctx();
        let t = vertex("v1")
            .with_mark("a")
            .with_current(Item::vertex(Vertex::new("v2", "Person")))
            .with_mark("a");
        let mut select = SelectOp::new(vec!["a".to_string()], InjectOp::boxed(vec![t]));
        select.open(&ctx).expect("open");
        let out = select.next().expect("next").expect("traveler");
        assert_eq!(out.current().gid(), Some("v2"));
        select.close().expect("close");
    }
}
