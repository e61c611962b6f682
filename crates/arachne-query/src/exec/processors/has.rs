//! Retention filters: `has`, `hasLabel`, `hasId`.
//!
//! The predicate helpers are shared with the source processors, which
//! re-apply fused filters after an index-narrowed scan.

use arachne_core::Value;

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};

/// Returns true if the item's `key` field matches any accepted value.
pub(crate) fn matches_has(item: &Item, key: &str, within: &[Value]) -> bool {
    let resolved = item.field(key);
    within.iter().any(|w| resolved.loose_eq(w))
}

/// Returns true if the item carries one of the labels.
pub(crate) fn matches_labels(item: &Item, labels: &[String]) -> bool {
    item.label().is_some_and(|l| labels.iter().any(|candidate| candidate == l))
}

/// Returns true if the item has one of the gids.
pub(crate) fn matches_ids(item: &Item, ids: &[String]) -> bool {
    item.gid().is_some_and(|g| ids.iter().any(|candidate| candidate == g))
}

/// The `has(key, within)` filter.
pub struct HasOp {
    base: ProcessorBase,
    key: String,
    within: Vec<Value>,
    input: BoxedProcessor,
}

impl HasOp {
    /// Creates a new `has` filter.
    #[must_use]
    pub fn new(key: String, within: Vec<Value>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), key, within, input }
    }
}

impl Processor for HasOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => {
                    if matches_has(t.current(), &self.key, &self.within) {
                        self.base.inc_emitted();
                        return Ok(Some(t));
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
        "Has"
    }
}

/// The `hasLabel(labels)` filter.
pub struct HasLabelOp {
    base: ProcessorBase,
    labels: Vec<String>,
    input: BoxedProcessor,
}

impl HasLabelOp {
    /// Creates a new `hasLabel` filter.
    #[must_use]
    pub fn new(labels: Vec<String>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), labels, input }
    }
}

impl Processor for HasLabelOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => {
                    if matches_labels(t.current(), &self.labels) {
                        self.base.inc_emitted();
                        return Ok(Some(t));
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
        "HasLabel"
    }
}

/// The `hasId(ids)` filter.
pub struct HasIdOp {
    base: ProcessorBase,
    ids: Vec<String>,
    input: BoxedProcessor,
}

impl HasIdOp {
    /// Creates a new `hasId` filter.
    #[must_use]
    pub fn new(ids: Vec<String>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), ids, input }
    }
}

impl Processor for HasIdOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            match self.input.next()? {
                Some(t) => {
                    if matches_ids(t.current(), &self.ids) {
                        self.base.inc_emitted();
                        return Ok(Some(t));
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
        "HasId"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::processor::testing::InjectOp;
    use crate::exec::testing::test_ctx;
    use arachne_core::Vertex;

    fn people() -> Vec<Traveler> {
        vec![
            Traveler::new(Item::vertex(Vertex::new("v1", "Person").with_property("age", 35i64))),
            Traveler::new(Item::vertex(Vertex::new("v2", "Person").with_property("age", 50i64))),
            Traveler::new(Item::vertex(Vertex::new("v3", "Robot"))),
        ]
    }

    #[test]
    fn has_filters_on_field() {
        let mut op =
            HasOp::new("age".to_string(), vec![Value::Int(35)], InjectOp::boxed(people()));
        let ctx = test_ctx();
        op.open(&ctx).expect("open");

        let t = op.next().expect("next").expect("traveler");
        assert_eq!(t.current().gid(), Some("v1"));
        assert!(op.next().expect("next").is_none());
        assert!(op.state().is_drained());
        op.close().expect("close");
    }

    #[test]
    fn has_label_filters() {
        let mut op = HasLabelOp::new(vec!["Robot".to_string()], InjectOp::boxed(people()));
        let ctx = test_ctx();
        op.open(&ctx).expect("open");

        let t = op.next().expect("next").expect("traveler");
        assert_eq!(t.current().gid(), Some("v3"));
        assert!(op.next().expect("next").is_none());
        op.close().expect("close");
    }

    #[test]
    fn has_id_filters() {
        let mut op = HasIdOp::new(vec!["v2".to_string()], InjectOp::boxed(people()));
        let ctx = test_ctx();
        op.open(&ctx).expect("open");

        let t = op.next().expect("next").expect("traveler");
        assert_eq!(t.current().gid(), Some("v2"));
        assert!(op.next().expect("next").is_none());
        op.close().expect("close");
    }

    #[test]
    fn non_elements_are_dropped_by_label_filter() {
        let values = vec![Traveler::new(Item::value(Value::Int(1)))];
        let mut op = HasLabelOp::new(vec!["Person".to_string()], InjectOp::boxed(values));
        let ctx = test_ctx();
        op.open(&ctx).expect("open");
        assert!(op.next().expect("next").is_none());
        op.close().expect("close");
    }
}
