//! The `match(sub-queries)` processor.
//!
//! For each input traveler, every compiled sub-pipeline runs with that
//! traveler as its synthetic seed. The input is emitted once iff every
//! sub-pipeline yields at least one result; marks discovered by each
//! sub-pipeline's first result merge into the output, in sub-query list
//! order, last writer wins. Sub-pipelines are owned by this processor and
//! torn down with it.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::Traveler;

/// The shared slot a [`SeedOp`] reads its traveler from.
pub type SeedSlot = Arc<Mutex<Option<Traveler>>>;

/// The synthetic source at the bottom of a match sub-pipeline.
///
/// Emits the slotted traveler exactly once per open; the match processor
/// fills the slot and re-opens the sub-pipeline for every input.
pub struct SeedOp {
    base: ProcessorBase,
    slot: SeedSlot,
    emitted: bool,
}

impl SeedOp {
    /// Creates a seed source over a shared slot.
    #[must_use]
    pub fn new(slot: SeedSlot) -> Self {
        Self { base: ProcessorBase::new(), slot, emitted: false }
    }
}

impl Processor for SeedOp {
    fn open(&mut self, _ctx: &ExecContext) -> QueryResult<()> {
        self.emitted = false;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        if self.emitted {
            self.base.set_drained();
            return Ok(None);
        }
        self.emitted = true;
        match self.slot.lock().clone() {
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
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Seed"
    }
}

/// One compiled sub-pipeline plus the seed slot feeding it.
pub struct SubPipeline {
    slot: SeedSlot,
    root: BoxedProcessor,
}

impl SubPipeline {
    /// Pairs a compiled sub-pipeline with its seed slot.
    #[must_use]
    pub fn new(slot: SeedSlot, root: BoxedProcessor) -> Self {
        Self { slot, root }
    }

    /// Runs the sub-pipeline for one seed, returning its first result.
    fn first_result(&mut self, ctx: &ExecContext, seed: &Traveler) -> QueryResult<Option<Traveler>> {
        *self.slot.lock() = Some(seed.clone());
        self.root.open(ctx)?;
        let first = self.root.next()?;
        self.root.close()?;
        *self.slot.lock() = None;
        Ok(first)
    }
}

/// The conjunctive sub-query combinator.
pub struct MatchOp {
    base: ProcessorBase,
    subs: Vec<SubPipeline>,
    input: BoxedProcessor,
    ctx: Option<ExecContext>,
}

impl MatchOp {
    /// Creates a match processor owning its sub-pipelines.
    #[must_use]
    pub fn new(subs: Vec<SubPipeline>, input: BoxedProcessor) -> Self {
        Self { base: ProcessorBase::new(), subs, input, ctx: None }
    }
}

impl Processor for MatchOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.ctx = Some(ctx.clone());
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        'inputs: loop {
            let t = match self.input.next()? {
                Some(t) => t,
                None => {
                    self.base.set_drained();
                    return Ok(None);
                }
            };
            let Some(ctx) = self.ctx.clone() else {
                self.base.set_drained();
                return Ok(None);
            };

            let mut merged = t.marks().clone();
            for sub in &mut self.subs {
                match sub.first_result(&ctx, &t)? {
                    Some(result) => {
                        for (name, item) in result.marks().added_since(t.marks()) {
                            merged = merged.set(&name, item);
                        }
                    }
                    // One empty sub-query refutes the conjunction.
                    None => continue 'inputs,
                }
            }

            self.base.inc_emitted();
            return Ok(Some(t.with_marks(merged)));
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        if self.base.state().is_closed() {
            return Ok(());
        }
        for sub in &mut self.subs {
            sub.root.close()?;
            *sub.slot.lock() = None;
        }
        self.ctx = None;
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Match"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::processor::testing::InjectOp;
    use crate::exec::processors::expand::{Direction, ExpandKind, ExpandOp};
    use crate::exec::processors::has::HasLabelOp;
    use crate::exec::processors::mark::MarkOp;
    use crate::exec::testing::person_ctx;
    use crate::exec::traveler::Item;

    fn seeded_sub(build: impl FnOnce(BoxedProcessor) -> BoxedProcessor) -> SubPipeline {
        let slot: SeedSlot = Arc::new(Mutex::new(None));
        let seed = Box::new(SeedOp::new(Arc::clone(&slot)));
        SubPipeline::new(slot, build(seed))
    }

    fn v1_input(ctx: &ExecContext) -> BoxedProcessor {
        let v = ctx.graph().get_vertex("v1").expect("get").expect("exists");
        InjectOp::boxed(vec![Traveler::new(Item::vertex(v))])
    }

    #[test]
    fn emits_input_when_all_subs_match() {
        let ctx = person_ctx();
        let subs = vec![
            seeded_sub(|seed| {
                Box::new(ExpandOp::new(
                    Direction::Out,
                    ExpandKind::AdjacentVertex,
                    vec!["knows".to_string()],
                    seed,
                ))
            }),
            seeded_sub(|seed| Box::new(HasLabelOp::new(vec!["Person".to_string()], seed))),
        ];
        let mut op = MatchOp::new(subs, v1_input(&ctx));
        op.open(&ctx).expect("open");
        let t = op.next().expect("next").expect("traveler");
        assert_eq!(t.current().gid(), Some("v1"));
        assert!(op.next().expect("next").is_none());
        op.close().expect("close");
    }

    #[test]
    fn drops_input_when_any_sub_is_empty() {
        let ctx = person_ctx();
        let subs = vec![
            seeded_sub(|seed| Box::new(HasLabelOp::new(vec!["Person".to_string()], seed))),
            seeded_sub(|seed| Box::new(HasLabelOp::new(vec!["Robot".to_string()], seed))),
        ];
        let mut op = MatchOp::new(subs, v1_input(&ctx));
        op.open(&ctx).expect("open");
        assert!(op.next().expect("next").is_none());
        op.close().expect("close");
    }

    #[test]
    fn marks_from_subs_propagate() {
        let ctx = person_ctx();
        let subs = vec![seeded_sub(|seed| {
            let expand = ExpandOp::new(
                Direction::Out,
                ExpandKind::AdjacentVertex,
                vec![],
                seed,
            );
            Box::new(MarkOp::new("friend".to_string(), Box::new(expand)))
        })];
        let mut op = MatchOp::new(subs, v1_input(&ctx));
        op.open(&ctx).expect("open");
        let t = op.next().expect("next").expect("traveler");
        assert_eq!(t.current().gid(), Some("v1"));
        assert_eq!(t.marks().get("friend").and_then(Item::gid), Some("v2"));
        op.close().expect("close");
    }
}
