//! Processor trait and base types.
//!
//! This module defines the [`Processor`] trait that every pipeline stage
//! implements.

use crate::error::QueryResult;

use super::context::ExecContext;
use super::traveler::Traveler;

/// The state of a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// Constructed but not yet opened.
    Fresh,
    /// Opened and able to emit travelers.
    Running,
    /// Upstream exhausted; no further travelers will be emitted.
    Drained,
    /// Closed; resources released. No transitions leave this state.
    Closed,
}

impl ProcessorState {
    /// Returns true if the processor is running.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns true if the processor has drained its upstream.
    #[must_use]
    pub const fn is_drained(self) -> bool {
        matches!(self, Self::Drained)
    }

    /// Returns true if the processor is closed.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// A pipeline stage transforming a stream of travelers.
///
/// Processors form a linear chain matching the compiled pipeline: each owns
/// its upstream, and data is pulled demand-driven from the last stage.
/// Every stage has input arity 1 and output arity 1.
///
/// # Lifecycle
///
/// 1. **Fresh**: after construction
/// 2. **Running**: after `open()`; may emit travelers
/// 3. **Drained**: `next()` returned `None`
/// 4. **Closed**: after `close()`; terminal
///
/// `open()` after `close()` restarts the stage from scratch; the match
/// processor relies on this to re-run its sub-pipelines per input.
/// `close()` must be idempotent.
pub trait Processor: Send {
    /// Opens the processor (and its upstream) and resets per-run state.
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()>;

    /// Emits the next traveler, or `None` once drained.
    fn next(&mut self) -> QueryResult<Option<Traveler>>;

    /// Closes the processor and its upstream, releasing backend streams.
    fn close(&mut self) -> QueryResult<()>;

    /// Returns the current state.
    fn state(&self) -> ProcessorState;

    /// Returns the name of this processor kind.
    fn name(&self) -> &'static str;
}

/// A boxed processor for dynamic dispatch.
pub type BoxedProcessor = Box<dyn Processor>;

impl std::fmt::Debug for dyn Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(self.name()).finish()
    }
}

/// Common bookkeeping shared by processor implementations.
#[derive(Debug)]
pub struct ProcessorBase {
    state: ProcessorState,
    emitted: u64,
}

impl ProcessorBase {
    /// Creates a fresh base.
    #[must_use]
    pub fn new() -> Self {
        Self { state: ProcessorState::Fresh, emitted: 0 }
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> ProcessorState {
        self.state
    }

    /// Marks the processor running and resets the emit counter.
    pub fn set_running(&mut self) {
        self.state = ProcessorState::Running;
        self.emitted = 0;
    }

    /// Marks the processor drained.
    pub fn set_drained(&mut self) {
        self.state = ProcessorState::Drained;
    }

    /// Marks the processor closed.
    pub fn set_closed(&mut self) {
        self.state = ProcessorState::Closed;
    }

    /// Counts an emitted traveler.
    pub fn inc_emitted(&mut self) {
        self.emitted += 1;
    }

    /// Returns the number of travelers emitted since open.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Default for ProcessorBase {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test helpers shared by processor unit tests.

    use std::collections::VecDeque;

    use super::*;

    /// Emits a fixed list of travelers; test stand-in for a source.
    pub(crate) struct InjectOp {
        base: ProcessorBase,
        travelers: Vec<Traveler>,
        pending: VecDeque<Traveler>,
    }

    impl InjectOp {
        pub(crate) fn new(travelers: Vec<Traveler>) -> Self {
            Self { base: ProcessorBase::new(), travelers, pending: VecDeque::new() }
        }

        pub(crate) fn boxed(travelers: Vec<Traveler>) -> BoxedProcessor {
            Box::new(Self::new(travelers))
        }
    }

    impl Processor for InjectOp {
        fn open(&mut self, _ctx: &ExecContext) -> QueryResult<()> {
            self.pending = self.travelers.clone().into();
            self.base.set_running();
            Ok(())
        }

        fn next(&mut self) -> QueryResult<Option<Traveler>> {
            match self.pending.pop_front() {
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
            self.pending.clear();
            self.base.set_closed();
            Ok(())
        }

        fn state(&self) -> ProcessorState {
            self.base.state()
        }

        fn name(&self) -> &'static str {
            "Inject"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_transitions() {
        let mut base = ProcessorBase::new();
        assert_eq!(base.state(), ProcessorState::Fresh);

        base.set_running();
        assert!(base.state().is_running());

        base.set_drained();
        assert!(base.state().is_drained());

        base.set_closed();
        assert!(base.state().is_closed());
    }

    #[test]
    fn emit_counter_resets_on_open() {
        let mut base = ProcessorBase::new();
        base.set_running();
        base.inc_emitted();
        base.inc_emitted();
        assert_eq!(base.emitted(), 2);

        base.set_running();
        assert_eq!(base.emitted(), 0);
    }
}
