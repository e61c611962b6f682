//! Per-graph modification tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

/// Tracks a last-modification tick per graph.
///
/// Editors call [`touch`](Self::touch) after every mutation; readers (query
/// caches, schema samplers) compare ticks to detect staleness. The traversal
/// engine only ever reads it.
#[derive(Debug, Default)]
pub struct Timestamp {
    counter: AtomicU64,
    ticks: RwLock<HashMap<String, u64>>,
}

impl Timestamp {
    /// Creates a new tracker with no recorded graphs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a modification of `graph`, returning the new tick.
    pub fn touch(&self, graph: &str) -> u64 {
        let tick = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.ticks.write().insert(graph.to_string(), tick);
        tick
    }

    /// Returns the last tick recorded for `graph`, if any.
    #[must_use]
    pub fn get(&self, graph: &str) -> Option<u64> {
        self.ticks.read().get(graph).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_are_monotonic() {
        let ts = Timestamp::new();
        assert_eq!(ts.get("g"), None);

        let first = ts.touch("g");
        let second = ts.touch("g");
        assert!(second > first);
        assert_eq!(ts.get("g"), Some(second));
    }

    #[test]
    fn graphs_are_independent() {
        let ts = Timestamp::new();
        ts.touch("a");
        assert_eq!(ts.get("b"), None);
        ts.touch("b");
        assert!(ts.get("b") > ts.get("a"));
    }
}
