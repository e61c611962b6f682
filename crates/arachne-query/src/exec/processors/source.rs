//! Source processors: `V` and `E`.
//!
//! A source consults its [`IndexHint`] to pick an access path: explicit gids
//! become point lookups, a fused `has` term may be answered by the backend's
//! candidate index, and everything else is a label-narrowed scan. Whatever
//! the path, every hint component is re-applied to fetched elements, so
//! pushdown only ever narrows the scan and never changes results.

use std::sync::Arc;

use arachne_graph::GraphInterface;

use crate::compile::IndexHint;
use crate::error::QueryResult;
use crate::exec::context::ExecContext;
use crate::exec::processor::{Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};

use super::has::{matches_has, matches_ids, matches_labels};

type TravelerStream = Box<dyn Iterator<Item = QueryResult<Traveler>> + Send>;

fn residual(hint: &IndexHint, item: &Item) -> bool {
    hint.ids.as_ref().map_or(true, |ids| matches_ids(item, ids))
        && hint.labels.as_ref().map_or(true, |labels| matches_labels(item, labels))
        && hint.terms.iter().all(|(key, within)| matches_has(item, key, within))
}

/// The `V(ids?)` source.
pub struct VertexSourceOp {
    base: ProcessorBase,
    /// Explicit seed gids from the statement; empty means scan.
    ids: Vec<String>,
    hint: IndexHint,
    stream: Option<TravelerStream>,
}

impl VertexSourceOp {
    /// Creates a vertex source.
    #[must_use]
    pub fn new(ids: Vec<String>, hint: IndexHint) -> Self {
        Self { base: ProcessorBase::new(), ids, hint, stream: None }
    }

    fn build_stream(&self, graph: Arc<dyn GraphInterface>) -> TravelerStream {
        // Point lookups win over any scan. Explicit statement gids take
        // precedence; a fused hasId set works the same way, including the
        // provably-empty intersection.
        let seed_ids = if self.ids.is_empty() {
            self.hint.ids.clone()
        } else {
            Some(self.ids.clone())
        };
        if let Some(gids) = seed_ids {
            let hint = self.hint.clone();
            return Box::new(gids.into_iter().filter_map(move |gid| {
                match graph.get_vertex(&gid) {
                    Ok(Some(v)) => {
                        let item = Item::vertex(v);
                        residual(&hint, &item).then(|| Ok(Traveler::new(item)))
                    }
                    // Unknown seed gids are silently filtered.
                    Ok(None) => None,
                    Err(e) => Some(Err(e.into())),
                }
            }));
        }

        // A fused has term may be answered from a backend index.
        if let Some((field, within)) = self.hint.terms.first() {
            if let Some(gids) = graph.has_candidates(field, within) {
                let hint = self.hint.clone();
                return Box::new(gids.filter_map(move |res| match res {
                    Ok(gid) => match graph.get_vertex(&gid) {
                        Ok(Some(v)) => {
                            let item = Item::vertex(v);
                            residual(&hint, &item).then(|| Ok(Traveler::new(item)))
                        }
                        Ok(None) => None,
                        Err(e) => Some(Err(e.into())),
                    },
                    Err(e) => Some(Err(e.into())),
                }));
            }
        }

        // Fall back to a label-narrowed scan.
        let scan_labels = self.hint.labels.clone().unwrap_or_default();
        let hint = self.hint.clone();
        Box::new(graph.list_vertices(&scan_labels).filter_map(move |res| match res {
            Ok(v) => {
                let item = Item::vertex(v);
                residual(&hint, &item).then(|| Ok(Traveler::new(item)))
            }
            Err(e) => Some(Err(e.into())),
        }))
    }
}

impl Processor for VertexSourceOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.stream = Some(self.build_stream(ctx.graph()));
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        match self.stream.as_mut().and_then(Iterator::next) {
            Some(Ok(t)) => {
                self.base.inc_emitted();
                Ok(Some(t))
            }
            Some(Err(e)) => Err(e),
            None => {
                self.stream = None;
                self.base.set_drained();
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.stream = None;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "VertexSource"
    }
}

/// The `E(labels?)` source.
pub struct EdgeSourceOp {
    base: ProcessorBase,
    /// Label filter from the statement; empty means all edges.
    labels: Vec<String>,
    hint: IndexHint,
    stream: Option<TravelerStream>,
}

impl EdgeSourceOp {
    /// Creates an edge source.
    #[must_use]
    pub fn new(labels: Vec<String>, hint: IndexHint) -> Self {
        Self { base: ProcessorBase::new(), labels, hint, stream: None }
    }

    fn build_stream(&self, graph: Arc<dyn GraphInterface>) -> TravelerStream {
        if let Some(gids) = self.hint.ids.clone() {
            let hint = self.hint.clone();
            let labels = self.labels.clone();
            return Box::new(gids.into_iter().filter_map(move |gid| {
                match graph.get_edge(&gid) {
                    Ok(Some(e)) => {
                        let item = Item::edge(e);
                        let keep = (labels.is_empty() || matches_labels(&item, &labels))
                            && residual(&hint, &item);
                        keep.then(|| Ok(Traveler::new(item)))
                    }
                    Ok(None) => None,
                    Err(e) => Some(Err(e.into())),
                }
            }));
        }

        let scan_labels = if self.labels.is_empty() {
            self.hint.labels.clone().unwrap_or_default()
        } else {
            self.labels.clone()
        };
        let hint = self.hint.clone();
        let labels = self.labels.clone();
        Box::new(graph.list_edges(&scan_labels).filter_map(move |res| match res {
            Ok(e) => {
                let item = Item::edge(e);
                let keep = (labels.is_empty() || matches_labels(&item, &labels))
                    && residual(&hint, &item);
                keep.then(|| Ok(Traveler::new(item)))
            }
            Err(e) => Some(Err(e.into())),
        }))
    }
}

impl Processor for EdgeSourceOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.stream = Some(self.build_stream(ctx.graph()));
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        match self.stream.as_mut().and_then(Iterator::next) {
            Some(Ok(t)) => {
                self.base.inc_emitted();
                Ok(Some(t))
            }
            Some(Err(e)) => Err(e),
            None => {
                self.stream = None;
                self.base.set_drained();
                Ok(None)
            }
        }
    }

    fn close(&mut self) -> QueryResult<()> {
        self.stream = None;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "EdgeSource"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::{person_ctx, test_ctx};
    use arachne_core::Value;

    fn collect_gids(op: &mut dyn Processor, ctx: &ExecContext) -> Vec<String> {
        op.open(ctx).expect("open");
        let mut gids = Vec::new();
        while let Some(t) = op.next().expect("next") {
            gids.push(t.current().gid().expect("gid").to_string());
        }
        op.close().expect("close");
        gids
    }

    #[test]
    fn scans_all_vertices() {
        let ctx = person_ctx();
        let mut op = VertexSourceOp::new(vec![], IndexHint::default());
        assert_eq!(collect_gids(&mut op, &ctx), ["v1", "v2", "v3"]);
    }

    #[test]
    fn seeds_by_gid_and_skips_unknown() {
        let ctx = person_ctx();
        let mut op =
            VertexSourceOp::new(vec!["v2".to_string(), "nope".to_string()], IndexHint::default());
        assert_eq!(collect_gids(&mut op, &ctx), ["v2"]);
    }

    #[test]
    fn hint_terms_narrow_via_candidates() {
        let ctx = person_ctx();
        let hint = IndexHint {
            terms: vec![("age".to_string(), vec![Value::Int(35)])],
            ..IndexHint::default()
        };
        let mut op = VertexSourceOp::new(vec![], hint);
        assert_eq!(collect_gids(&mut op, &ctx), ["v1", "v3"]);
    }

    #[test]
    fn hint_labels_narrow_the_scan() {
        let ctx = person_ctx();
        let hint =
            IndexHint { labels: Some(vec!["Person".to_string()]), ..IndexHint::default() };
        let mut op = VertexSourceOp::new(vec![], hint);
        assert_eq!(collect_gids(&mut op, &ctx), ["v1", "v2", "v3"]);
    }

    #[test]
    fn hint_ids_become_point_lookups() {
        let ctx = person_ctx();
        let hint = IndexHint { ids: Some(vec!["v3".to_string()]), ..IndexHint::default() };
        let mut op = VertexSourceOp::new(vec![], hint);
        assert_eq!(collect_gids(&mut op, &ctx), ["v3"]);
    }

    #[test]
    fn provably_empty_id_set_emits_nothing() {
        let ctx = person_ctx();
        let hint = IndexHint { ids: Some(vec![]), ..IndexHint::default() };
        let mut op = VertexSourceOp::new(vec![], hint);
        assert!(collect_gids(&mut op, &ctx).is_empty());
    }

    #[test]
    fn edge_source_scans_and_filters() {
        let ctx = person_ctx();
        let mut op = EdgeSourceOp::new(vec![], IndexHint::default());
        assert_eq!(collect_gids(&mut op, &ctx), ["e1", "e2"]);

        let mut op = EdgeSourceOp::new(vec!["made".to_string()], IndexHint::default());
        assert!(collect_gids(&mut op, &ctx).is_empty());
    }

    #[test]
    fn empty_graph_yields_empty_stream() {
        let ctx = test_ctx();
        let mut op = VertexSourceOp::new(vec![], IndexHint::default());
        assert!(collect_gids(&mut op, &ctx).is_empty());
    }
}
