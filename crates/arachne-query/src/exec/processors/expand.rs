//! Adjacency expansion: `out`, `in`, `both`, `outEdge`, `inEdge`,
//! `bothEdge`, and `outBundle`.
//!
//! Expansion emits one traveler per adjacent element, carrying marks
//! through unchanged. Inputs whose kind the statement cannot traverse are
//! silently dropped.

use std::sync::Arc;

use arachne_core::Edge;
use arachne_graph::GraphInterface;

use crate::error::{QueryError, QueryResult};
use crate::exec::context::ExecContext;
use crate::exec::processor::{BoxedProcessor, Processor, ProcessorBase, ProcessorState};
use crate::exec::traveler::{Item, Traveler};

/// The direction of an expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Along outgoing edges.
    Out,
    /// Along incoming edges.
    In,
    /// The union of both directions, outgoing first.
    Both,
}

/// What an expansion emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandKind {
    /// Adjacent vertices (`out`, `in`, `both`).
    AdjacentVertex,
    /// Incident edges (`outEdge`, `inEdge`, `bothEdge`).
    IncidentEdge,
    /// Outgoing bundles (`outBundle`).
    OutBundle,
}

type TravelerStream = Box<dyn Iterator<Item = QueryResult<Traveler>> + Send>;

/// The adjacency expansion processor.
pub struct ExpandOp {
    base: ProcessorBase,
    direction: Direction,
    kind: ExpandKind,
    labels: Vec<String>,
    input: BoxedProcessor,
    graph: Option<Arc<dyn GraphInterface>>,
    pending: Option<TravelerStream>,
}

impl ExpandOp {
    /// Creates an expansion processor.
    #[must_use]
    pub fn new(
        direction: Direction,
        kind: ExpandKind,
        labels: Vec<String>,
        input: BoxedProcessor,
    ) -> Self {
        Self {
            base: ProcessorBase::new(),
            direction,
            kind,
            labels,
            input,
            graph: None,
            pending: None,
        }
    }

    /// Edges to traverse from a vertex, outgoing first for `both`.
    fn vertex_edges(
        &self,
        graph: &Arc<dyn GraphInterface>,
        gid: &str,
    ) -> Box<dyn Iterator<Item = QueryResult<Edge>> + Send> {
        let out = matches!(self.direction, Direction::Out | Direction::Both);
        let inc = matches!(self.direction, Direction::In | Direction::Both);
        let mut streams: Vec<Box<dyn Iterator<Item = QueryResult<Edge>> + Send>> = Vec::new();
        if out {
            streams.push(Box::new(
                graph.out_edges(gid, &self.labels).map(|r| r.map_err(QueryError::from)),
            ));
        }
        if inc {
            streams.push(Box::new(
                graph.in_edges(gid, &self.labels).map(|r| r.map_err(QueryError::from)),
            ));
        }
        Box::new(streams.into_iter().flatten())
    }

    fn expand(&self, t: &Traveler) -> TravelerStream {
        let graph = match &self.graph {
            Some(g) => Arc::clone(g),
            None => return Box::new(std::iter::empty()),
        };
        let base = t.clone();

        match (self.kind, t.current()) {
            (ExpandKind::AdjacentVertex, Item::Vertex(v)) => {
                let out = matches!(self.direction, Direction::Out | Direction::Both);
                let inc = matches!(self.direction, Direction::In | Direction::Both);
                let mut streams: Vec<TravelerStream> = Vec::new();
                if out {
                    let g = Arc::clone(&graph);
                    let b = base.clone();
                    streams.push(Box::new(
                        graph.out_edges(&v.gid, &self.labels).filter_map(move |res| {
                            follow_endpoint(&g, res, &b, EndpointSide::To)
                        }),
                    ));
                }
                if inc {
                    let g = Arc::clone(&graph);
                    let b = base.clone();
                    streams.push(Box::new(
                        graph.in_edges(&v.gid, &self.labels).filter_map(move |res| {
                            follow_endpoint(&g, res, &b, EndpointSide::From)
                        }),
                    ));
                }
                Box::new(streams.into_iter().flatten())
            }

            // Expanding from an edge resolves to its endpoint: the target
            // for `out`, the origin for `in`, both for `both`.
            (ExpandKind::AdjacentVertex, Item::Edge(e)) => {
                if !self.labels.is_empty() && !self.labels.iter().any(|l| *l == e.label) {
                    return Box::new(std::iter::empty());
                }
                let mut gids = Vec::new();
                if matches!(self.direction, Direction::Out | Direction::Both) {
                    gids.push(e.to.clone());
                }
                if matches!(self.direction, Direction::In | Direction::Both) {
                    gids.push(e.from.clone());
                }
                Box::new(gids.into_iter().filter_map(move |gid| {
                    lookup_vertex(&graph, &gid, &base)
                }))
            }

            // Expanding out of a bundle fans out to its targets.
            (ExpandKind::AdjacentVertex, Item::Bundle(b)) => {
                if self.direction != Direction::Out
                    || (!self.labels.is_empty() && !self.labels.iter().any(|l| *l == b.label))
                {
                    return Box::new(std::iter::empty());
                }
                let gids: Vec<String> = b.bundle.keys().cloned().collect();
                Box::new(gids.into_iter().filter_map(move |gid| {
                    lookup_vertex(&graph, &gid, &base)
                }))
            }

            (ExpandKind::IncidentEdge, Item::Vertex(v)) => {
                let edges = self.vertex_edges(&graph, &v.gid);
                Box::new(edges.map(move |res| res.map(|e| base.with_current(Item::edge(e)))))
            }

            (ExpandKind::OutBundle, Item::Vertex(v)) => {
                let b = base;
                Box::new(graph.out_bundles(&v.gid, &self.labels).map(move |res| match res {
                    Ok(bundle) => Ok(b.with_current(Item::bundle(bundle))),
                    Err(e) => Err(e.into()),
                }))
            }

            // Every other kind pairing is silently dropped.
            _ => Box::new(std::iter::empty()),
        }
    }
}

#[derive(Clone, Copy)]
enum EndpointSide {
    From,
    To,
}

fn follow_endpoint(
    graph: &Arc<dyn GraphInterface>,
    res: arachne_graph::GraphResult<Edge>,
    base: &Traveler,
    side: EndpointSide,
) -> Option<QueryResult<Traveler>> {
    match res {
        Ok(edge) => {
            let gid = match side {
                EndpointSide::To => &edge.to,
                EndpointSide::From => &edge.from,
            };
            lookup_vertex(graph, gid, base)
        }
        Err(e) => Some(Err(e.into())),
    }
}

fn lookup_vertex(
    graph: &Arc<dyn GraphInterface>,
    gid: &str,
    base: &Traveler,
) -> Option<QueryResult<Traveler>> {
    match graph.get_vertex(gid) {
        Ok(Some(v)) => Some(Ok(base.with_current(Item::vertex(v)))),
        // Dangling endpoints are silently filtered.
        Ok(None) => None,
        Err(e) => Some(Err(e.into())),
    }
}

impl Processor for ExpandOp {
    fn open(&mut self, ctx: &ExecContext) -> QueryResult<()> {
        self.input.open(ctx)?;
        self.graph = Some(ctx.graph());
        self.pending = None;
        self.base.set_running();
        Ok(())
    }

    fn next(&mut self) -> QueryResult<Option<Traveler>> {
        loop {
            if let Some(pending) = self.pending.as_mut() {
                match pending.next() {
                    Some(Ok(t)) => {
                        self.base.inc_emitted();
                        return Ok(Some(t));
                    }
                    Some(Err(e)) => return Err(e),
                    None => self.pending = None,
                }
            }
            match self.input.next()? {
                Some(t) => self.pending = Some(self.expand(&t)),
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
        self.pending = None;
        self.graph = None;
        self.input.close()?;
        self.base.set_closed();
        Ok(())
    }

    fn state(&self) -> ProcessorState {
        self.base.state()
    }

    fn name(&self) -> &'static str {
        "Expand"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::processor::testing::InjectOp;
    use crate::exec::testing::person_ctx;
    use arachne_core::Value;

    fn seed(ctx: &ExecContext, gid: &str) -> Vec<Traveler> {
        let v = ctx.graph().get_vertex(gid).expect("get").expect("exists");
        vec![Traveler::new(Item::vertex(v))]
    }

    fn run(mut op: ExpandOp, ctx: &ExecContext) -> Vec<Traveler> {
        op.open(ctx).expect("open");
        let mut out = Vec::new();
        while let Some(t) = op.next().expect("next") {
            out.push(t);
        }
        op.close().expect("close");
        out
    }

    #[test]
    fn out_follows_edges_to_vertices() {
        let ctx = person_ctx();
        let labels = vec!["knows".to_string()];
        let op = ExpandOp::new(
            Direction::Out,
            ExpandKind::AdjacentVertex,
            labels,
            InjectOp::boxed(seed(&ctx, "v1")),
        );
        let out = run(op, &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].current().gid(), Some("v2"));
    }

    #[test]
    fn both_is_out_then_in() {
        let ctx = person_ctx();
        let op = ExpandOp::new(
            Direction::Both,
            ExpandKind::AdjacentVertex,
            vec![],
            InjectOp::boxed(seed(&ctx, "v2")),
        );
        let out = run(op, &ctx);
        let gids: Vec<&str> = out.iter().map(|t| t.current().gid().expect("gid")).collect();
        assert_eq!(gids, ["v3", "v1"]);
    }

    #[test]
    fn marks_are_carried_through() {
        let ctx = person_ctx();
        let marked: Vec<Traveler> =
            seed(&ctx, "v1").into_iter().map(|t| t.with_mark("a")).collect();
        let op = ExpandOp::new(
            Direction::Out,
            ExpandKind::AdjacentVertex,
            vec![],
            InjectOp::boxed(marked),
        );
        let out = run(op, &ctx);
        assert_eq!(out[0].marks().get("a").and_then(Item::gid), Some("v1"));
    }

    #[test]
    fn out_edge_emits_edges() {
        let ctx = person_ctx();
        let op = ExpandOp::new(
            Direction::Out,
            ExpandKind::IncidentEdge,
            vec![],
            InjectOp::boxed(seed(&ctx, "v1")),
        );
        let out = run(op, &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].current().gid(), Some("e1"));
        assert_eq!(out[0].current().label(), Some("knows"));
    }

    #[test]
    fn out_from_edge_resolves_target() {
        let ctx = person_ctx();
        let e = ctx.graph().get_edge("e1").expect("get").expect("exists");
        let op = ExpandOp::new(
            Direction::Out,
            ExpandKind::AdjacentVertex,
            vec![],
            InjectOp::boxed(vec![Traveler::new(Item::edge(e))]),
        );
        let out = run(op, &ctx);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].current().gid(), Some("v2"));
    }

    #[test]
    fn value_inputs_are_dropped() {
        let ctx = person_ctx();
        let op = ExpandOp::new(
            Direction::Out,
            ExpandKind::AdjacentVertex,
            vec![],
            InjectOp::boxed(vec![Traveler::new(Item::value(Value::Int(1)))]),
        );
        assert!(run(op, &ctx).is_empty());
    }

    #[test]
    fn label_filter_restricts_expansion() {
        let ctx = person_ctx();
        let op = ExpandOp::new(
            Direction::Out,
            ExpandKind::AdjacentVertex,
            vec!["made".to_string()],
            InjectOp::boxed(seed(&ctx, "v1")),
        );
        assert!(run(op, &ctx).is_empty());
    }
}
