//! The pipeline compiler.
//!
//! Walks a statement list in order and lowers it into a linear processor
//! chain, applying the local rewrites the runtime depends on:
//!
//! 1. the pipeline must begin with a source statement (`V`/`E`);
//! 2. the maximal run of `has`/`hasLabel`/`hasId` after the source fuses
//!    into an [`IndexHint`] the source uses to pick its access path;
//! 3. every `select` label must be marked by an earlier `as`, including
//!    marks made inside earlier `match` sub-queries;
//! 4. embedded expressions compile up front, with accumulated `import`
//!    fragments prepended;
//! 5. each `match` sub-query compiles into its own seed-fed sub-pipeline.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use arachne_core::Value;

use crate::ast::GraphStatement;
use crate::error::{QueryError, QueryResult};
use crate::exec::processors::{
    CountOp, Direction, EdgeSourceOp, ExpandKind, ExpandOp, FilterOp, FoldOp, GroupCountOp,
    HasIdOp, HasLabelOp, HasOp, LimitOp, MapOp, MarkOp, MatchOp, SeedOp, SeedSlot, SelectOp,
    SubPipeline, ValuesOp, VertexFoldOp, VertexFromValuesOp, VertexSourceOp,
};
use crate::exec::BoxedProcessor;
use crate::expr::{DefaultEvaluator, Evaluator, Program};

/// The access-path hint fused from `has` statements adjacent to a source.
///
/// `None` sets are unconstrained; `Some` sets are exact (runs of `hasId` or
/// `hasLabel` intersect at compile time, so a contradictory run yields a
/// provably empty source). Terms are conjunctive. Sources re-apply every
/// hint component to fetched elements, so hints only narrow access, never
/// widen results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexHint {
    /// Gid allow-set from fused `hasId`.
    pub ids: Option<Vec<String>>,
    /// Label allow-set from fused `hasLabel`.
    pub labels: Option<Vec<String>>,
    /// Field terms from fused `has`, candidates for backend index pushdown.
    pub terms: Vec<(String, Vec<Value>)>,
}

impl IndexHint {
    /// Returns true if no component constrains the source.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_none() && self.labels.is_none() && self.terms.is_empty()
    }
}

fn intersect(existing: Option<Vec<String>>, incoming: &[String]) -> Option<Vec<String>> {
    match existing {
        None => Some(incoming.to_vec()),
        Some(prev) => Some(prev.into_iter().filter(|x| incoming.contains(x)).collect()),
    }
}

/// Fuses the maximal leading run of retention filters into a hint,
/// returning the hint and how many statements were consumed.
pub(crate) fn fuse_hint(statements: &[GraphStatement]) -> (IndexHint, usize) {
    let mut hint = IndexHint::default();
    let mut consumed = 0;
    for stmt in statements {
        match stmt {
            GraphStatement::Has { key, within } => {
                hint.terms.push((key.clone(), within.clone()));
            }
            GraphStatement::HasLabel(labels) => {
                hint.labels = intersect(hint.labels.take(), labels);
            }
            GraphStatement::HasId(ids) => {
                hint.ids = intersect(hint.ids.take(), ids);
            }
            _ => break,
        }
        consumed += 1;
    }
    (hint, consumed)
}

struct CompileState<'a> {
    evaluator: &'a dyn Evaluator,
    imports: Vec<String>,
    labels_in_scope: HashSet<String>,
}

impl CompileState<'_> {
    fn compile_expr(&self, source: &str) -> QueryResult<Arc<dyn Program>> {
        if self.imports.is_empty() {
            return self.evaluator.compile(source);
        }
        let mut full = String::new();
        for fragment in &self.imports {
            full.push_str(fragment);
            full.push('\n');
        }
        full.push_str(source);
        self.evaluator.compile(&full)
    }
}

fn statement_name(stmt: &GraphStatement) -> &'static str {
    match stmt {
        GraphStatement::V(_) => "V",
        GraphStatement::E(_) => "E",
        GraphStatement::Has { .. } => "has",
        GraphStatement::HasLabel(_) => "hasLabel",
        GraphStatement::HasId(_) => "hasId",
        GraphStatement::In(_) => "in",
        GraphStatement::Out(_) => "out",
        GraphStatement::Both(_) => "both",
        GraphStatement::InEdge(_) => "inEdge",
        GraphStatement::OutEdge(_) => "outEdge",
        GraphStatement::BothEdge(_) => "bothEdge",
        GraphStatement::OutBundle(_) => "outBundle",
        GraphStatement::As(_) => "as",
        GraphStatement::Select(_) => "select",
        GraphStatement::Values(_) => "values",
        GraphStatement::Limit(_) => "limit",
        GraphStatement::Count(_) => "count",
        GraphStatement::GroupCount(_) => "groupCount",
        GraphStatement::Fold { .. } => "fold",
        GraphStatement::VertexFold { .. } => "vertexFold",
        GraphStatement::Map(_) => "map",
        GraphStatement::Filter(_) => "filter",
        GraphStatement::FilterValues(_) => "filterValues",
        GraphStatement::Import(_) => "import",
        GraphStatement::VertexFromValues => "vertexFromValues",
        GraphStatement::Match(_) => "match",
    }
}

/// Compiles a statement list with the built-in expression evaluator.
pub fn compile(statements: &[GraphStatement]) -> QueryResult<BoxedProcessor> {
    compile_with(statements, &DefaultEvaluator)
}

/// Compiles a statement list against a caller-supplied evaluator.
///
/// # Errors
///
/// `InvalidPipeline`, `UnknownLabel`, and `Compile` per the rewrite rules;
/// all of them abort before any output is produced.
pub fn compile_with(
    statements: &[GraphStatement],
    evaluator: &dyn Evaluator,
) -> QueryResult<BoxedProcessor> {
    let Some(first) = statements.first() else {
        return Err(QueryError::invalid_pipeline("empty statement list"));
    };

    let (hint, fused) = fuse_hint(&statements[1..]);
    let mut op: BoxedProcessor = match first {
        GraphStatement::V(ids) => Box::new(VertexSourceOp::new(ids.clone(), hint)),
        GraphStatement::E(labels) => Box::new(EdgeSourceOp::new(labels.clone(), hint)),
        other => {
            return Err(QueryError::InvalidPipeline(format!(
                "pipeline must begin with V or E, found '{}'",
                statement_name(other)
            )))
        }
    };

    let mut state =
        CompileState { evaluator, imports: Vec::new(), labels_in_scope: HashSet::new() };
    for stmt in &statements[1 + fused..] {
        op = build_stage(stmt, op, &mut state)?;
    }
    Ok(op)
}

fn build_stage(
    stmt: &GraphStatement,
    input: BoxedProcessor,
    state: &mut CompileState<'_>,
) -> QueryResult<BoxedProcessor> {
    let op: BoxedProcessor = match stmt {
        GraphStatement::V(_) | GraphStatement::E(_) => {
            return Err(QueryError::InvalidPipeline(format!(
                "'{}' may only start a pipeline",
                statement_name(stmt)
            )))
        }

        GraphStatement::Has { key, within } => {
            Box::new(HasOp::new(key.clone(), within.clone(), input))
        }
        GraphStatement::HasLabel(labels) => Box::new(HasLabelOp::new(labels.clone(), input)),
        GraphStatement::HasId(ids) => Box::new(HasIdOp::new(ids.clone(), input)),

        GraphStatement::In(labels) => Box::new(ExpandOp::new(
            Direction::In,
            ExpandKind::AdjacentVertex,
            labels.clone(),
            input,
        )),
        GraphStatement::Out(labels) => Box::new(ExpandOp::new(
            Direction::Out,
            ExpandKind::AdjacentVertex,
            labels.clone(),
            input,
        )),
        GraphStatement::Both(labels) => Box::new(ExpandOp::new(
            Direction::Both,
            ExpandKind::AdjacentVertex,
            labels.clone(),
            input,
        )),
        GraphStatement::InEdge(labels) => Box::new(ExpandOp::new(
            Direction::In,
            ExpandKind::IncidentEdge,
            labels.clone(),
            input,
        )),
        GraphStatement::OutEdge(labels) => Box::new(ExpandOp::new(
            Direction::Out,
            ExpandKind::IncidentEdge,
            labels.clone(),
            input,
        )),
        GraphStatement::BothEdge(labels) => Box::new(ExpandOp::new(
            Direction::Both,
            ExpandKind::IncidentEdge,
            labels.clone(),
            input,
        )),
        GraphStatement::OutBundle(labels) => Box::new(ExpandOp::new(
            Direction::Out,
            ExpandKind::OutBundle,
            labels.clone(),
            input,
        )),

        GraphStatement::As(name) => {
            state.labels_in_scope.insert(name.clone());
            Box::new(MarkOp::new(name.clone(), input))
        }
        GraphStatement::Select(labels) => {
            if labels.is_empty() {
                return Err(QueryError::invalid_pipeline("select requires at least one label"));
            }
            for label in labels {
                if !state.labels_in_scope.contains(label) {
                    return Err(QueryError::UnknownLabel(label.clone()));
                }
            }
            Box::new(SelectOp::new(labels.clone(), input))
        }

        GraphStatement::Values(fields) => Box::new(ValuesOp::new(fields.clone(), input)),
        GraphStatement::Limit(n) => Box::new(LimitOp::new(*n, input)),
        GraphStatement::Count(name) => Box::new(CountOp::new(name.clone(), input)),
        GraphStatement::GroupCount(field) => Box::new(GroupCountOp::new(field.clone(), input)),

        GraphStatement::Fold { source, init } => {
            Box::new(FoldOp::new(state.compile_expr(source)?, init.clone(), input))
        }
        GraphStatement::VertexFold { source, init } => {
            Box::new(VertexFoldOp::new(state.compile_expr(source)?, init.clone(), input))
        }
        GraphStatement::Map(source) => Box::new(MapOp::new(state.compile_expr(source)?, input)),
        GraphStatement::Filter(source) => {
            Box::new(FilterOp::new(state.compile_expr(source)?, input))
        }
        GraphStatement::FilterValues(source) => {
            Box::new(FilterOp::values_only(state.compile_expr(source)?, input))
        }

        GraphStatement::Import(fragment) => {
            // Compile-time only: later expressions see the fragment.
            state.imports.push(fragment.clone());
            return Ok(input);
        }

        GraphStatement::VertexFromValues => Box::new(VertexFromValuesOp::new(input)),

        GraphStatement::Match(sub_queries) => {
            if sub_queries.is_empty() {
                return Err(QueryError::invalid_pipeline("match requires at least one sub-query"));
            }
            let mut subs = Vec::with_capacity(sub_queries.len());
            for sub in sub_queries {
                subs.push(compile_sub(sub, state)?);
            }
            Box::new(MatchOp::new(subs, input))
        }
    };
    Ok(op)
}

/// Compiles one `match` sub-query into a seed-fed sub-pipeline.
///
/// A leading `V`/`E` is rebound to the seed; anywhere else in the sub-query
/// it is rejected like in the outer pipeline. Marks made inside the
/// sub-query register in the enclosing scope, since the match processor
/// propagates them outward.
fn compile_sub(
    statements: &[GraphStatement],
    state: &mut CompileState<'_>,
) -> QueryResult<SubPipeline> {
    let slot: SeedSlot = Arc::new(Mutex::new(None));
    let mut op: BoxedProcessor = Box::new(SeedOp::new(Arc::clone(&slot)));

    let rest = match statements.first() {
        Some(GraphStatement::V(_) | GraphStatement::E(_)) => &statements[1..],
        _ => statements,
    };
    for stmt in rest {
        op = build_stage(stmt, op, state)?;
    }
    Ok(SubPipeline::new(slot, op))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Query;

    fn statements(q: Query) -> Vec<GraphStatement> {
        q.into_statements()
    }

    #[test]
    fn rejects_pipelines_without_a_source() {
        let err = compile(&statements(Query::new().has_label(["Person"]))).expect_err("no source");
        assert!(matches!(err, QueryError::InvalidPipeline(_)));

        let err = compile(&[]).expect_err("empty");
        assert!(matches!(err, QueryError::InvalidPipeline(_)));
    }

    #[test]
    fn rejects_mid_pipeline_sources() {
        let stmts = statements(Query::new().v(["v1"]).out(["knows"])).into_iter()
            .chain(statements(Query::new().v(["v2"])))
            .collect::<Vec<_>>();
        let err = compile(&stmts).expect_err("mid-pipeline V");
        assert!(matches!(err, QueryError::InvalidPipeline(_)));
    }

    #[test]
    fn select_requires_a_prior_mark() {
        let err = compile(&statements(Query::new().v(["v1"]).select(["a"])))
            .expect_err("unknown label");
        assert!(matches!(err, QueryError::UnknownLabel(name) if name == "a"));

        assert!(compile(&statements(Query::new().v(["v1"]).mark("a").select(["a"]))).is_ok());
    }

    #[test]
    fn select_sees_marks_from_match_sub_queries() {
        let stmts = statements(
            Query::new()
                .v(["v1"])
                .match_([Query::new().out(["knows"]).mark("friend")])
                .select(["friend"]),
        );
        assert!(compile(&stmts).is_ok());
    }

    #[test]
    fn expression_errors_surface_at_compile_time() {
        let err =
            compile(&statements(Query::new().v(["v1"]).filter("1 +"))).expect_err("bad expr");
        assert!(matches!(err, QueryError::Compile { .. }));
    }

    #[test]
    fn imports_feed_later_expressions() {
        let stmts = statements(
            Query::new()
                .v(["v1"])
                .import("let cutoff = 40;")
                .filter("current.data.age > cutoff"),
        );
        assert!(compile(&stmts).is_ok());

        // Without the import the same expression fails at evaluation, not
        // compilation, so also check the fragment is really prepended.
        let state = CompileState {
            evaluator: &DefaultEvaluator,
            imports: vec!["let cutoff = 40;".to_string()],
            labels_in_scope: HashSet::new(),
        };
        let program = state.compile_expr("cutoff + 1").expect("compile");
        let value = program.evaluate(&crate::expr::Scope::new()).expect("eval");
        assert_eq!(value, Value::Int(41));
    }

    #[test]
    fn fusion_consumes_the_leading_filter_run() {
        let stmts = statements(
            Query::new()
                .v::<Vec<String>, String>(vec![])
                .has_label(["Person"])
                .has("age", [35i64])
                .out(["knows"])
                .has_label(["Person"]),
        );
        let (hint, consumed) = fuse_hint(&stmts[1..]);
        assert_eq!(consumed, 2);
        assert_eq!(hint.labels, Some(vec!["Person".to_string()]));
        assert_eq!(hint.terms.len(), 1);
        assert_eq!(hint.ids, None);
    }

    #[test]
    fn fused_id_runs_intersect() {
        let stmts = statements(
            Query::new()
                .v::<Vec<String>, String>(vec![])
                .has_id(["v1", "v2"])
                .has_id(["v2", "v3"]),
        );
        let (hint, consumed) = fuse_hint(&stmts[1..]);
        assert_eq!(consumed, 2);
        assert_eq!(hint.ids, Some(vec!["v2".to_string()]));
    }

    #[test]
    fn match_rejects_nested_sources_past_the_seed() {
        // A leading V rebinds to the seed and is accepted.
        let ok = statements(Query::new().v(["v1"]).match_([Query::new().v(["v9"]).out(["knows"])]));
        assert!(compile(&ok).is_ok());

        // A source deeper inside a sub-query is invalid.
        let bad = statements(
            Query::new().v(["v1"]).match_([Query::new().out(["knows"]).v(["v9"])]),
        );
        assert!(matches!(compile(&bad), Err(QueryError::InvalidPipeline(_))));
    }

    #[test]
    fn empty_match_is_rejected() {
        let err = compile(&statements(Query::new().v(["v1"]).match_([])))
            .expect_err("empty match");
        assert!(matches!(err, QueryError::InvalidPipeline(_)));
    }
}
