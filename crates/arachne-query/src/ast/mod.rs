//! Traversal statement model.
//!
//! A traversal is an ordered list of [`GraphStatement`]s. Statements carry
//! only immutable parameters; the compiler owns the dispatch from statement
//! to processor. [`Query`] is a fluent builder over statement lists for
//! embedders and tests.
//!
//! # Example
//!
//! ```
//! use arachne_query::ast::Query;
//!
//! let q = Query::new()
//!     .v(["v1"])
//!     .mark("a")
//!     .out(["knows"])
//!     .mark("b")
//!     .select(["a", "b"])
//!     .on("people");
//! assert_eq!(q.graph, "people");
//! assert_eq!(q.query.len(), 5);
//! ```

use serde::{Deserialize, Serialize};

use arachne_core::Value;

/// A single traversal statement.
///
/// Exactly one variant applies per statement. The serialized form uses the
/// traversal-language names (`v`, `hasLabel`, `outBundle`, ...), which is
/// the shape the RPC gateway accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphStatement {
    /// Seed the pipeline with vertices: all of them, or the given gids.
    V(Vec<String>),
    /// Seed the pipeline with edges, optionally filtered by label.
    E(Vec<String>),
    /// Retain travelers whose `key` field matches any value in `within`.
    Has {
        /// Field path resolved against the current element.
        key: String,
        /// Accepted values.
        within: Vec<Value>,
    },
    /// Retain travelers whose current element carries one of these labels.
    HasLabel(Vec<String>),
    /// Retain travelers whose current element has one of these gids.
    HasId(Vec<String>),
    /// Traverse to adjacent vertices along incoming edges.
    In(Vec<String>),
    /// Traverse to adjacent vertices along outgoing edges.
    Out(Vec<String>),
    /// Traverse to adjacent vertices along edges in either direction.
    Both(Vec<String>),
    /// Traverse to incoming incident edges.
    InEdge(Vec<String>),
    /// Traverse to outgoing incident edges.
    OutEdge(Vec<String>),
    /// Traverse to incident edges in either direction.
    BothEdge(Vec<String>),
    /// Traverse to outgoing bundles.
    OutBundle(Vec<String>),
    /// Record the current element in the mark table under this name.
    As(String),
    /// Emit marked elements: the single mark for one label, an ordered row
    /// for several.
    Select(Vec<String>),
    /// Project data fields of the current element into a value record.
    Values(Vec<String>),
    /// Pass through the first `n` travelers, then cancel upstream.
    Limit(u64),
    /// Drain the stream and emit its length; a non-empty name also marks
    /// the emitted value.
    Count(String),
    /// Drain the stream and emit a histogram of the given field.
    GroupCount(String),
    /// Left-fold the stream with an expression over `(acc, current)`.
    Fold {
        /// Expression source applied per traveler.
        source: String,
        /// Initial accumulator.
        init: Value,
    },
    /// Like `fold`, but emits one accumulator per distinct source vertex.
    VertexFold {
        /// Expression source applied per traveler.
        source: String,
        /// Initial accumulator.
        init: Value,
    },
    /// Transform the current element with an expression.
    Map(String),
    /// Retain travelers for which the expression is truthy.
    Filter(String),
    /// Like `filter`, but only considers value travelers.
    FilterValues(String),
    /// Prepend a script fragment to every later expression in the pipeline.
    Import(String),
    /// Lift a value record back into a vertex via its `gid` field.
    VertexFromValues,
    /// Retain travelers for which every sub-query yields at least one
    /// result, merging marks the sub-queries discover.
    Match(Vec<Vec<GraphStatement>>),
}

/// A compiled-and-run unit: a graph name plus a statement list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphQuery {
    /// The graph to traverse.
    pub graph: String,
    /// The ordered statement list.
    pub query: Vec<GraphStatement>,
}

/// Fluent builder over statement lists.
///
/// Builder methods append one statement each; [`on`](Self::on) attaches the
/// graph name and produces a [`GraphQuery`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    statements: Vec<GraphStatement>,
}

impl Query {
    /// Starts an empty statement list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, statement: GraphStatement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Seeds with vertices; pass no ids for all vertices.
    #[must_use]
    pub fn v<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::V(ids.into_iter().map(Into::into).collect()))
    }

    /// Seeds with edges; pass no labels for all edges.
    #[must_use]
    pub fn e<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::E(labels.into_iter().map(Into::into).collect()))
    }

    /// Retains elements whose `key` field is within the given values.
    #[must_use]
    pub fn has<I, V>(self, key: impl Into<String>, within: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(GraphStatement::Has {
            key: key.into(),
            within: within.into_iter().map(Into::into).collect(),
        })
    }

    /// Retains elements carrying one of these labels.
    #[must_use]
    pub fn has_label<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::HasLabel(labels.into_iter().map(Into::into).collect()))
    }

    /// Retains elements with one of these gids.
    #[must_use]
    pub fn has_id<I, S>(self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::HasId(ids.into_iter().map(Into::into).collect()))
    }

    /// Traverses to adjacent vertices along incoming edges.
    #[must_use]
    pub fn in_<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::In(labels.into_iter().map(Into::into).collect()))
    }

    /// Traverses to adjacent vertices along outgoing edges.
    #[must_use]
    pub fn out<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::Out(labels.into_iter().map(Into::into).collect()))
    }

    /// Traverses to adjacent vertices along edges in either direction.
    #[must_use]
    pub fn both<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::Both(labels.into_iter().map(Into::into).collect()))
    }

    /// Traverses to incoming incident edges.
    #[must_use]
    pub fn in_edge<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::InEdge(labels.into_iter().map(Into::into).collect()))
    }

    /// Traverses to outgoing incident edges.
    #[must_use]
    pub fn out_edge<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::OutEdge(labels.into_iter().map(Into::into).collect()))
    }

    /// Traverses to incident edges in either direction.
    #[must_use]
    pub fn both_edge<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::BothEdge(labels.into_iter().map(Into::into).collect()))
    }

    /// Traverses to outgoing bundles.
    #[must_use]
    pub fn out_bundle<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::OutBundle(labels.into_iter().map(Into::into).collect()))
    }

    /// Records the current element under `name` (the `as` statement).
    #[must_use]
    pub fn mark(self, name: impl Into<String>) -> Self {
        self.push(GraphStatement::As(name.into()))
    }

    /// Emits marked elements.
    #[must_use]
    pub fn select<I, S>(self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::Select(labels.into_iter().map(Into::into).collect()))
    }

    /// Projects data fields into a value record.
    #[must_use]
    pub fn values<I, S>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(GraphStatement::Values(fields.into_iter().map(Into::into).collect()))
    }

    /// Passes through the first `n` travelers.
    #[must_use]
    pub fn limit(self, n: u64) -> Self {
        self.push(GraphStatement::Limit(n))
    }

    /// Drains the stream and emits its length.
    #[must_use]
    pub fn count(self) -> Self {
        self.push(GraphStatement::Count(String::new()))
    }

    /// Like [`count`](Self::count), also marking the emitted value.
    #[must_use]
    pub fn count_as(self, name: impl Into<String>) -> Self {
        self.push(GraphStatement::Count(name.into()))
    }

    /// Drains the stream and emits a histogram of `field`.
    #[must_use]
    pub fn group_count(self, field: impl Into<String>) -> Self {
        self.push(GraphStatement::GroupCount(field.into()))
    }

    /// Left-folds the stream with an expression.
    #[must_use]
    pub fn fold(self, source: impl Into<String>, init: impl Into<Value>) -> Self {
        self.push(GraphStatement::Fold { source: source.into(), init: init.into() })
    }

    /// Left-folds per distinct source vertex.
    #[must_use]
    pub fn vertex_fold(self, source: impl Into<String>, init: impl Into<Value>) -> Self {
        self.push(GraphStatement::VertexFold { source: source.into(), init: init.into() })
    }

    /// Transforms the current element with an expression.
    #[must_use]
    pub fn map(self, source: impl Into<String>) -> Self {
        self.push(GraphStatement::Map(source.into()))
    }

    /// Retains travelers for which the expression is truthy.
    #[must_use]
    pub fn filter(self, source: impl Into<String>) -> Self {
        self.push(GraphStatement::Filter(source.into()))
    }

    /// Like [`filter`](Self::filter), over value travelers only.
    #[must_use]
    pub fn filter_values(self, source: impl Into<String>) -> Self {
        self.push(GraphStatement::FilterValues(source.into()))
    }

    /// Prepends a script fragment to every later expression.
    #[must_use]
    pub fn import(self, source: impl Into<String>) -> Self {
        self.push(GraphStatement::Import(source.into()))
    }

    /// Lifts a value record back into a vertex via its `gid` field.
    #[must_use]
    pub fn vertex_from_values(self) -> Self {
        self.push(GraphStatement::VertexFromValues)
    }

    /// Retains travelers satisfying every sub-query.
    #[must_use]
    pub fn match_<I>(self, sub_queries: I) -> Self
    where
        I: IntoIterator<Item = Query>,
    {
        self.push(GraphStatement::Match(
            sub_queries.into_iter().map(|q| q.statements).collect(),
        ))
    }

    /// Returns the statements built so far.
    #[must_use]
    pub fn statements(&self) -> &[GraphStatement] {
        &self.statements
    }

    /// Consumes the builder, returning the statement list.
    #[must_use]
    pub fn into_statements(self) -> Vec<GraphStatement> {
        self.statements
    }

    /// Attaches a graph name, producing a runnable [`GraphQuery`].
    #[must_use]
    pub fn on(self, graph: impl Into<String>) -> GraphQuery {
        GraphQuery { graph: graph.into(), query: self.statements }
    }
}
