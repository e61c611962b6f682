//! Embedded expression evaluation.
//!
//! The engine only depends on the [`Evaluator`] contract: compile a source
//! string once per pipeline, then evaluate the compiled [`Program`] against
//! a per-traveler [`Scope`]. Evaluation must be pure with respect to engine
//! state.
//!
//! [`DefaultEvaluator`] is the built-in language: `let` bindings followed by
//! one expression over the scope names `current`, `marks`, and `acc`, with
//! dotted field access, arithmetic, comparisons, and boolean operators.
//!
//! # Example
//!
//! ```
//! use arachne_core::Value;
//! use arachne_query::expr::{DefaultEvaluator, Evaluator, Scope};
//!
//! let program = DefaultEvaluator.compile("acc + current.age").unwrap();
//! let mut person = std::collections::HashMap::new();
//! person.insert("age".to_string(), Value::Int(35));
//! let scope = Scope::new()
//!     .with("acc", Value::Int(7))
//!     .with("current", Value::Map(person));
//! assert_eq!(program.evaluate(&scope).unwrap(), Value::Int(42));
//! ```

mod eval;
mod parser;

pub use eval::DefaultEvaluator;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use arachne_core::Value;

use crate::error::QueryResult;

/// The names visible to an expression.
///
/// The engine binds `current` (the traveler's current item rendered as a
/// structured value), `marks` (the mark table as a map), and, inside folds,
/// `acc` (the accumulator).
#[derive(Debug, Clone, Default)]
pub struct Scope {
    bindings: HashMap<String, Value>,
}

impl Scope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a binding, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.bindings.insert(name.into(), value);
        self
    }

    /// Looks up a bound name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }
}

/// A runtime evaluation failure.
///
/// Never fatal to a traversal: the engine drops the offending traveler and
/// keeps streaming.
#[derive(Debug, Error)]
#[error("evaluation error: {0}")]
pub struct EvalError(pub String);

impl EvalError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// A compiled expression, evaluated once per traveler.
pub trait Program: Send + Sync {
    /// Evaluates against a scope.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] on type errors or unknown names; the caller
    /// drops the traveler and continues.
    fn evaluate(&self, scope: &Scope) -> Result<Value, EvalError>;
}

/// The pluggable expression-compiler contract.
pub trait Evaluator: Send + Sync {
    /// Compiles a source string into a reusable program.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Compile`](crate::QueryError::Compile); a
    /// rejected source aborts pipeline compilation before any output.
    fn compile(&self, source: &str) -> QueryResult<Arc<dyn Program>>;
}
