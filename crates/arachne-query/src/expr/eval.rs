//! Tree-walking evaluator for the built-in expression language.

use std::collections::HashMap;
use std::sync::Arc;

use arachne_core::Value;

use crate::error::{QueryError, QueryResult};

use super::parser::{self, BinaryOp, ExprNode, ProgramNode, UnaryOp};
use super::{EvalError, Evaluator, Program, Scope};

/// The built-in expression evaluator.
///
/// Field access is null-tolerant: a missing field, or a field access on a
/// non-map, yields `null` rather than an error. Type errors in arithmetic
/// and comparisons are [`EvalError`]s, which the engine turns into dropped
/// travelers.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEvaluator;

impl Evaluator for DefaultEvaluator {
    fn compile(&self, source: &str) -> QueryResult<Arc<dyn Program>> {
        let node = parser::parse(source)
            .map_err(|(position, message)| QueryError::Compile { position, message })?;
        Ok(Arc::new(CompiledProgram { node }))
    }
}

struct CompiledProgram {
    node: ProgramNode,
}

impl Program for CompiledProgram {
    fn evaluate(&self, scope: &Scope) -> Result<Value, EvalError> {
        let mut locals: HashMap<String, Value> = HashMap::new();
        for (name, expr) in &self.node.lets {
            let value = eval_expr(expr, scope, &locals)?;
            locals.insert(name.clone(), value);
        }
        eval_expr(&self.node.body, scope, &locals)
    }
}

fn eval_expr(
    node: &ExprNode,
    scope: &Scope,
    locals: &HashMap<String, Value>,
) -> Result<Value, EvalError> {
    match node {
        ExprNode::Literal(value) => Ok(value.clone()),

        ExprNode::Ident(name) => locals
            .get(name)
            .or_else(|| scope.get(name))
            .cloned()
            .ok_or_else(|| EvalError::new(format!("unknown name '{name}'"))),

        ExprNode::Field(base, name) => {
            let base = eval_expr(base, scope, locals)?;
            match base {
                Value::Map(map) => Ok(map.get(name).cloned().unwrap_or(Value::Null)),
                _ => Ok(Value::Null),
            }
        }

        ExprNode::Unary(op, operand) => {
            let value = eval_expr(operand, scope, locals)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Int(i) => Ok(Value::Int(-i)),
                    Value::Float(f) => Ok(Value::Float(-f)),
                    other => {
                        Err(EvalError::new(format!("cannot negate {}", other.type_name())))
                    }
                },
            }
        }

        ExprNode::Binary(op, left, right) => match op {
            // Short-circuiting boolean operators evaluate lazily.
            BinaryOp::And => {
                let l = eval_expr(left, scope, locals)?;
                if !l.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(eval_expr(right, scope, locals)?.is_truthy()))
            }
            BinaryOp::Or => {
                let l = eval_expr(left, scope, locals)?;
                if l.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(eval_expr(right, scope, locals)?.is_truthy()))
            }
            _ => {
                let l = eval_expr(left, scope, locals)?;
                let r = eval_expr(right, scope, locals)?;
                eval_binary(*op, &l, &r)
            }
        },
    }
}

fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(left.loose_eq(right))),
        BinaryOp::Ne => Ok(Value::Bool(!left.loose_eq(right))),

        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(left, right)?;
            let holds = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(holds))
        }

        BinaryOp::Add => match (left, right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            _ => arithmetic(op, left, right),
        },
        BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            arithmetic(op, left, right)
        }

        BinaryOp::And | BinaryOp::Or => {
            // Handled with short-circuiting above.
            Err(EvalError::new("boolean operator reached eval_binary"))
        }
    }
}

fn compare(left: &Value, right: &Value) -> Result<std::cmp::Ordering, EvalError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => {
            let a = left.as_float().ok_or_else(|| {
                EvalError::new(format!("cannot compare {}", left.type_name()))
            })?;
            let b = right.as_float().ok_or_else(|| {
                EvalError::new(format!("cannot compare {}", right.type_name()))
            })?;
            a.partial_cmp(&b)
                .ok_or_else(|| EvalError::new("cannot compare NaN"))
        }
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return match op {
            BinaryOp::Add => Ok(Value::Int(a.wrapping_add(*b))),
            BinaryOp::Sub => Ok(Value::Int(a.wrapping_sub(*b))),
            BinaryOp::Mul => Ok(Value::Int(a.wrapping_mul(*b))),
            BinaryOp::Div => {
                if *b == 0 {
                    Err(EvalError::new("division by zero"))
                } else {
                    Ok(Value::Int(a / b))
                }
            }
            BinaryOp::Rem => {
                if *b == 0 {
                    Err(EvalError::new("division by zero"))
                } else {
                    Ok(Value::Int(a % b))
                }
            }
            _ => Err(EvalError::new("non-arithmetic operator")),
        };
    }

    let a = left.as_float().ok_or_else(|| {
        EvalError::new(format!("arithmetic on {}", left.type_name()))
    })?;
    let b = right.as_float().ok_or_else(|| {
        EvalError::new(format!("arithmetic on {}", right.type_name()))
    })?;
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => {
            if b == 0.0 {
                Err(EvalError::new("division by zero"))
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinaryOp::Rem => {
            if b == 0.0 {
                Err(EvalError::new("division by zero"))
            } else {
                Ok(Value::Float(a % b))
            }
        }
        _ => Err(EvalError::new("non-arithmetic operator")),
    }
}
