//! Binding expressions
//!
//! The right-hand side of a binding action (`result.text = a + b`) is a small
//! expression language: literals, lists, names from the scope, attribute
//! access, arithmetic, comparison, boolean logic and a fixed set of builtin
//! functions. It has no assignment, no imports and no way to reach host
//! state outside the scope it is given.

use std::collections::HashMap;

use pest::iterators::Pair;
use pest::Parser;
use thiserror::Error;
use tracing::warn;

use crate::parser::{MenuParser, Rule};

pub mod ast;
pub mod eval;
pub mod stdlib;
pub mod values;

pub use ast::{BinaryOp, CmpOp, Expr, LogicalOp, UnaryOp};
pub use eval::{evaluate, EvalResult};
pub use stdlib::BuiltinFunc;
pub use values::Val;

#[cfg(test)]
mod tests;

/* ===================== Errors ===================== */

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("access to '{0}' is not allowed")]
    Forbidden(String),

    #[error("name '{0}' is not defined")]
    UnknownName(String),

    #[error("function '{0}' is not available")]
    UnknownFunction(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("'{object}' object has no attribute '{property}'")]
    NoAttribute { object: String, property: String },

    #[error("{0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("cannot convert {value} to {target}")]
    Conversion { target: String, value: String },
}

impl From<pest::error::Error<Rule>> for EvalError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        EvalError::Syntax(err.variant.message().to_string())
    }
}

type ParseResult<T> = Result<T, EvalError>;

/* ===================== Entry Points ===================== */

/// Parse an expression into its AST
pub fn parse(source: &str) -> ParseResult<Expr> {
    let mut pairs = MenuParser::parse(Rule::expression_input, source.trim())?;
    let input = pairs
        .next()
        .ok_or_else(|| EvalError::Syntax("empty expression".to_string()))?;
    let expr = input
        .into_inner()
        .next()
        .ok_or_else(|| EvalError::Syntax("empty expression".to_string()))?;
    build_expr(expr)
}

/// Parse and evaluate
pub fn eval_str(source: &str, scope: &HashMap<String, Val>) -> EvalResult {
    evaluate(&parse(source)?, scope)
}

/// Parse and evaluate; failures are logged and yield `None`
pub fn safe_eval(source: &str, scope: &HashMap<String, Val>) -> Option<Val> {
    match eval_str(source, scope) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(expression = source, error = %err, "expression evaluation failed");
            None
        }
    }
}

/* ===================== AST Builder ===================== */

fn first_inner(pair: Pair<Rule>) -> ParseResult<Pair<Rule>> {
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| EvalError::Syntax(format!("empty {rule:?}")))
}

fn build_expr(pair: Pair<Rule>) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::expr => build_expr(first_inner(pair)?),

        Rule::or_expr | Rule::and_expr => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| EvalError::Syntax("missing operand".to_string()))?;
            let mut left = build_expr(first)?;
            while let (Some(op), Some(operand)) = (inner.next(), inner.next()) {
                let op = match op.as_rule() {
                    Rule::or_op => LogicalOp::Or,
                    _ => LogicalOp::And,
                };
                left = Expr::Logical {
                    op,
                    left: Box::new(left),
                    right: Box::new(build_expr(operand)?),
                };
            }
            Ok(left)
        }

        Rule::not_expr => {
            let mut nots = 0;
            let mut operand = None;
            for child in pair.into_inner() {
                match child.as_rule() {
                    Rule::not_op => nots += 1,
                    _ => operand = Some(build_expr(child)?),
                }
            }
            let mut expr = operand.ok_or_else(|| EvalError::Syntax("missing operand".to_string()))?;
            for _ in 0..nots {
                expr = Expr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(expr),
                };
            }
            Ok(expr)
        }

        Rule::comparison => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| EvalError::Syntax("missing operand".to_string()))?;
            let first = build_expr(first)?;
            let mut rest = Vec::new();
            while let (Some(op), Some(operand)) = (inner.next(), inner.next()) {
                rest.push((cmp_op(op.as_str())?, build_expr(operand)?));
            }
            if rest.is_empty() {
                Ok(first)
            } else {
                Ok(Expr::Compare {
                    first: Box::new(first),
                    rest,
                })
            }
        }

        Rule::additive | Rule::term => {
            let mut inner = pair.into_inner();
            let first = inner
                .next()
                .ok_or_else(|| EvalError::Syntax("missing operand".to_string()))?;
            let mut left = build_expr(first)?;
            while let (Some(op), Some(operand)) = (inner.next(), inner.next()) {
                left = Expr::Binary {
                    op: binary_op(op.as_str())?,
                    left: Box::new(left),
                    right: Box::new(build_expr(operand)?),
                };
            }
            Ok(left)
        }

        Rule::unary => {
            let mut ops = Vec::new();
            let mut operand = None;
            for child in pair.into_inner() {
                match child.as_rule() {
                    Rule::neg_op if child.as_str() == "-" => ops.push(UnaryOp::Neg),
                    Rule::neg_op => ops.push(UnaryOp::Pos),
                    _ => operand = Some(build_expr(child)?),
                }
            }
            let mut expr = operand.ok_or_else(|| EvalError::Syntax("missing operand".to_string()))?;
            for op in ops.into_iter().rev() {
                expr = fold_unary(op, expr);
            }
            Ok(expr)
        }

        Rule::postfix => {
            let mut inner = pair.into_inner();
            let primary = inner
                .next()
                .ok_or_else(|| EvalError::Syntax("missing operand".to_string()))?;
            let mut expr = build_expr(primary)?;
            for suffix in inner {
                expr = match suffix.as_rule() {
                    Rule::call_args => Expr::Call {
                        callee: Box::new(expr),
                        args: suffix
                            .into_inner()
                            .map(build_expr)
                            .collect::<ParseResult<Vec<_>>>()?,
                    },
                    Rule::member => Expr::Member {
                        object: Box::new(expr),
                        property: first_inner(suffix)?.as_str().to_string(),
                    },
                    other => return Err(EvalError::Syntax(format!("unexpected {other:?}"))),
                };
            }
            Ok(expr)
        }

        Rule::list => Ok(Expr::List {
            items: pair
                .into_inner()
                .map(build_expr)
                .collect::<ParseResult<Vec<_>>>()?,
        }),

        Rule::number => {
            let text = pair.as_str();
            if text.contains('.') {
                text.parse::<f64>()
                    .map(|v| Expr::LitNum { v })
                    .map_err(|_| EvalError::Syntax(format!("invalid number '{text}'")))
            } else {
                // Integers too large for i64 fall back to floats
                Ok(match text.parse::<i64>() {
                    Ok(v) => Expr::LitInt { v },
                    Err(_) => Expr::LitNum {
                        v: text.parse::<f64>().unwrap_or(f64::INFINITY),
                    },
                })
            }
        }

        Rule::string => Ok(Expr::LitStr {
            v: first_inner(pair)?.as_str().to_string(),
        }),

        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str().eq_ignore_ascii_case("true"),
        }),

        Rule::none => Ok(Expr::LitNull),

        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
        }),

        other => Err(EvalError::Syntax(format!("unexpected {other:?}"))),
    }
}

/// Negative number literals fold into the literal
fn fold_unary(op: UnaryOp, operand: Expr) -> Expr {
    match (op, operand) {
        (UnaryOp::Neg, Expr::LitInt { v }) if v != i64::MIN => Expr::LitInt { v: -v },
        (UnaryOp::Neg, Expr::LitNum { v }) => Expr::LitNum { v: -v },
        (op, operand) => Expr::Unary {
            op,
            operand: Box::new(operand),
        },
    }
}

fn cmp_op(text: &str) -> ParseResult<CmpOp> {
    Ok(match text {
        "==" => CmpOp::Eq,
        "!=" => CmpOp::Ne,
        "<" => CmpOp::Lt,
        "<=" => CmpOp::Le,
        ">" => CmpOp::Gt,
        ">=" => CmpOp::Ge,
        other => return Err(EvalError::Syntax(format!("unknown comparison '{other}'"))),
    })
}

fn binary_op(text: &str) -> ParseResult<BinaryOp> {
    Ok(match text {
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "//" => BinaryOp::FloorDiv,
        "%" => BinaryOp::Mod,
        other => return Err(EvalError::Syntax(format!("unknown operator '{other}'"))),
    })
}
