//! Expression evaluation
//!
//! Evaluates an AST against a read-only scope. Names starting with `__` and
//! attributes starting with `_` are rejected, and only allowlisted builtin
//! functions can be called, so nothing outside the scope is reachable.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::ast::{BinaryOp, CmpOp, Expr, LogicalOp, UnaryOp};
use super::stdlib::{call_builtin, BuiltinFunc};
use super::values::{Number, Val};
use super::EvalError;

pub type EvalResult = Result<Val, EvalError>;

/// Evaluate an expression to a value
pub fn evaluate(expr: &Expr, scope: &HashMap<String, Val>) -> EvalResult {
    match expr {
        Expr::LitNull => Ok(Val::Null),
        Expr::LitBool { v } => Ok(Val::Bool(*v)),
        Expr::LitInt { v } => Ok(Val::Int(*v)),
        Expr::LitNum { v } => Ok(Val::Num(*v)),
        Expr::LitStr { v } => Ok(Val::Str(v.clone())),

        Expr::List { items } => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Val::List),

        Expr::Ident { name } => {
            if name.starts_with("__") {
                return Err(EvalError::Forbidden(name.clone()));
            }
            scope
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownName(name.clone()))
        }

        Expr::Member { object, property } => {
            if property.starts_with('_') {
                return Err(EvalError::Forbidden(property.clone()));
            }
            match evaluate(object, scope)? {
                Val::Obj(fields) => {
                    fields
                        .get(property)
                        .cloned()
                        .ok_or_else(|| EvalError::NoAttribute {
                            object: "dict".to_string(),
                            property: property.clone(),
                        })
                }
                other => Err(EvalError::NoAttribute {
                    object: other.type_name().to_string(),
                    property: property.clone(),
                }),
            }
        }

        Expr::Call { callee, args } => {
            let Expr::Ident { name } = callee.as_ref() else {
                return Err(EvalError::NotCallable(describe_callee(callee)));
            };
            if name.starts_with("__") {
                return Err(EvalError::Forbidden(name.clone()));
            }
            let Some(func) = BuiltinFunc::from_name(name) else {
                return Err(if scope.contains_key(name) {
                    EvalError::NotCallable(name.clone())
                } else {
                    EvalError::UnknownFunction(name.clone())
                });
            };
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_builtin(func, &args)
        }

        Expr::Unary { op, operand } => unary(*op, evaluate(operand, scope)?),

        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            binary(*op, &left, &right)
        }

        Expr::Compare { first, rest } => {
            let mut left = evaluate(first, scope)?;
            for (op, expr) in rest {
                let right = evaluate(expr, scope)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Val::Bool(false));
                }
                left = right;
            }
            Ok(Val::Bool(true))
        }

        // Short-circuits and yields the deciding operand
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, scope)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => evaluate(right, scope),
            }
        }
    }
}

fn describe_callee(expr: &Expr) -> String {
    match expr {
        Expr::Member { property, .. } => property.clone(),
        Expr::Ident { name } => name.clone(),
        _ => "expression".to_string(),
    }
}

/* ===================== Operators ===================== */

fn unary(op: UnaryOp, value: Val) -> EvalResult {
    if op == UnaryOp::Not {
        return Ok(Val::Bool(!value.is_truthy()));
    }
    match (op, value.as_number()) {
        (UnaryOp::Pos, Some(Number::Int(i))) => Ok(Val::Int(i)),
        (UnaryOp::Pos, Some(Number::Float(f))) => Ok(Val::Num(f)),
        (UnaryOp::Neg, Some(Number::Int(i))) => i
            .checked_neg()
            .map(Val::Int)
            .ok_or_else(|| EvalError::Type("integer overflow".to_string())),
        (UnaryOp::Neg, Some(Number::Float(f))) => Ok(Val::Num(-f)),
        _ => Err(EvalError::Type(format!(
            "bad operand type for unary {}: '{}'",
            if op == UnaryOp::Neg { "-" } else { "+" },
            value.type_name()
        ))),
    }
}

fn unsupported(op: BinaryOp, left: &Val, right: &Val) -> EvalError {
    EvalError::Type(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn overflow() -> EvalError {
    EvalError::Type("integer overflow".to_string())
}

/// Largest string (bytes) or list (items) a repetition may produce
pub const MAX_REPEAT_LEN: usize = 1 << 20;

/// Repetition count for `len * count`, rejecting results above the cap
fn repeat_count(len: usize, count: i64) -> Result<usize, EvalError> {
    let count = usize::try_from(count).unwrap_or(0);
    if len == 0 {
        return Ok(0);
    }
    match len.checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_LEN => Ok(count),
        _ => Err(EvalError::Type(format!(
            "repetition result too large (limit {MAX_REPEAT_LEN})"
        ))),
    }
}

fn repeat<T: Clone>(items: &[T], count: i64) -> Result<Vec<T>, EvalError> {
    let count = repeat_count(items.len(), count)?;
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    Ok(out)
}

/// Apply an arithmetic operator with integer/float promotion
pub(crate) fn binary(op: BinaryOp, left: &Val, right: &Val) -> EvalResult {
    match (left, right) {
        (Val::Str(a), Val::Str(b)) if op == BinaryOp::Add => return Ok(Val::Str(format!("{a}{b}"))),
        (Val::List(a), Val::List(b)) if op == BinaryOp::Add => {
            return Ok(Val::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (Val::Str(s), Val::Int(n)) | (Val::Int(n), Val::Str(s)) if op == BinaryOp::Mul => {
            return Ok(Val::Str(s.repeat(repeat_count(s.len(), *n)?)))
        }
        (Val::List(items), Val::Int(n)) | (Val::Int(n), Val::List(items)) if op == BinaryOp::Mul => {
            return repeat(items, *n).map(Val::List)
        }
        _ => {}
    }

    let (Some(a), Some(b)) = (left.as_number(), right.as_number()) else {
        return Err(unsupported(op, left, right));
    };

    match (a, b) {
        (Number::Int(a), Number::Int(b)) => int_binary(op, a, b),
        (a, b) => float_binary(op, a.as_f64(), b.as_f64()),
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64) -> EvalResult {
    let value = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            return Ok(Val::Num(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let q = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                q - 1
            } else {
                q
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let r = a.checked_rem(b).ok_or_else(overflow)?;
            if r != 0 && ((r < 0) != (b < 0)) {
                r + b
            } else {
                r
            }
        }
    };
    Ok(Val::Int(value))
}

fn float_binary(op: BinaryOp, a: f64, b: f64) -> EvalResult {
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div | BinaryOp::FloorDiv | BinaryOp::Mod if b == 0.0 => {
            return Err(EvalError::DivisionByZero)
        }
        BinaryOp::Div => a / b,
        BinaryOp::FloorDiv => (a / b).floor(),
        BinaryOp::Mod => {
            let r = a % b;
            if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                r + b
            } else {
                r
            }
        }
    };
    Ok(Val::Num(value))
}

/* ===================== Comparison ===================== */

fn values_equal(left: &Val, right: &Val) -> bool {
    match (left.as_number(), right.as_number()) {
        (Some(Number::Int(a)), Some(Number::Int(b))) => a == b,
        (Some(a), Some(b)) => a.as_f64() == b.as_f64(),
        _ => match (left, right) {
            (Val::List(a), Val::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
            }
            _ => left == right,
        },
    }
}

/// Ordering for `<`-style comparisons, `min` and `max`
pub(crate) fn order(left: &Val, right: &Val) -> Result<Ordering, EvalError> {
    let mismatch = || {
        EvalError::Type(format!(
            "'<' not supported between instances of '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))
    };

    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match (a, b) {
            (Number::Int(a), Number::Int(b)) => Ok(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()).ok_or_else(mismatch),
        };
    }

    match (left, right) {
        (Val::Str(a), Val::Str(b)) => Ok(a.cmp(b)),
        (Val::List(a), Val::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                match order(x, y)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => Err(mismatch()),
    }
}

fn compare(op: CmpOp, left: &Val, right: &Val) -> Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Eq => values_equal(left, right),
        CmpOp::Ne => !values_equal(left, right),
        CmpOp::Lt => order(left, right)? == Ordering::Less,
        CmpOp::Le => order(left, right)? != Ordering::Greater,
        CmpOp::Gt => order(left, right)? == Ordering::Greater,
        CmpOp::Ge => order(left, right)? != Ordering::Less,
    })
}
