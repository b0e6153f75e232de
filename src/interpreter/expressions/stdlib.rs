//! Builtin functions callable from binding expressions

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::ast::BinaryOp;
use super::eval::{binary, order, EvalResult};
use super::values::{Number, Val};
use super::EvalError;

/* ===================== Builtin Function Types ===================== */

/// The complete set of callable functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinFunc {
    Str,
    Int,
    Float,
    Bool,
    Len,
    Min,
    Max,
    Abs,
    Round,
    Sum,
}

impl BuiltinFunc {
    pub const ALL: [BuiltinFunc; 10] = [
        BuiltinFunc::Str,
        BuiltinFunc::Int,
        BuiltinFunc::Float,
        BuiltinFunc::Bool,
        BuiltinFunc::Len,
        BuiltinFunc::Min,
        BuiltinFunc::Max,
        BuiltinFunc::Abs,
        BuiltinFunc::Round,
        BuiltinFunc::Sum,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|func| func.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunc::Str => "str",
            BuiltinFunc::Int => "int",
            BuiltinFunc::Float => "float",
            BuiltinFunc::Bool => "bool",
            BuiltinFunc::Len => "len",
            BuiltinFunc::Min => "min",
            BuiltinFunc::Max => "max",
            BuiltinFunc::Abs => "abs",
            BuiltinFunc::Round => "round",
            BuiltinFunc::Sum => "sum",
        }
    }
}

/* ===================== Dispatcher ===================== */

pub fn call_builtin(func: BuiltinFunc, args: &[Val]) -> EvalResult {
    match func {
        BuiltinFunc::Str => Ok(Val::Str(args.first().map(Val::to_string).unwrap_or_default())),
        BuiltinFunc::Int => to_int(args),
        BuiltinFunc::Float => to_float(args),
        BuiltinFunc::Bool => Ok(Val::Bool(args.first().is_some_and(Val::is_truthy))),
        BuiltinFunc::Len => len(args),
        BuiltinFunc::Min => extreme(func, args, Ordering::Less),
        BuiltinFunc::Max => extreme(func, args, Ordering::Greater),
        BuiltinFunc::Abs => abs(args),
        BuiltinFunc::Round => round(args),
        BuiltinFunc::Sum => sum(args),
    }
}

fn arity(func: BuiltinFunc, args: &[Val], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::Type(format!(
            "{}() takes {} to {} arguments ({} given)",
            func.name(),
            min,
            max,
            args.len()
        )));
    }
    Ok(())
}

fn conversion(target: &str, value: &Val) -> EvalError {
    EvalError::Conversion {
        target: target.to_string(),
        value: value.repr(),
    }
}

fn to_int(args: &[Val]) -> EvalResult {
    arity(BuiltinFunc::Int, args, 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(Val::Int(0));
    };
    match value {
        Val::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Val::Int)
            .map_err(|_| conversion("int", value)),
        other => match other.as_number() {
            Some(Number::Int(i)) => Ok(Val::Int(i)),
            Some(Number::Float(f)) if f.is_finite() && f.abs() < i64::MAX as f64 => {
                Ok(Val::Int(f.trunc() as i64))
            }
            _ => Err(conversion("int", other)),
        },
    }
}

fn to_float(args: &[Val]) -> EvalResult {
    arity(BuiltinFunc::Float, args, 0, 1)?;
    let Some(value) = args.first() else {
        return Ok(Val::Num(0.0));
    };
    match value {
        Val::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Val::Num)
            .map_err(|_| conversion("float", value)),
        other => other
            .as_number()
            .map(|n| Val::Num(n.as_f64()))
            .ok_or_else(|| conversion("float", other)),
    }
}

fn len(args: &[Val]) -> EvalResult {
    arity(BuiltinFunc::Len, args, 1, 1)?;
    let count = match &args[0] {
        Val::Str(s) => s.chars().count(),
        Val::List(items) => items.len(),
        Val::Obj(fields) => fields.len(),
        other => {
            return Err(EvalError::Type(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )))
        }
    };
    Ok(Val::Int(count as i64))
}

/// `min`/`max` over one list argument or over several arguments
fn extreme(func: BuiltinFunc, args: &[Val], wanted: Ordering) -> EvalResult {
    let items: &[Val] = match args {
        [Val::List(items)] => items,
        [single] => {
            return Err(EvalError::Type(format!(
                "'{}' object is not iterable",
                single.type_name()
            )))
        }
        _ => args,
    };

    let mut iter = items.iter();
    let Some(mut best) = iter.next() else {
        return Err(EvalError::Type(format!("{}() arg is an empty sequence", func.name())));
    };
    for item in iter {
        if order(item, best)? == wanted {
            best = item;
        }
    }
    Ok(best.clone())
}

fn abs(args: &[Val]) -> EvalResult {
    arity(BuiltinFunc::Abs, args, 1, 1)?;
    match args[0].as_number() {
        Some(Number::Int(i)) => i
            .checked_abs()
            .map(Val::Int)
            .ok_or_else(|| EvalError::Type("integer overflow".to_string())),
        Some(Number::Float(f)) => Ok(Val::Num(f.abs())),
        None => Err(EvalError::Type(format!(
            "bad operand type for abs(): '{}'",
            args[0].type_name()
        ))),
    }
}

/// Half-to-even rounding; `round(x)` is an int, `round(x, n)` keeps the type
fn round(args: &[Val]) -> EvalResult {
    arity(BuiltinFunc::Round, args, 1, 2)?;
    let Some(number) = args[0].as_number() else {
        return Err(EvalError::Type(format!(
            "type {} doesn't define __round__ method",
            args[0].type_name()
        )));
    };

    let digits = match args.get(1) {
        None | Some(Val::Null) => None,
        Some(Val::Int(n)) => Some(*n),
        Some(other) => {
            return Err(EvalError::Type(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            )))
        }
    };

    match (number, digits) {
        (Number::Int(i), _) => Ok(Val::Int(i)),
        (Number::Float(f), None) => {
            let rounded = f.round_ties_even();
            if rounded.is_finite() && rounded.abs() < i64::MAX as f64 {
                Ok(Val::Int(rounded as i64))
            } else {
                Err(conversion("int", &Val::Num(f)))
            }
        }
        (Number::Float(f), Some(n)) => {
            let scale = 10f64.powi(n.clamp(-308, 308) as i32);
            Ok(Val::Num((f * scale).round_ties_even() / scale))
        }
    }
}

fn sum(args: &[Val]) -> EvalResult {
    arity(BuiltinFunc::Sum, args, 1, 2)?;
    let Val::List(items) = &args[0] else {
        return Err(EvalError::Type(format!(
            "'{}' object is not iterable",
            args[0].type_name()
        )));
    };
    let start = args.get(1).cloned().unwrap_or(Val::Int(0));
    if matches!(start, Val::Str(_)) {
        return Err(EvalError::Type("sum() can't sum strings".to_string()));
    }
    items
        .iter()
        .try_fold(start, |total, item| binary(BinaryOp::Add, &total, item))
}
