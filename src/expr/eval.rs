//! Tree-walking interpreter over [`Expr`].
//!
//! Only names bound in the [`Context`] are reachable; there is no ambient
//! namespace, so a template can call exactly the callables it was given.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::context::Context;
use crate::error::EvalError;
use crate::value::{CallArgs, Value};

use super::ast::{BinaryOp, CmpOp, Expr, UnaryOp};

pub fn eval(expr: &Expr, ctx: &Context) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Name(name) => ctx
            .get(name)
            .cloned()
            .ok_or_else(|| EvalError::UnknownName(name.clone())),
        Expr::Attr(target, field) => {
            let target = eval(target, ctx)?;
            attribute(&target, field)
        }
        Expr::Index(target, index) => {
            let target = eval(target, ctx)?;
            let index = eval(index, ctx)?;
            subscript(&target, &index)
        }
        Expr::Call {
            callee,
            args,
            kwargs,
        } => {
            let callable = match eval(callee, ctx)? {
                Value::Callable(callable) => callable,
                other => return Err(EvalError::NotCallable(other.type_name())),
            };
            let mut call_args = CallArgs::default();
            for arg in args {
                call_args.positional.push(eval(arg, ctx)?);
            }
            for (name, arg) in kwargs {
                call_args.keywords.push((name.clone(), eval(arg, ctx)?));
            }
            callable.call(&call_args)
        }
        Expr::List(items) => {
            let values = items
                .iter()
                .map(|item| eval(item, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::List(Arc::new(values)))
        }
        Expr::Unary(op, operand) => {
            let v = eval(operand, ctx)?;
            unary(*op, v)
        }
        Expr::Binary(op, left, right) => {
            let l = eval(left, ctx)?;
            let r = eval(right, ctx)?;
            binary(*op, &l, &r)
        }
        Expr::Compare(first, rest) => {
            let mut left = eval(first, ctx)?;
            for (op, right) in rest {
                let right = eval(right, ctx)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::And(left, right) => {
            let l = eval(left, ctx)?;
            if l.is_truthy() {
                eval(right, ctx)
            } else {
                Ok(l)
            }
        }
        Expr::Or(left, right) => {
            let l = eval(left, ctx)?;
            if l.is_truthy() {
                Ok(l)
            } else {
                eval(right, ctx)
            }
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, ctx)?.is_truthy() {
                eval(then, ctx)
            } else {
                eval(otherwise, ctx)
            }
        }
    }
}

fn attribute(target: &Value, field: &str) -> Result<Value, EvalError> {
    match target {
        Value::Record(record) => record.get(field).cloned().ok_or_else(|| EvalError::UnknownField {
            field: field.to_string(),
            type_name: "record",
        }),
        other => Err(EvalError::UnknownField {
            field: field.to_string(),
            type_name: other.type_name(),
        }),
    }
}

fn position(index: i64, len: usize) -> Result<usize, EvalError> {
    let len_i = i64::try_from(len).map_err(|_| EvalError::IndexOutOfRange(index))?;
    let resolved = if index < 0 { index + len_i } else { index };
    if (0..len_i).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| EvalError::IndexOutOfRange(index))
    } else {
        Err(EvalError::IndexOutOfRange(index))
    }
}

fn subscript(target: &Value, index: &Value) -> Result<Value, EvalError> {
    match (target, index) {
        (Value::List(items), _) => {
            let i = index.as_i64().ok_or_else(|| {
                EvalError::type_error(format!("list indices must be int, not {}", index.type_name()))
            })?;
            Ok(items[position(i, items.len())?].clone())
        }
        (Value::Str(s), _) => {
            let i = index.as_i64().ok_or_else(|| {
                EvalError::type_error(format!("string indices must be int, not {}", index.type_name()))
            })?;
            let count = s.chars().count();
            let at = position(i, count)?;
            Ok(s.chars().nth(at).map(String::from).into())
        }
        (Value::Record(_), Value::Str(key)) => attribute(target, key),
        (other, _) => Err(EvalError::type_error(format!(
            "'{}' value is not subscriptable",
            other.type_name()
        ))),
    }
}

fn unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::type_error("integer overflow")),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Pos, v @ (Value::Int(_) | Value::Float(_))) => Ok(v),
        (_, v) => Err(EvalError::type_error(format!(
            "bad operand type for unary operator: '{}'",
            v.type_name()
        ))),
    }
}

fn overflow() -> EvalError {
    EvalError::type_error("integer overflow")
}

fn floor_div_int(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let q = a.checked_div(b).ok_or_else(overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn mod_int(a: i64, b: i64) -> Result<i64, EvalError> {
    if b == 0 {
        return Err(EvalError::DivisionByZero);
    }
    let r = a.checked_rem(b).ok_or_else(overflow)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Upper bound in bytes for the result of `str * int`
pub const MAX_REPEAT_LEN: usize = 16 * 1024 * 1024;

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Result<Value, EvalError> {
    use BinaryOp::*;

    // Integer arithmetic stays integral except for true division
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        let (a, b) = (*a, *b);
        return match op {
            Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
            Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
            Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
            Div if b == 0 => Err(EvalError::DivisionByZero),
            Div => Ok(Value::Float(a as f64 / b as f64)),
            FloorDiv => floor_div_int(a, b).map(Value::Int),
            Mod => mod_int(a, b).map(Value::Int),
        };
    }

    match (op, l, r) {
        (Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (Add, Value::List(a), Value::List(b)) => {
            let mut joined = Vec::with_capacity(a.len() + b.len());
            joined.extend(a.iter().cloned());
            joined.extend(b.iter().cloned());
            Ok(Value::List(Arc::new(joined)))
        }
        (Mul, Value::Str(s), Value::Int(n)) | (Mul, Value::Int(n), Value::Str(s)) => {
            let count = usize::try_from(*n).unwrap_or(0);
            match s.len().checked_mul(count) {
                Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(count))),
                _ => Err(EvalError::type_error("repeated string is too long")),
            }
        }
        _ => {
            let (Some(a), Some(b)) = (number(l), number(r)) else {
                return Err(EvalError::type_error(format!(
                    "unsupported operand types for {}: '{}' and '{}'",
                    symbol(op),
                    l.type_name(),
                    r.type_name()
                )));
            };
            match op {
                Add => Ok(Value::Float(a + b)),
                Sub => Ok(Value::Float(a - b)),
                Mul => Ok(Value::Float(a * b)),
                Div | FloorDiv | Mod if b == 0.0 => Err(EvalError::DivisionByZero),
                Div => Ok(Value::Float(a / b)),
                FloorDiv => Ok(Value::Float((a / b).floor())),
                Mod => Ok(Value::Float(a - b * (a / b).floor())),
            }
        }
    }
}

/// Numeric view for mixed arithmetic; booleans count as 0/1
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => v.as_f64(),
        _ => None,
    }
}

fn symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
    }
}

fn order(l: &Value, r: &Value) -> Result<Ordering, EvalError> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::List(a), Value::List(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                match order(x, y)? {
                    Ordering::Equal => continue,
                    other => return Ok(other),
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => match (number(l), number(r)) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .ok_or_else(|| EvalError::type_error("comparison with NaN")),
            _ => Err(EvalError::type_error(format!(
                "ordering not supported between '{}' and '{}'",
                l.type_name(),
                r.type_name()
            ))),
        },
    }
}

fn contains(container: &Value, item: &Value) -> Result<bool, EvalError> {
    match container {
        Value::List(items) | Value::Set(items) => Ok(items.contains(item)),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <str>' requires str as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Record(record) => Ok(item.as_str().is_some_and(|k| record.get(k).is_some())),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn identical(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => Arc::ptr_eq(a, b),
        (Value::Record(a), Value::Record(b)) => Arc::ptr_eq(a, b),
        (Value::Callable(a), Value::Callable(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    }
}

fn compare(op: CmpOp, l: &Value, r: &Value) -> Result<bool, EvalError> {
    Ok(match op {
        CmpOp::Eq => l == r,
        CmpOp::Ne => l != r,
        CmpOp::Lt => order(l, r)? == Ordering::Less,
        CmpOp::Le => order(l, r)? != Ordering::Greater,
        CmpOp::Gt => order(l, r)? == Ordering::Greater,
        CmpOp::Ge => order(l, r)? != Ordering::Less,
        CmpOp::In => contains(r, l)?,
        CmpOp::NotIn => !contains(r, l)?,
        CmpOp::Is => identical(l, r),
        CmpOp::IsNot => !identical(l, r),
    })
}
