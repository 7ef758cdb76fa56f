//! # Expression Evaluator
//!
//! Evaluates the expression runs produced by the [segment parser](crate::segments)
//! against a [`Context`].
//!
//! ## Grammar
//!
//! A closed, Python-flavoured subset. Lowest precedence first:
//!
//! | Level | Forms |
//! |-------|-------|
//! | conditional | `a if cond else b` |
//! | boolean | `or`, `and`, `not` |
//! | comparison | `== != < <= > >= in, not in, is, is not` (chained) |
//! | arithmetic | `+ -`, then `* / // %`, then unary `- +` |
//! | postfix | `x.field`, `x[i]`, `f(a, key=b)` |
//! | atoms | numbers, `'str'`/`"str"`, `True False None` (or `true false null`), names, `( )`, `[a, b]` |
//!
//! ## Failure model
//!
//! Each expression fails softly: any [`EvalError`] is logged together with the
//! offending expression text and the expression's value becomes null. One bad
//! expression never aborts a render.
//!
//! ```rust
//! use keml::context::Context;
//! use keml::expr::fstr;
//! use keml::value::Value;
//!
//! let ctx = Context::from_bindings([("name", Value::from("World"))]);
//! assert_eq!(fstr("Hello {name}!", &ctx), Value::from("Hello World!"));
//! assert_eq!(fstr("{ 1 + 1 }", &ctx), Value::Int(2));
//! assert_eq!(fstr("{ missing }", &ctx), Value::Null);
//! ```

mod ast;
mod eval;
mod lexer;
#[cfg(test)]
mod tests;

pub use ast::{parse, BinaryOp, CmpOp, Expr, UnaryOp};

use tracing::warn;

use crate::context::Context;
use crate::error::EvalError;
use crate::segments::{self, Segment};
use crate::value::Value;

/// Parse and evaluate a single expression, surfacing the error
pub fn eval_expr(src: &str, ctx: &Context) -> Result<Value, EvalError> {
    let expr = ast::parse(src.trim())?;
    eval::eval(&expr, ctx)
}

/// Outcome of one expression: a value plus the diagnostic that replaced it with null
#[derive(Debug, Clone, PartialEq)]
pub struct Soft {
    pub value: Value,
    pub diagnostic: Option<EvalError>,
}

/// Evaluate one expression, recovering from failure with null
pub fn eval_soft(src: &str, ctx: &Context) -> Soft {
    match eval_expr(src, ctx) {
        Ok(value) => Soft {
            value,
            diagnostic: None,
        },
        Err(error) => {
            warn!(expression = %src.trim(), error = %error, "Expression evaluation failed");
            Soft {
                value: Value::Null,
                diagnostic: Some(error),
            }
        }
    }
}

/// One value per segment: literals stay text, expressions are evaluated
pub fn evaluate(segments: &[Segment], ctx: &Context) -> Vec<Value> {
    segments
        .iter()
        .map(|segment| {
            if segment.expression {
                eval_soft(&segment.text, ctx).value
            } else {
                Value::Str(segment.text.clone())
            }
        })
        .collect()
}

/// Collapse evaluated segments.
///
/// A single value is returned unconverted so booleans and records survive into
/// attribute and control-tag logic; several values are stringified (null as
/// empty) and concatenated; no values yield null.
#[must_use]
pub fn join(values: Vec<Value>) -> Value {
    match values.len() {
        0 => Value::Null,
        1 => values.into_iter().next().unwrap_or_default(),
        _ => Value::Str(values.iter().map(Value::render).collect()),
    }
}

/// `join(evaluate(parse(template)))`: the entry point for any string that may
/// embed `{ ... }` expressions
pub fn fstr(template: &str, ctx: &Context) -> Value {
    join(evaluate(&segments::parse(template), ctx))
}
