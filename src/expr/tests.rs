use super::*;
use crate::value::{CallArgs, Value};

fn ctx() -> Context {
    Context::from_bindings([
        ("n", Value::Int(7)),
        ("name", Value::from("Ann")),
        ("items", Value::list(vec!["x", "y", "z"])),
        (
            "user",
            Value::record(vec![
                ("username".into(), "ann".into()),
                ("admin".into(), false.into()),
            ]),
        ),
        (
            "double",
            Value::callable("double", |args: &CallArgs| {
                match args.get(0, "value").and_then(Value::as_i64) {
                    Some(i) => Ok(Value::Int(i * 2)),
                    None => Err(EvalError::Call {
                        callable: "double".into(),
                        message: "expected an int".into(),
                    }),
                }
            }),
        ),
    ])
}

fn ev(src: &str) -> Value {
    eval_expr(src, &ctx()).unwrap()
}

#[test]
fn test_arithmetic() {
    assert_eq!(ev("1 + 1"), Value::Int(2));
    assert_eq!(ev("n * 2 - 4"), Value::Int(10));
    assert_eq!(ev("7 / 2"), Value::Float(3.5));
    assert_eq!(ev("-7 // 2"), Value::Int(-4));
    assert_eq!(ev("7 // -2"), Value::Int(-4));
    assert_eq!(ev("-7 % 3"), Value::Int(2));
    assert_eq!(ev("1.5 + 1"), Value::Float(2.5));
    assert_eq!(ev("'ab' * 2"), Value::from("abab"));
    assert_eq!(ev("(1 + 2) * 3"), Value::Int(9));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval_expr("1 / 0", &ctx()), Err(EvalError::DivisionByZero));
    assert_eq!(eval_expr("1 % 0", &ctx()), Err(EvalError::DivisionByZero));
}

#[test]
fn test_string_repeat_is_bounded() {
    assert_eq!(ev("'ab' * 0"), Value::from(""));
    assert_eq!(ev("'ab' * -3"), Value::from(""));
    assert_eq!(
        eval_expr("'ab' * 9223372036854775807", &ctx()),
        Err(EvalError::Type("repeated string is too long".into()))
    );
    assert_eq!(
        eval_expr("4 * 'abcd' * 8388608", &ctx()),
        Err(EvalError::Type("repeated string is too long".into()))
    );
    assert_eq!(fstr("<{ 'ab' * 9223372036854775807 }>", &ctx()), Value::from("<>"));
}

#[test]
fn test_comparison_and_boolean() {
    assert_eq!(ev("n > 5 and n < 10"), Value::Bool(true));
    assert_eq!(ev("1 < n < 5"), Value::Bool(false));
    assert_eq!(ev("'y' in items"), Value::Bool(true));
    assert_eq!(ev("'q' not in items"), Value::Bool(true));
    assert_eq!(ev("user is None"), Value::Bool(false));
    assert_eq!(ev("not user.admin"), Value::Bool(true));
    // `or` returns the deciding operand
    assert_eq!(ev("'' or name"), Value::from("Ann"));
    assert_eq!(ev("0 and missing"), Value::Int(0));
}

#[test]
fn test_access() {
    assert_eq!(ev("user.username"), Value::from("ann"));
    assert_eq!(ev("user['username']"), Value::from("ann"));
    assert_eq!(ev("items[0]"), Value::from("x"));
    assert_eq!(ev("items[-1]"), Value::from("z"));
    assert_eq!(ev("name[1]"), Value::from("n"));
    assert_eq!(
        eval_expr("items[3]", &ctx()),
        Err(EvalError::IndexOutOfRange(3))
    );
    assert!(matches!(
        eval_expr("user.email", &ctx()),
        Err(EvalError::UnknownField { .. })
    ));
}

#[test]
fn test_calls() {
    assert_eq!(ev("double(n)"), Value::Int(14));
    assert_eq!(ev("double(value=2)"), Value::Int(4));
    assert!(matches!(
        eval_expr("double('x')", &ctx()),
        Err(EvalError::Call { .. })
    ));
    assert_eq!(
        eval_expr("name()", &ctx()),
        Err(EvalError::NotCallable("str"))
    );
}

#[test]
fn test_conditional_expression() {
    assert_eq!(ev("'big' if n > 5 else 'small'"), Value::from("big"));
    assert_eq!(ev("'big' if n > 50 else 'small'"), Value::from("small"));
}

#[test]
fn test_unknown_name() {
    assert_eq!(
        eval_expr("nobody", &ctx()),
        Err(EvalError::UnknownName("nobody".into()))
    );
}

#[test]
fn test_soft_failure_records_diagnostic() {
    let soft = eval_soft("nobody + 1", &ctx());
    assert_eq!(soft.value, Value::Null);
    assert_eq!(soft.diagnostic, Some(EvalError::UnknownName("nobody".into())));
    assert!(eval_soft("n", &ctx()).diagnostic.is_none());
}

#[test]
fn test_fstr_single_value_kept_unconverted() {
    assert_eq!(fstr("{user.admin}", &ctx()), Value::Bool(false));
    assert_eq!(fstr("{ 1 + 1 }", &ctx()), Value::Int(2));
}

#[test]
fn test_fstr_concatenates_multiple() {
    assert_eq!(fstr("n={n}!", &ctx()), Value::from("n=7!"));
    assert_eq!(fstr("[{nobody}]", &ctx()), Value::from("[]"));
}

#[test]
fn test_fstr_literal_and_empty() {
    assert_eq!(fstr("plain", &ctx()), Value::from("plain"));
    assert_eq!(fstr("", &ctx()), Value::Null);
}

#[test]
fn test_join() {
    assert_eq!(join(vec![]), Value::Null);
    assert_eq!(join(vec![Value::Bool(true)]), Value::Bool(true));
    assert_eq!(
        join(vec![Value::from("a"), Value::Null, Value::Int(1)]),
        Value::from("a1")
    );
}

#[test]
fn test_list_literal() {
    assert_eq!(ev("[1, 2] + [3]"), Value::list(vec![1, 2, 3]));
}

#[test]
fn test_no_ambient_builtins() {
    // Only bound names resolve; there is no implicit `len`, `str`, etc.
    assert_eq!(
        eval_expr("len(items)", &ctx()),
        Err(EvalError::UnknownName("len".into()))
    );
}
