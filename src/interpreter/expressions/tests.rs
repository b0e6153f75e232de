use std::collections::{BTreeMap, HashMap};

use super::*;

fn scope() -> HashMap<String, Val> {
    let mut app = BTreeMap::new();
    app.insert("title".to_string(), Val::from("Demo"));
    app.insert("headless".to_string(), Val::Bool(true));

    let mut scope = HashMap::new();
    scope.insert("a".to_string(), Val::from("2"));
    scope.insert("b".to_string(), Val::from("3"));
    scope.insert("name".to_string(), Val::from("World"));
    scope.insert("items".to_string(), Val::List(vec![Val::Int(4), Val::Int(1), Val::Int(7)]));
    scope.insert("app".to_string(), Val::Obj(app));
    scope
}

fn eval(source: &str) -> Val {
    eval_str(source, &scope()).unwrap()
}

fn eval_err(source: &str) -> EvalError {
    eval_str(source, &scope()).unwrap_err()
}

/* ===================== Literals ===================== */

#[test]
fn test_literals() {
    assert_eq!(eval("42"), Val::Int(42));
    assert_eq!(eval("2.5"), Val::Num(2.5));
    assert_eq!(eval("'hi'"), Val::from("hi"));
    assert_eq!(eval("\"hi there\""), Val::from("hi there"));
    assert_eq!(eval("True"), Val::Bool(true));
    assert_eq!(eval("false"), Val::Bool(false));
    assert_eq!(eval("None"), Val::Null);
    assert_eq!(eval("[1, 'x']"), Val::List(vec![Val::Int(1), Val::from("x")]));
}

#[test]
fn test_negative_literal_folds() {
    assert_eq!(parse("-3").unwrap(), Expr::LitInt { v: -3 });
    assert_eq!(eval("--3"), Val::Int(3));
}

/* ===================== Arithmetic ===================== */

#[test]
fn test_int_arithmetic() {
    assert_eq!(eval("int(a) + int(b)"), Val::Int(5));
    assert_eq!(eval("2 + 3 * 4"), Val::Int(14));
    assert_eq!(eval("(2 + 3) * 4"), Val::Int(20));
    assert_eq!(eval("7 // 2"), Val::Int(3));
    assert_eq!(eval("-7 // 2"), Val::Int(-4));
    assert_eq!(eval("-7 % 3"), Val::Int(2));
    assert_eq!(eval("7 % -3"), Val::Int(-2));
}

#[test]
fn test_true_division_is_float() {
    assert_eq!(eval("7 / 2"), Val::Num(3.5));
    assert_eq!(eval("4 / 2"), Val::Num(2.0));
    assert_eq!(eval("float(a) * 1.5"), Val::Num(3.0));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval_err("1 / 0"), EvalError::DivisionByZero);
    assert_eq!(eval_err("1 // 0"), EvalError::DivisionByZero);
    assert_eq!(eval_err("1.0 % 0"), EvalError::DivisionByZero);
}

#[test]
fn test_string_operations() {
    assert_eq!(eval("'Hello ' + name"), Val::from("Hello World"));
    assert_eq!(eval("a + b"), Val::from("23"));
    assert_eq!(eval("'ab' * 3"), Val::from("ababab"));
    assert_eq!(eval("[1] + [2]"), Val::List(vec![Val::Int(1), Val::Int(2)]));
}

#[test]
fn test_oversized_repetition_is_rejected() {
    assert!(matches!(eval_err("'ab' * 9223372036854775807"), EvalError::Type(_)));
    assert!(matches!(eval_err("[1, 2] * 9223372036854775807"), EvalError::Type(_)));
    assert!(matches!(eval_err("'x' * 2000000"), EvalError::Type(_)));
    assert_eq!(safe_eval("[1, 2] * 9223372036854775807", &scope()), None);

    // Negative counts still give empty results
    assert_eq!(eval("'ab' * -1"), Val::from(""));
    assert_eq!(eval("[1] * 0"), Val::List(Vec::new()));
    assert_eq!(eval("[] * 9223372036854775807"), Val::List(Vec::new()));
}

#[test]
fn test_mixed_types_are_type_errors() {
    assert!(matches!(eval_err("'a' + 1"), EvalError::Type(_)));
    assert!(matches!(eval_err("-'a'"), EvalError::Type(_)));
}

/* ===================== Comparison and Logic ===================== */

#[test]
fn test_comparisons() {
    assert_eq!(eval("1 < 2"), Val::Bool(true));
    assert_eq!(eval("1 < 2 < 3"), Val::Bool(true));
    assert_eq!(eval("1 < 3 < 2"), Val::Bool(false));
    assert_eq!(eval("1 == 1.0"), Val::Bool(true));
    assert_eq!(eval("name != 'World'"), Val::Bool(false));
    assert_eq!(eval("'abc' < 'abd'"), Val::Bool(true));
    assert!(matches!(eval_err("'a' < 1"), EvalError::Type(_)));
}

#[test]
fn test_logic_returns_operands() {
    assert_eq!(eval("'' or 'fallback'"), Val::from("fallback"));
    assert_eq!(eval("name and 0"), Val::Int(0));
    assert_eq!(eval("not name"), Val::Bool(false));
    assert_eq!(eval("!0"), Val::Bool(true));
    // Right side is never evaluated
    assert_eq!(eval("False and undefined_name"), Val::Bool(false));
}

/* ===================== Names and Members ===================== */

#[test]
fn test_member_access() {
    assert_eq!(eval("app.title"), Val::from("Demo"));
    assert_eq!(eval("app.headless"), Val::Bool(true));
    assert!(matches!(eval_err("app.missing"), EvalError::NoAttribute { .. }));
    assert!(matches!(eval_err("name.upper"), EvalError::NoAttribute { .. }));
}

#[test]
fn test_unknown_name() {
    assert_eq!(eval_err("nope"), EvalError::UnknownName("nope".to_string()));
}

/* ===================== Builtins ===================== */

#[test]
fn test_builtin_functions() {
    assert_eq!(eval("len(name)"), Val::Int(5));
    assert_eq!(eval("len(items)"), Val::Int(3));
    assert_eq!(eval("min(items)"), Val::Int(1));
    assert_eq!(eval("max(3, 9, 2)"), Val::Int(9));
    assert_eq!(eval("sum(items)"), Val::Int(12));
    assert_eq!(eval("abs(-4)"), Val::Int(4));
    assert_eq!(eval("round(2.5)"), Val::Int(2));
    assert_eq!(eval("round(3.5)"), Val::Int(4));
    assert_eq!(eval("round(2.675, 1)"), Val::Num(2.7));
    assert_eq!(eval("str(1.0)"), Val::from("1.0"));
    assert_eq!(eval("bool('')"), Val::Bool(false));
    assert_eq!(eval("int(' 12 ')"), Val::Int(12));
}

#[test]
fn test_conversion_errors() {
    assert!(matches!(eval_err("int('abc')"), EvalError::Conversion { .. }));
    assert!(matches!(eval_err("float('x')"), EvalError::Conversion { .. }));
    assert!(matches!(eval_err("min([])"), EvalError::Type(_)));
}

/* ===================== Sandbox ===================== */

#[test]
fn test_dunder_names_rejected() {
    assert_eq!(
        eval_err("__import__('os')"),
        EvalError::Forbidden("__import__".to_string())
    );
    assert!(matches!(eval_err("app.__class__"), EvalError::Forbidden(_)));
    assert!(matches!(eval_err("app._private"), EvalError::Forbidden(_)));
}

#[test]
fn test_only_builtins_are_callable() {
    assert_eq!(eval_err("open('x')"), EvalError::UnknownFunction("open".to_string()));
    assert_eq!(eval_err("name()"), EvalError::NotCallable("name".to_string()));
    assert!(matches!(eval_err("app.title()"), EvalError::NotCallable(_)));
}

#[test]
fn test_safe_eval_swallows_failures() {
    let scope = scope();
    assert_eq!(safe_eval("__import__('os').system('x')", &scope), None);
    assert_eq!(safe_eval("1 +", &scope), None);
    assert_eq!(safe_eval("", &scope), None);
    assert_eq!(safe_eval("1 + 1", &scope), Some(Val::Int(2)));
}

#[test]
fn test_syntax_errors() {
    assert!(matches!(parse("a = 1"), Err(EvalError::Syntax(_))));
    assert!(matches!(parse("(1"), Err(EvalError::Syntax(_))));
}

/* ===================== Display ===================== */

#[test]
fn test_display_matches_script_conventions() {
    assert_eq!(Val::Bool(true).to_string(), "True");
    assert_eq!(Val::Null.to_string(), "None");
    assert_eq!(Val::Num(3.0).to_string(), "3.0");
    assert_eq!(Val::Num(0.25).to_string(), "0.25");
    assert_eq!(
        Val::List(vec![Val::from("a"), Val::Int(1)]).to_string(),
        "['a', 1]"
    );
}

#[test]
fn test_json_conversion() {
    let json = serde_json::json!({"n": 1, "f": 1.5, "s": "x", "l": [true, null]});
    let val = Val::from_json(&json);
    assert_eq!(val.to_json(), json);
}

#[test]
fn test_ast_serializes() {
    let expr = parse("a + 1 < 3").unwrap();
    let text = serde_json::to_string(&expr).unwrap();
    let back: Expr = serde_json::from_str(&text).unwrap();
    assert_eq!(back, expr);
}
