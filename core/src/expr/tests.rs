//! Evaluation tests, driven through the compiler

use crate::error::{Failure, Result};
use crate::scope::Scope;
use crate::syntax::parse_source;
use crate::value::Value;

fn eval_in(source: &str, scope: &Scope) -> Result<Value> {
    parse_source(source, "")?.eval(scope)
}

fn eval(source: &str) -> Result<Value> {
    eval_in(source, &Scope::new())
}

fn num(n: f64) -> Value {
    Value::number(n)
}

fn nums(ns: &[f64]) -> impl Iterator<Item = Value> + '_ {
    ns.iter().copied().map(Value::number)
}

/* ===================== Element-wise Operators ===================== */

#[test]
fn test_arrow_maps_into_set() {
    assert_eq!(
        eval("{1, 2, 3} -> . * 2").expect("Should evaluate"),
        Value::set(nums(&[2.0, 4.0, 6.0]))
    );
    // duplicates collapse
    assert_eq!(
        eval("[1, 2, 3] -> . % 2").expect("Should evaluate"),
        Value::set(nums(&[0.0, 1.0]))
    );
}

#[test]
fn test_seq_arrow_keeps_order() {
    assert_eq!(
        eval("[3, 1, 3] >> . + 1").expect("Should evaluate"),
        Value::array(nums(&[4.0, 2.0, 4.0]))
    );
}

#[test]
fn test_merge_arrow() {
    let expected = Value::relation(
        &["a", "b"],
        [vec![num(1.0), num(10.0)], vec![num(2.0), num(20.0)]],
    )
    .expect("relation");
    assert_eq!(
        eval("{|a| (1), (2)} => (b: a * 10)").expect("Should evaluate"),
        expected
    );
    assert!(matches!(
        eval("{1} => (b: 1)"),
        Err(Failure::TypeMismatch { .. })
    ));
}

#[test]
fn test_where_binds_attributes() {
    assert_eq!(
        eval("{1, 2, 3, 4} where . % 2 = 0").expect("Should evaluate"),
        Value::set(nums(&[2.0, 4.0]))
    );
    assert_eq!(
        eval("[(a: 1), (a: 2)] where a > 1").expect("Should evaluate"),
        Value::array([Value::tuple([("a", num(2.0))]).expect("tuple")])
    );
}

#[test]
fn test_order_is_stable() {
    assert_eq!(
        eval("{3, 1, 2} order .").expect("Should evaluate"),
        Value::array(nums(&[1.0, 2.0, 3.0]))
    );
    assert_eq!(
        eval("[(k: 1, v: \"b\"), (k: 0, v: \"z\"), (k: 1, v: \"a\")] order k >> v")
            .expect("Should evaluate"),
        Value::array([Value::string("z"), Value::string("b"), Value::string("a")])
    );
}

#[test]
fn test_aggregates() {
    assert_eq!(eval("{1, 2, 3} sum .").expect("Should evaluate"), num(6.0));
    assert_eq!(eval("[1, 2, 3, 4] median .").expect("Should evaluate"), num(2.5));
    assert_eq!(eval("[5, 1, 3] median .").expect("Should evaluate"), num(3.0));
    assert_eq!(eval("[1, 2] mean .").expect("Should evaluate"), num(1.5));
    assert_eq!(eval("{|a| (3), (5)} max a").expect("Should evaluate"), num(5.0));
    assert_eq!(eval("{|a| (3), (5)} min a").expect("Should evaluate"), num(3.0));
    // projections are not deduplicated
    assert_eq!(eval("{|a| (1), (2)} sum 1").expect("Should evaluate"), num(2.0));
}

#[test]
fn test_empty_aggregates() {
    assert_eq!(eval("{} sum .").expect("Should evaluate"), num(0.0));
    for op in ["mean", "median", "min", "max"] {
        assert!(matches!(
            eval(&format!("{{}} {op} .")),
            Err(Failure::EmptyAggregate(_))
        ));
    }
}

/* ===================== Plain Operators ===================== */

#[test]
fn test_arithmetic() {
    assert_eq!(eval("7 % 3").expect("Should evaluate"), num(1.0));
    assert_eq!(eval("7 -% 3").expect("Should evaluate"), num(6.0));
    assert_eq!(eval("7 // 2").expect("Should evaluate"), num(3.0));
    assert_eq!(eval("-7 // 2").expect("Should evaluate"), num(-4.0));
    assert_eq!(eval("2 ** 10").expect("Should evaluate"), num(1024.0));
    for op in ["/", "%", "-%", "//"] {
        assert_eq!(eval(&format!("1 {op} 0")), Err(Failure::DivisionByZero));
    }
    assert!(matches!(eval("1 + \"a\""), Err(Failure::TypeMismatch { .. })));
}

#[test]
fn test_with() {
    assert_eq!(
        eval("{1, 2} with 3").expect("Should evaluate"),
        Value::set(nums(&[1.0, 2.0, 3.0]))
    );
    assert_eq!(
        eval("(a: 1) with (a: 2, b: 3)").expect("Should evaluate"),
        Value::tuple([("a", num(2.0)), ("b", num(3.0))]).expect("tuple")
    );
    assert_eq!(
        eval("[1] with 1").expect("Should evaluate"),
        Value::array(nums(&[1.0, 1.0]))
    );
    assert!(matches!(
        eval("{|a| (1)} with (b: 1)"),
        Err(Failure::ShapeMismatch(_))
    ));
}

#[test]
fn test_without() {
    assert_eq!(
        eval("{1, 2} without 1").expect("Should evaluate"),
        Value::set(nums(&[2.0]))
    );
    assert_eq!(
        eval("(a: 1, b: 2, c: 3) without {\"a\", \"b\"}").expect("Should evaluate"),
        Value::tuple([("c", num(3.0))]).expect("tuple")
    );
    assert_eq!(
        eval("(a: 1, b: 2) without \"a\"").expect("Should evaluate"),
        Value::tuple([("b", num(2.0))]).expect("tuple")
    );
    assert_eq!(
        eval("[1, 2, 1] without 1").expect("Should evaluate"),
        Value::array(nums(&[2.0]))
    );
}

#[test]
fn test_join() {
    let expected = Value::relation(&["a", "b", "c"], [vec![num(1.0), num(2.0), num(3.0)]])
        .expect("relation");
    assert_eq!(
        eval("{|a, b| (1, 2), (4, 5)} <&> {|b, c| (2, 3)}").expect("Should evaluate"),
        expected
    );
    assert!(matches!(eval("1 <&> {}"), Err(Failure::ShapeMismatch(_))));
}

#[test]
fn test_power_set() {
    assert_eq!(eval("(**{1, 2}) count").expect("Should evaluate"), num(4.0));
}

/* ===================== Access ===================== */

#[test]
fn test_count() {
    assert_eq!(eval("{1, 2, 3} count").expect("Should evaluate"), num(3.0));
    assert_eq!(eval("\"héllo\" count").expect("Should evaluate"), num(5.0));
    assert_eq!(eval("(a: 1, b: 2) count").expect("Should evaluate"), num(2.0));
    assert!(matches!(eval("1 count"), Err(Failure::TypeMismatch { .. })));
}

#[test]
fn test_dot_access() {
    assert_eq!(eval("(a: (b: 4)).a.b").expect("Should evaluate"), num(4.0));
    assert_eq!(
        eval("(a: 1).*").expect("Should evaluate"),
        Value::tuple([("a", num(1.0))]).expect("tuple")
    );
    assert!(matches!(
        eval("(a: 1).b"),
        Err(Failure::NoSuchAttribute { attr, .. }) if attr == "b"
    ));
}

#[test]
fn test_nest_and_unnest() {
    let nested = Value::relation(
        &["a", "bs"],
        [vec![
            num(1.0),
            Value::relation(&["b"], [vec![num(2.0)], vec![num(3.0)]]).expect("relation"),
        ]],
    )
    .expect("relation");
    assert_eq!(
        eval("{|a, b| (1, 2), (1, 3)} nest |b| bs").expect("Should evaluate"),
        nested
    );
    assert_eq!(
        eval("{|a, b| (1, 2), (1, 3)} nest |b| bs unnest bs").expect("Should evaluate"),
        eval("{|a, b| (1, 2), (1, 3)}").expect("Should evaluate")
    );
}

/* ===================== Names and Functions ===================== */

#[test]
fn test_unbound_name() {
    assert_eq!(eval("y"), Err(Failure::UnboundName("y".to_string())));
}

#[test]
fn test_closures_capture_scope() {
    let scope = Scope::new().bind("y", num(10.0));
    assert_eq!(eval_in("(\\x x + y)(1)", &scope).expect("Should evaluate"), num(11.0));
    assert_eq!(
        eval_in("[1, 2] >> (\\x x * y)(.)", &scope).expect("Should evaluate"),
        Value::array(nums(&[10.0, 20.0]))
    );
}

#[test]
fn test_call_requires_function() {
    assert!(matches!(eval("1(2)"), Err(Failure::TypeMismatch { .. })));
}

#[test]
fn test_eval_passes_values_through() {
    assert_eq!(eval("*3").expect("Should evaluate"), num(3.0));
    assert_eq!(eval("*(\\x 7)").expect("Should evaluate"), num(7.0));
}
