//! Value model tests - equality, ordering, hashing and rendering

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::*;
use crate::error::Failure;

fn num(n: f64) -> Value {
    Value::number(n)
}

fn hash_of(v: &Value) -> u64 {
    let mut h = DefaultHasher::new();
    v.hash(&mut h);
    h.finish()
}

fn tuple(pairs: &[(&str, Value)]) -> Value {
    Value::tuple(pairs.iter().map(|(k, v)| (*k, v.clone()))).expect("Should build tuple")
}

/* ===================== Equality ===================== */

#[test]
fn test_zero_equals_negative_zero() {
    assert_eq!(num(0.0), num(-0.0));
    assert_eq!(hash_of(&num(0.0)), hash_of(&num(-0.0)));
}

#[test]
fn test_nan_equals_itself() {
    assert_eq!(num(f64::NAN), num(f64::NAN));
    assert_eq!(hash_of(&num(f64::NAN)), hash_of(&num(f64::NAN)));
}

#[test]
fn test_cross_kind_never_equal() {
    assert_ne!(num(0.0), Value::None);
    assert_ne!(Value::string(""), Value::set([]));
    assert_ne!(Value::array([]), Value::set([]));
    assert_ne!(tuple(&[]), Value::set([]));
}

#[test]
fn test_set_dedupes_structurally() {
    let set = Value::set([num(1.0), num(1.0), num(-0.0), num(0.0)]);
    assert_eq!(set.as_set().map(Set::len), Some(2));
}

#[test]
fn test_set_equality_ignores_insertion_order() {
    let a = Value::set([num(3.0), num(1.0), num(2.0)]);
    let b = Value::set([num(1.0), num(2.0), num(3.0)]);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_tuple_duplicate_name() {
    let err = Value::tuple([("a", num(1.0)), ("a", num(2.0))]).unwrap_err();
    assert_eq!(err, Failure::DuplicateAttribute("a".to_string()));
}

/* ===================== Ordering ===================== */

#[test]
fn test_kind_rank_order() {
    let mut values = vec![
        Value::set([]),
        Value::array([]),
        tuple(&[]),
        Value::string("a"),
        num(1.0),
        Value::None,
    ];
    values.sort();
    let kinds: Vec<_> = values.iter().map(Value::kind).collect();
    assert_eq!(kinds, ["none", "number", "string", "tuple", "array", "set"]);
}

#[test]
fn test_string_order_by_code_point() {
    assert!(Value::string("B") < Value::string("a"));
    assert!(Value::string("a") < Value::string("ab"));
}

/* ===================== Truthiness ===================== */

#[test]
fn test_truthiness() {
    assert!(!Value::None.truthy());
    assert!(!num(0.0).truthy());
    assert!(!Value::string("").truthy());
    assert!(!Value::set([]).truthy());
    assert!(!Value::array([]).truthy());
    assert!(tuple(&[]).truthy());
    assert!(Value::bool(true).truthy());
    assert!(!Value::bool(false).truthy());
}

/* ===================== Relations ===================== */

#[test]
fn test_relation_shape_mismatch() {
    let a = Tuple::from_pairs([("a", num(1.0))]).expect("Should build tuple");
    let b = Tuple::from_pairs([("b", num(1.0))]).expect("Should build tuple");
    let err = Set::relation([a, b]).unwrap_err();
    assert!(matches!(err, Failure::ShapeMismatch(_)));
}

#[test]
fn test_relation_row_arity() {
    let err = Value::relation(&["a", "b"], [vec![num(1.0)]]).unwrap_err();
    assert!(matches!(err, Failure::ShapeMismatch(_)));
}

#[test]
fn test_relation_with_checks_shape() {
    let rel = Value::relation(&["a"], [vec![num(1.0)]]).expect("Should build relation");
    let set = rel.as_set().expect("relation is a set");
    assert!(set.with(tuple(&[("a", num(2.0))])).is_ok());
    assert!(matches!(
        set.with(tuple(&[("b", num(2.0))])),
        Err(Failure::ShapeMismatch(_))
    ));
}

#[test]
fn test_join() {
    let left = Value::relation(&["a", "b"], [vec![num(1.0), num(2.0)], vec![num(3.0), num(4.0)]])
        .expect("Should build relation");
    let right = Value::relation(&["b", "c"], [vec![num(2.0), num(5.0)]]).expect("Should build relation");
    let joined = left
        .as_set()
        .zip(right.as_set())
        .map(|(l, r)| l.join(r))
        .expect("both sets")
        .expect("Should join");
    let expected = Value::relation(&["a", "b", "c"], [vec![num(1.0), num(2.0), num(5.0)]])
        .expect("Should build relation");
    assert_eq!(Value::Set(joined), expected);
}

#[test]
fn test_nest_and_unnest() {
    let rel = Value::relation(
        &["k", "v"],
        [
            vec![num(1.0), num(10.0)],
            vec![num(1.0), num(11.0)],
            vec![num(2.0), num(20.0)],
        ],
    )
    .expect("Should build relation");
    let set = rel.as_set().expect("relation is a set");
    let nested = set.nest(&["v".to_string()], "vs").expect("Should nest");
    assert_eq!(nested.len(), 2);
    assert_eq!(nested.unnest("vs").expect("Should unnest"), *set);
}

#[test]
fn test_power_set() {
    let set = Set::from_iter([num(1.0), num(2.0)]);
    let power = set.power_set();
    assert_eq!(power.len(), 4);
    assert!(power.contains(&Value::set([])));
    assert!(power.contains(&Value::Set(set)));
}

/* ===================== Arrays ===================== */

#[test]
fn test_array_set_form() {
    let array = Array::from_iter([Value::string("x"), Value::string("y")]);
    let set = array.to_set();
    assert_eq!(
        Value::Set(set.clone()),
        Value::relation(
            &[INDEX, ITEM],
            [vec![num(0.0), Value::string("x")], vec![num(1.0), Value::string("y")]]
        )
        .expect("Should build relation")
    );
    assert_eq!(Array::from_set(&set).expect("Should convert back"), array);
}

#[test]
fn test_array_from_set_with_gap() {
    let set = Value::relation(&[INDEX, ITEM], [vec![num(1.0), Value::None]]).expect("Should build relation");
    assert!(Array::from_set(set.as_set().expect("set")).is_err());
}

/* ===================== Rendering ===================== */

#[test]
fn test_display_scalars() {
    assert_eq!(Value::None.to_string(), "none");
    assert_eq!(num(42.0).to_string(), "42");
    assert_eq!(num(-0.0).to_string(), "0");
    assert_eq!(num(2.5).to_string(), "2.5");
    assert_eq!(Value::string("a\"b").to_string(), r#""a\"b""#);
}

#[test]
fn test_display_composites() {
    assert_eq!(tuple(&[("a", num(1.0)), ("b c", num(2.0))]).to_string(), "(a: 1, 'b c': 2)");
    assert_eq!(Value::array([num(1.0), num(2.0)]).to_string(), "[1, 2]");
    assert_eq!(Value::set([num(2.0), num(1.0)]).to_string(), "{1, 2}");
    assert_eq!(Value::bool(true).to_string(), "{()}");
    assert_eq!(Value::bool(false).to_string(), "{}");
}

#[test]
fn test_display_relation() {
    let rel = Value::relation(&["a", "b"], [vec![num(3.0), num(4.0)], vec![num(1.0), num(2.0)]])
        .expect("Should build relation");
    assert_eq!(rel.to_string(), "{|a, b| (1, 2), (3, 4)}");
}

#[test]
fn test_display_tree() {
    let tree = Tree::new(
        "p",
        [("x", num(1.0))],
        vec![Value::string("a & b"), Value::Tree(Tree::new::<String>("br", [], vec![]).expect("tree"))],
    )
    .expect("Should build tree");
    assert_eq!(Value::Tree(tree).to_string(), "<p x=1>a &amp; b<br/></p>");
}

#[test]
fn test_native_function_identity() {
    let f = Function::native("id", Ok);
    let g = Function::native("id", |v| Ok(v));
    assert_eq!(Value::Function(f.clone()), Value::Function(g));
    assert_eq!(f.to_string(), "<native id>");
    assert_eq!(f.call(num(7.0)).expect("Should call"), num(7.0));
}
