//! JSON translation
//!
//! Objects become relations `{|@, @item| (key, value), ...}`, the same shape
//! arrays take in set form, so JSON data can be queried with the relational
//! operators directly. `true` and `false` map to `{()}` and `{}`.

use serde_json::{Map, Number, Value as Json};

use crate::error::{Failure, Result};
use crate::value::{Set, Tuple, Value, INDEX, ITEM};

/// Largest magnitude at which every integer is exactly representable.
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

pub fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::None,
        Json::Bool(b) => Value::bool(*b),
        Json::Number(n) => n.as_f64().map_or(Value::None, Value::Number),
        Json::String(s) => Value::string(s),
        Json::Array(items) => Value::array(items.iter().map(json_to_value)),
        Json::Object(entries) => Value::set(entries.iter().map(|(key, item)| {
            Value::Tuple(
                Tuple::new()
                    .with(INDEX, Value::string(key))
                    .with(ITEM, json_to_value(item)),
            )
        })),
    }
}

/// Inverse of [`json_to_value`]. Values outside its image fail with
/// [`Failure::Unrepresentable`], so a successful translation always reads back
/// as the same value.
pub fn value_to_json(value: &Value) -> Result<Json> {
    match value {
        Value::None => Ok(Json::Null),
        Value::Number(n) => number_to_json(*n).ok_or_else(|| unrepresentable(value)),
        Value::String(s) => Ok(Json::String(s.to_string())),
        Value::Array(items) => items.iter().map(value_to_json).collect::<Result<_>>().map(Json::Array),
        Value::Set(set) => set_to_json(set).ok_or_else(|| unrepresentable(value))?,
        Value::Tuple(_) | Value::Tree(_) | Value::Function(_) => Err(unrepresentable(value)),
    }
}

fn number_to_json(n: f64) -> Option<Json> {
    if n.fract() == 0.0 && n.abs() < MAX_EXACT_INT {
        return Some(Json::from(n as i64));
    }
    Number::from_f64(n).map(Json::Number)
}

/// `None` for sets that are neither booleans nor string-keyed objects.
fn set_to_json(set: &Set) -> Option<Result<Json>> {
    if set.is_empty() {
        return Some(Ok(Json::Bool(false)));
    }
    if set.len() == 1 && set.contains(&Value::Tuple(Tuple::new())) {
        return Some(Ok(Json::Bool(true)));
    }
    if set.shape().is_some_and(|names| names == [INDEX, ITEM]) {
        return keyed_object(set);
    }
    None
}

/// The object for a `{|@, @item|}` relation keyed by strings.
fn keyed_object(set: &Set) -> Option<Result<Json>> {
    let mut entries = Vec::with_capacity(set.len());
    for element in set {
        let tuple = element.as_tuple()?;
        let key = tuple.get(INDEX)?.as_str()?;
        entries.push((key, tuple.get(ITEM)?));
    }
    Some(
        entries
            .into_iter()
            .map(|(key, item)| Ok((key.to_string(), value_to_json(item)?)))
            .collect::<Result<Map<_, _>>>()
            .map(Json::Object),
    )
}

fn unrepresentable(value: &Value) -> Failure {
    Failure::Unrepresentable {
        value: value.to_string(),
        target: "JSON",
    }
}

pub fn from_json_str(text: &str) -> Result<Value> {
    let json: Json = serde_json::from_str(text).map_err(|e| Failure::InvalidJson(e.to_string()))?;
    Ok(json_to_value(&json))
}

pub fn to_json_string(value: &Value) -> Result<String> {
    let json = value_to_json(value)?;
    serde_json::to_string(&json).map_err(|e| Failure::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use maplit::btreemap;
    use serde_json::json;

    use super::*;
    use crate::scope::Scope;
    use crate::syntax::parse_source;

    fn relish(source: &str) -> Value {
        parse_source(source, "")
            .and_then(|e| e.eval(&Scope::new()))
            .expect("Should evaluate")
    }

    fn assert_translates(expected: &str, raw: &str) {
        let value = from_json_str(raw).expect("Should translate");
        assert_eq!(value, relish(expected), "{raw}");
    }

    /* ===================== JSON to Value ===================== */

    #[test]
    fn test_object_to_relation() {
        assert_translates("{}", "{}");
        assert_translates(r#"{|@, @item| ("key", "val")}"#, r#"{"key": "val"}"#);
        assert_translates(r#"{|@, @item| ("key", 123)}"#, r#"{"key": 123}"#);
        assert_translates(
            r#"{|@, @item| ("key", {|@, @item| ("foo", "bar")})}"#,
            r#"{"key": {"foo": "bar"}}"#,
        );
        assert_translates(r#"{|@, @item| ("key", [1, 2, 3])}"#, r#"{"key": [1, 2, 3]}"#);
        assert_translates(r#"{|@, @item| ("key", none)}"#, r#"{"key": null}"#);
        assert_translates(
            r#"{|@, @item| ("key", "val"), ("foo", 123)}"#,
            r#"{"key": "val", "foo": 123}"#,
        );
    }

    #[test]
    fn test_array_to_array() {
        assert_translates("[]", "[]");
        assert_translates(r#"[1, "Hello", none]"#, r#"[1, "Hello", null]"#);
        assert_translates(r#"[{|@, @item| ("foo", "bar")}]"#, r#"[{"foo": "bar"}]"#);
        assert_translates("[[1, 2, 3]]", "[[1, 2, 3]]");
    }

    #[test]
    fn test_scalars() {
        assert_translates("none", "null");
        assert_translates(r#""""#, r#""""#);
        assert_translates(r#""Hello World""#, r#""Hello World""#);
        assert_translates("123", "123");
        assert_translates("1.23", "1.23");
        assert_translates("{()}", "true");
        assert_translates("{}", "false");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(from_json_str("{"), Err(Failure::InvalidJson(_))));
    }

    /* ===================== Value to JSON ===================== */

    #[test]
    fn test_round_trip_of_translated_values() {
        let raw = json!({"a": [1, 2.5, "x", null], "b": {"c": true, "d": false}});
        let value = json_to_value(&raw);
        assert_eq!(value_to_json(&value).expect("Should translate"), raw);
    }

    #[test]
    fn test_values_read_back_unchanged() {
        let values = [
            "none",
            "42",
            "-0.5",
            r#""text""#,
            r#"[1, "a", none]"#,
            "[[1, 2], [], [[3]]]",
            "{}",
            "{()}",
            r#"{|@, @item| ("a", 1), ("b", [{()}, {}])}"#,
            r#"{|@, @item| ("outer", {|@, @item| ("inner", "x")})}"#,
        ];
        for source in values {
            let value = relish(source);
            let json = value_to_json(&value).expect("Should translate");
            assert_eq!(json_to_value(&json), value, "{source}");
        }
    }

    #[test]
    fn test_values_outside_json_image() {
        let values = [
            "(a: 1)",
            "[(a: 1)]",
            "{1, 2}",
            r#"{|@, @item| (0, "x")}"#,
            r#"{|@, @item| ("a", 1), (1, 2)}"#,
            "{|a| (1)}",
            r#"{|@, @item| ("a", (b: 1))}"#,
        ];
        for source in values {
            assert!(
                matches!(value_to_json(&relish(source)), Err(Failure::Unrepresentable { .. })),
                "{source}"
            );
        }
        let tuple = Value::tuple(btreemap! {
            "name" => Value::string("x"),
            "n" => Value::number(3.0),
        })
        .expect("tuple");
        assert!(matches!(value_to_json(&tuple), Err(Failure::Unrepresentable { .. })));
    }

    #[test]
    fn test_unrepresentable_values() {
        assert!(matches!(
            to_json_string(&relish("(a: 1)")),
            Err(Failure::Unrepresentable { .. })
        ));
        assert!(matches!(
            value_to_json(&relish("<a/>")),
            Err(Failure::Unrepresentable { .. })
        ));
        assert!(matches!(
            value_to_json(&relish("\\x x")),
            Err(Failure::Unrepresentable { .. })
        ));
        assert!(matches!(
            value_to_json(&relish("[1 / 3 * 0 + 1e308 * 10]")),
            Err(Failure::Unrepresentable { .. })
        ));
    }

    #[test]
    fn test_to_json_string() {
        assert_eq!(
            to_json_string(&relish(r#"{|@, @item| ("a", [1, 2])}"#)).expect("Should translate"),
            r#"{"a":[1,2]}"#
        );
    }
}
