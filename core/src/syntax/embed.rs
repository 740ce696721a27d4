//! Embedded sub-grammars: `{: grammar . rule : text :}`
//!
//! The grammar is pest source supplied at evaluation time. It is compiled with
//! `pest_meta`, interpreted with `pest_vm`, and the parse of `text` is reflected
//! into a value.

use tracing::debug;

use super::ast::Node;
use super::{parse_failure, reflect};
use crate::error::{Failure, Result};
use crate::value::Value;

/// Parses `text` starting at `rule` of `grammar` and reflects the parse.
pub(crate) fn parse_embedded(grammar: &str, rule: &str, text: &str) -> Result<Value> {
    let (names, rules) = pest_meta::parse_and_optimize(grammar).map_err(|errors| {
        Failure::Grammar(
            errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    })?;
    if !names.contains(&rule) {
        return Err(Failure::Grammar(format!("no rule {rule:?} in grammar")));
    }
    debug!(rule, rules = names.len(), "parsing with embedded grammar");

    let vm = pest_vm::Vm::new(rules);
    let pairs = vm.parse(rule, text).map_err(|e| parse_failure(&e))?;
    Ok(reflect::tree_to_value(&Node::from_pairs(pairs, |r: &str| r.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUM: &str = r#"
        sum = { num ~ ("+" ~ num)* }
        num = @{ ASCII_DIGIT+ }
        WHITESPACE = _{ " " }
    "#;

    #[test]
    fn test_parse_embedded_reflects_tree() {
        let value = parse_embedded(SUM, "sum", "1 + 23").expect("Should parse");
        let expected = Value::tuple([(
            "sum",
            Value::array([Value::tuple([(
                "num*",
                Value::array([Value::string("1"), Value::string("23")]),
            )])
            .expect("tuple")]),
        )])
        .expect("tuple");
        assert_eq!(value, expected);
    }

    #[test]
    fn test_unknown_rule() {
        let err = parse_embedded(SUM, "product", "1").unwrap_err();
        assert!(matches!(err, Failure::Grammar(_)));
    }

    #[test]
    fn test_bad_grammar() {
        let err = parse_embedded("x = { ", "x", "").unwrap_err();
        assert!(matches!(err, Failure::Grammar(_)));
    }

    #[test]
    fn test_text_does_not_match() {
        let err = parse_embedded(SUM, "sum", "+ 1").unwrap_err();
        assert!(matches!(err, Failure::Parse { line: 1, .. }));
    }
}
