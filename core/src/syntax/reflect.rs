//! Reflection between labeled syntax trees and values.
//!
//! A branch becomes a tuple with one attribute per slot. A slot holding one node
//! is named as-is; a slot holding several is suffixed with `*`. Either way the
//! attribute holds an array of the reflected nodes. A leaf becomes its text.

use std::collections::BTreeMap;

use super::ast::{Children, Node};
use crate::error::{Failure, Result};
use crate::value::{Tuple, Value};

const MANY: char = '*';

pub fn tree_to_value(node: &Node) -> Value {
    match node {
        Node::Leaf { text, .. } => Value::string(text),
        Node::Branch(slots) => {
            let attrs: BTreeMap<String, Value> = slots
                .iter()
                .map(|(slot, children)| match children {
                    Children::One(node) => (slot.clone(), Value::array([tree_to_value(node)])),
                    Children::Many(nodes) => (
                        format!("{slot}{MANY}"),
                        Value::array(nodes.iter().map(tree_to_value)),
                    ),
                })
                .collect();
            Value::Tuple(Tuple::from(attrs))
        }
    }
}

pub fn value_to_tree(value: &Value) -> Result<Node> {
    match value {
        Value::String(text) => Ok(Node::leaf(text.as_ref())),
        Value::Tuple(tuple) => {
            let mut slots = BTreeMap::new();
            for (name, attr) in tuple.iter() {
                let nodes = attr
                    .as_array()
                    .ok_or_else(|| unrepresentable(attr))?
                    .iter()
                    .map(value_to_tree)
                    .collect::<Result<Vec<_>>>()?;
                let (slot, children) = match name.strip_suffix(MANY) {
                    Some(slot) => (slot, Children::Many(nodes)),
                    None => {
                        let [node]: [Node; 1] = nodes.try_into().map_err(|_| unrepresentable(attr))?;
                        (name, Children::One(Box::new(node)))
                    }
                };
                slots.insert(slot.to_string(), children);
            }
            Ok(Node::Branch(slots))
        }
        other => Err(unrepresentable(other)),
    }
}

fn unrepresentable(value: &Value) -> Failure {
    Failure::Unrepresentable {
        value: value.to_string(),
        target: "syntax tree",
    }
}
