//! Labeled syntax trees
//!
//! A grammar-neutral view of a pest parse: every branch maps rule names to the
//! pairs matched under them, and every pair without inner pairs is a leaf holding
//! its matched text. Trees from the built-in grammar and from runtime grammars
//! (`pest_vm`) share this representation.

use std::collections::BTreeMap;
use std::fmt;

use pest::iterators::Pair;
use pest::RuleType;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Branch(BTreeMap<String, Children>),
    Leaf { text: String, offset: usize },
}

/// The nodes matched under one name within a branch.
#[derive(Clone, Debug, PartialEq)]
pub enum Children {
    One(Box<Node>),
    Many(Vec<Node>),
}

impl Node {
    /// Groups `pairs` by rule name into a branch.
    pub fn from_pairs<'i, R, I, F>(pairs: I, name: F) -> Node
    where
        R: RuleType,
        I: IntoIterator<Item = Pair<'i, R>>,
        F: Fn(R) -> String + Copy,
    {
        let mut slots: BTreeMap<String, Vec<Node>> = BTreeMap::new();
        for pair in pairs {
            slots
                .entry(name(pair.as_rule()))
                .or_default()
                .push(Node::from_pair(pair, name));
        }
        Node::Branch(
            slots
                .into_iter()
                .map(|(slot, mut nodes)| {
                    let children = if nodes.len() == 1 {
                        Children::One(Box::new(nodes.remove(0)))
                    } else {
                        Children::Many(nodes)
                    };
                    (slot, children)
                })
                .collect(),
        )
    }

    fn from_pair<R, F>(pair: Pair<'_, R>, name: F) -> Node
    where
        R: RuleType,
        F: Fn(R) -> String + Copy,
    {
        let mut inner = pair.clone().into_inner().peekable();
        if inner.peek().is_none() {
            return Node::Leaf {
                text: pair.as_str().to_string(),
                offset: pair.as_span().start(),
            };
        }
        Node::from_pairs(inner, name)
    }

    pub fn leaf(text: impl Into<String>) -> Node {
        Node::Leaf {
            text: text.into(),
            offset: 0,
        }
    }

    /// The node under `slot` when exactly one was matched.
    pub fn one(&self, slot: &str) -> Option<&Node> {
        match self {
            Node::Branch(slots) => match slots.get(slot)? {
                Children::One(node) => Some(node),
                Children::Many(_) => None,
            },
            Node::Leaf { .. } => None,
        }
    }

    /// All nodes under `slot`.
    pub fn many(&self, slot: &str) -> Vec<&Node> {
        match self {
            Node::Branch(slots) => match slots.get(slot) {
                Some(Children::One(node)) => vec![node.as_ref()],
                Some(Children::Many(nodes)) => nodes.iter().collect(),
                None => Vec::new(),
            },
            Node::Leaf { .. } => Vec::new(),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Leaf { text, .. } => Some(text),
            Node::Branch(_) => None,
        }
    }

    /// Structural equality ignoring leaf offsets.
    pub fn content_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Leaf { text: a, .. }, Node::Leaf { text: b, .. }) => a == b,
            (Node::Branch(a), Node::Branch(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|((ka, ca), (kb, cb))| ka == kb && ca.content_eq(cb))
            }
            _ => false,
        }
    }
}

impl Children {
    pub fn content_eq(&self, other: &Children) -> bool {
        match (self, other) {
            (Children::One(a), Children::One(b)) => a.content_eq(b),
            (Children::Many(a), Children::Many(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.content_eq(y))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf { text, .. } => write!(f, "{text:?}"),
            Node::Branch(slots) => {
                f.write_str("(")?;
                for (i, (slot, children)) in slots.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match children {
                        Children::One(node) => write!(f, "{slot}: {node}")?,
                        Children::Many(nodes) => {
                            write!(f, "{slot}: [")?;
                            for (j, node) in nodes.iter().enumerate() {
                                if j > 0 {
                                    f.write_str(", ")?;
                                }
                                write!(f, "{node}")?;
                            }
                            f.write_str("]")?;
                        }
                    }
                }
                f.write_str(")")
            }
        }
    }
}
