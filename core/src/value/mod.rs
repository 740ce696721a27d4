//! Immutable value model
//!
//! Every value is immutable once built. Composite values hold their members behind
//! `Arc`, so building a new set, array or tuple out of existing values shares the
//! members instead of copying them, and values can be sent across threads freely.
//!
//! Equality, ordering and hashing are structural and mutually consistent:
//! - values of different kinds are never equal and order by a fixed kind rank
//! - numbers compare by magnitude (`0 = -0`)
//! - strings compare by code point
//! - tuples, arrays and sets compare member by member in canonical order

mod array;
mod function;
pub(crate) mod number;
mod set;
mod tree;
mod tuple;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::Result;

pub use array::{Array, INDEX, ITEM};
pub use function::{Closure, Function, Native, NativeFn};
pub use set::Set;
pub use tree::Tree;
pub use tuple::{fmt_name, Tuple};

/// A runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    /// The null sentinel, equal only to itself.
    None,
    Number(f64),
    String(Arc<str>),
    Tuple(Tuple),
    Array(Array),
    /// A set of distinct values. A set of same-shaped tuples is a relation.
    Set(Set),
    /// Markup element.
    Tree(Tree),
    Function(Function),
}

/* ===================== Construction ===================== */

impl Value {
    pub fn number(n: f64) -> Value {
        Value::Number(n)
    }

    pub fn string(s: impl AsRef<str>) -> Value {
        Value::String(Arc::from(s.as_ref()))
    }

    /// Relational truth: `{()}` for true and `{}` for false.
    pub fn bool(b: bool) -> Value {
        if b {
            Value::Set(Set::from_iter([Value::Tuple(Tuple::new())]))
        } else {
            Value::Set(Set::new())
        }
    }

    pub fn set(values: impl IntoIterator<Item = Value>) -> Value {
        Value::Set(values.into_iter().collect())
    }

    pub fn array(values: impl IntoIterator<Item = Value>) -> Value {
        Value::Array(values.into_iter().collect())
    }

    /// Builds a tuple, failing if a name repeats.
    pub fn tuple<K: Into<String>>(attrs: impl IntoIterator<Item = (K, Value)>) -> Result<Value> {
        Ok(Value::Tuple(Tuple::from_pairs(attrs)?))
    }

    /// Builds a relation from rows zipped against `names`.
    pub fn relation<K: AsRef<str>>(
        names: &[K],
        rows: impl IntoIterator<Item = Vec<Value>>,
    ) -> Result<Value> {
        let tuples = rows
            .into_iter()
            .map(|row| Tuple::from_row(names, row))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Set(Set::relation(tuples)?))
    }
}

/* ===================== Inspection ===================== */

impl Value {
    /// Name of the value's kind, used in failure messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Tuple(_) => "tuple",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Tree(_) => "tree",
            Value::Function(_) => "function",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::None => 0,
            Value::Number(_) => 1,
            Value::String(_) => 2,
            Value::Tuple(_) => 3,
            Value::Array(_) => 4,
            Value::Set(_) => 5,
            Value::Tree(_) => 6,
            Value::Function(_) => 7,
        }
    }

    /// None, zero, the empty string and empty collections are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Set(s) => !s.is_empty(),
            Value::Tuple(_) | Value::Tree(_) | Value::Function(_) => true,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&Tuple> {
        match self {
            Value::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&Set> {
        match self {
            Value::Set(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }
}

/* ===================== Equality, Order, Hash ===================== */

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::None, Value::None) => Ordering::Equal,
            (Value::Number(a), Value::Number(b)) => number::compare(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Tuple(a), Value::Tuple(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Set(a), Value::Set(b)) => a.cmp(b),
            (Value::Tree(a), Value::Tree(b)) => a.cmp(b),
            (Value::Function(a), Value::Function(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u8(self.rank());
        match self {
            Value::None => {}
            Value::Number(n) => number::hash_bits(*n).hash(state),
            Value::String(s) => s.hash(state),
            Value::Tuple(t) => t.hash(state),
            Value::Array(a) => a.hash(state),
            Value::Set(s) => s.hash(state),
            Value::Tree(t) => t.hash(state),
            Value::Function(f) => f.hash(state),
        }
    }
}

/* ===================== Conversions ===================== */

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Tuple> for Value {
    fn from(t: Tuple) -> Self {
        Value::Tuple(t)
    }
}

impl From<Set> for Value {
    fn from(s: Set) -> Self {
        Value::Set(s)
    }
}

impl From<Array> for Value {
    fn from(a: Array) -> Self {
        Value::Array(a)
    }
}

/* ===================== Rendering ===================== */

/// Writes `s` as a double-quoted string literal.
pub(crate) fn fmt_quoted(f: &mut fmt::Formatter<'_>, s: &str, quote: char) -> fmt::Result {
    write!(f, "{quote}")?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{c}")?,
            c => write!(f, "{c}")?,
        }
    }
    write!(f, "{quote}")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Number(n) => f.write_str(&number::format(*n)),
            Value::String(s) => fmt_quoted(f, s, '"'),
            Value::Tuple(t) => write!(f, "{t}"),
            Value::Array(a) => write!(f, "{a}"),
            Value::Set(s) => write!(f, "{s}"),
            Value::Tree(t) => write!(f, "{t}"),
            Value::Function(func) => write!(f, "{func}"),
        }
    }
}
