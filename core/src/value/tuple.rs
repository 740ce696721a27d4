use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::{fmt_quoted, Value};
use crate::error::{Failure, Result};

/// A finite map from attribute names to values.
#[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tuple(Arc<BTreeMap<String, Value>>);

impl From<BTreeMap<String, Value>> for Tuple {
    fn from(attrs: BTreeMap<String, Value>) -> Self {
        Tuple(Arc::new(attrs))
    }
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with [`Failure::DuplicateAttribute`] if a name repeats.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Result<Self> {
        let mut attrs = BTreeMap::new();
        for (name, value) in pairs {
            let name = name.into();
            if attrs.contains_key(&name) {
                return Err(Failure::DuplicateAttribute(name));
            }
            attrs.insert(name, value);
        }
        Ok(Tuple(Arc::new(attrs)))
    }

    /// Zips `names` against a row of values of the same length.
    pub(crate) fn from_row<K: AsRef<str>>(names: &[K], row: Vec<Value>) -> Result<Self> {
        if names.len() != row.len() {
            return Err(Failure::shape(format!(
                "row has {} values for {} attributes",
                row.len(),
                names.len()
            )));
        }
        Tuple::from_pairs(names.iter().map(|n| n.as_ref().to_string()).zip(row))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// A copy with `name` bound to `value`, replacing any previous binding.
    pub fn with(&self, name: impl Into<String>, value: Value) -> Tuple {
        let mut attrs = (*self.0).clone();
        attrs.insert(name.into(), value);
        Tuple(Arc::new(attrs))
    }

    pub fn without(&self, name: &str) -> Tuple {
        if !self.contains(name) {
            return self.clone();
        }
        let mut attrs = (*self.0).clone();
        attrs.remove(name);
        Tuple(Arc::new(attrs))
    }

    /// Union of both tuples; attributes of `other` win.
    pub fn merge(&self, other: &Tuple) -> Tuple {
        if other.is_empty() {
            return self.clone();
        }
        let mut attrs = (*self.0).clone();
        for (k, v) in other.0.iter() {
            attrs.insert(k.clone(), v.clone());
        }
        Tuple(Arc::new(attrs))
    }

    /// True when every attribute the two tuples share has equal values.
    pub fn agrees_with(&self, other: &Tuple) -> bool {
        self.iter()
            .all(|(k, v)| other.get(k).map_or(true, |w| v == w))
    }

    pub fn same_shape(&self, other: &Tuple) -> bool {
        self.len() == other.len() && self.names().zip(other.names()).all(|(a, b)| a == b)
    }

    /// Splits into the attributes named in `names` and the rest.
    pub(crate) fn split(&self, names: &[String]) -> (Tuple, Tuple) {
        let (inner, outer): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .partition(|(k, _)| names.contains(k));
        (Tuple(Arc::new(inner)), Tuple(Arc::new(outer)))
    }
}

/// True for names that render without quotes.
pub(crate) fn is_plain_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || matches!(c, '_' | '$' | '@') => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '@'))
}

/// Writes an attribute name, quoting it when it is not a plain identifier.
pub fn fmt_name(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    if is_plain_name(name) {
        f.write_str(name)
    } else {
        fmt_quoted(f, name, '\'')
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt_name(f, k)?;
            write!(f, ": {v}")?;
        }
        f.write_str(")")
    }
}
