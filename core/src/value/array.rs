use std::fmt;
use std::sync::Arc;

use super::{Set, Tuple, Value};
use crate::error::{Failure, Result};

/// Attribute holding the position in the set form of an array.
pub const INDEX: &str = "@";
/// Attribute holding the element in the set form of an array.
pub const ITEM: &str = "@item";

/// An ordered sequence indexed `0..n` without gaps.
#[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Array(Arc<Vec<Value>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn push(&self, value: Value) -> Array {
        let mut items = (*self.0).clone();
        items.push(value);
        Array(Arc::new(items))
    }

    /// The relation `{|@, @item| (0, a), (1, b), ...}`.
    pub fn to_set(&self) -> Set {
        self.iter()
            .enumerate()
            .map(|(i, v)| {
                Value::Tuple(
                    Tuple::new()
                        .with(INDEX, Value::Number(i as f64))
                        .with(ITEM, v.clone()),
                )
            })
            .collect()
    }

    /// Inverse of [`Array::to_set`]. The indices must be exactly `0..n`.
    pub fn from_set(set: &Set) -> Result<Array> {
        let mut items = Vec::with_capacity(set.len());
        for (expected, element) in set.iter().enumerate() {
            let pair = element
                .as_tuple()
                .filter(|t| t.len() == 2)
                .ok_or_else(|| Failure::shape(format!("{element} is not an indexed item")))?;
            let index = pair.get(INDEX).and_then(Value::as_number);
            match (index, pair.get(ITEM)) {
                (Some(i), Some(item)) if i == expected as f64 => items.push(item.clone()),
                _ => {
                    return Err(Failure::shape(format!(
                        "{element} does not continue an array at index {expected}"
                    )))
                }
            }
        }
        Ok(Array(Arc::new(items)))
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Array(Arc::new(iter.into_iter().collect()))
    }
}

impl<'a> IntoIterator for &'a Array {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}
