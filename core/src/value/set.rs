use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use super::{fmt_name, Tuple, Value};
use crate::error::{Failure, Result};

/// An unordered collection of distinct values, iterated in canonical order.
#[derive(Clone, Default, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Set(Arc<BTreeSet<Value>>);

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a relation, failing if the tuples differ in shape.
    pub fn relation(tuples: impl IntoIterator<Item = Tuple>) -> Result<Set> {
        let mut shape: Option<Tuple> = None;
        let mut elements = BTreeSet::new();
        for tuple in tuples {
            match &shape {
                Some(first) if !first.same_shape(&tuple) => {
                    return Err(Failure::shape(format!(
                        "{tuple} does not match the shape of {first}"
                    )))
                }
                Some(_) => {}
                None => shape = Some(tuple.clone()),
            }
            elements.insert(Value::Tuple(tuple));
        }
        Ok(Set(Arc::new(elements)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> std::collections::btree_set::Iter<'_, Value> {
        self.0.iter()
    }

    /// Attribute names shared by every element, if this is a non-empty relation.
    pub fn shape(&self) -> Option<Vec<&str>> {
        let mut tuples = self.iter().map(Value::as_tuple);
        let first = tuples.next()??;
        for t in tuples {
            if !first.same_shape(t?) {
                return None;
            }
        }
        Some(first.names().collect())
    }

    /// The set extended with `value`. A non-empty relation only accepts
    /// tuples of its own shape.
    pub fn with(&self, value: Value) -> Result<Set> {
        if let Some(names) = self.shape() {
            let fits = value
                .as_tuple()
                .map_or(false, |t| t.len() == names.len() && t.names().zip(&names).all(|(a, b)| a == *b));
            if !fits {
                return Err(Failure::shape(format!(
                    "{value} does not fit relation |{}|",
                    names.join(", ")
                )));
            }
        }
        let mut elements = (*self.0).clone();
        elements.insert(value);
        Ok(Set(Arc::new(elements)))
    }

    pub fn without(&self, value: &Value) -> Set {
        if !self.contains(value) {
            return self.clone();
        }
        let mut elements = (*self.0).clone();
        elements.remove(value);
        Set(Arc::new(elements))
    }

    pub fn union(&self, other: &Set) -> Set {
        self.iter().chain(other.iter()).cloned().collect()
    }

    /// Every subset of this set.
    pub fn power_set(&self) -> Set {
        let mut subsets: Vec<BTreeSet<Value>> = vec![BTreeSet::new()];
        for value in self.iter() {
            let extended: Vec<_> = subsets
                .iter()
                .map(|s| {
                    let mut s = s.clone();
                    s.insert(value.clone());
                    s
                })
                .collect();
            subsets.extend(extended);
        }
        subsets
            .into_iter()
            .map(|s| Value::Set(Set(Arc::new(s))))
            .collect()
    }

    /* ===================== Relational algebra ===================== */

    fn tuples(&self, op: &str) -> Result<Vec<&Tuple>> {
        self.iter()
            .map(|v| {
                v.as_tuple().ok_or_else(|| {
                    Failure::shape(format!("{op} requires a relation, found a {}", v.kind()))
                })
            })
            .collect()
    }

    /// Natural join: merges every pair of tuples that agree on their shared
    /// attributes.
    pub fn join(&self, other: &Set) -> Result<Set> {
        let left = self.tuples("<&>")?;
        let right = other.tuples("<&>")?;
        let mut joined = BTreeSet::new();
        for a in &left {
            for b in &right {
                if a.agrees_with(b) {
                    joined.insert(Value::Tuple(a.merge(b)));
                }
            }
        }
        Ok(Set(Arc::new(joined)))
    }

    /// Groups by the attributes not in `names`, collecting the projections onto
    /// `names` of each group under `attr`.
    pub fn nest(&self, names: &[String], attr: &str) -> Result<Set> {
        let mut groups: BTreeMap<Tuple, BTreeSet<Value>> = BTreeMap::new();
        for tuple in self.tuples("nest")? {
            if let Some(missing) = names.iter().find(|n| !tuple.contains(n)) {
                return Err(Failure::NoSuchAttribute {
                    attr: missing.clone(),
                    value: tuple.to_string(),
                });
            }
            let (inner, outer) = tuple.split(names);
            if outer.contains(attr) {
                return Err(Failure::DuplicateAttribute(attr.to_string()));
            }
            groups.entry(outer).or_default().insert(Value::Tuple(inner));
        }
        Ok(groups
            .into_iter()
            .map(|(outer, inner)| Value::Tuple(outer.with(attr, Value::Set(Set(Arc::new(inner))))))
            .collect())
    }

    /// Flattens the relation-valued attribute `attr` into its parent tuples.
    pub fn unnest(&self, attr: &str) -> Result<Set> {
        let mut flat = BTreeSet::new();
        for tuple in self.tuples("unnest")? {
            let nested = tuple.get(attr).ok_or_else(|| Failure::NoSuchAttribute {
                attr: attr.to_string(),
                value: tuple.to_string(),
            })?;
            let nested = nested
                .as_set()
                .ok_or_else(|| Failure::type_mismatch("unnest", "relation", nested))?;
            let base = tuple.without(attr);
            for inner in nested.tuples("unnest")? {
                if let Some(clash) = inner.names().find(|n| base.contains(n)) {
                    return Err(Failure::DuplicateAttribute(clash.to_string()));
                }
                flat.insert(Value::Tuple(base.merge(inner)));
            }
        }
        Ok(Set(Arc::new(flat)))
    }
}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Set(Arc::new(iter.into_iter().collect()))
    }
}

impl<'a> IntoIterator for &'a Set {
    type Item = &'a Value;
    type IntoIter = std::collections::btree_set::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.shape() {
            Some(names) if !names.is_empty() => {
                f.write_str("{|")?;
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    fmt_name(f, name)?;
                }
                f.write_str("| ")?;
                for (i, tuple) in self.iter().filter_map(Value::as_tuple).enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str("(")?;
                    for (j, (_, v)) in tuple.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{v}")?;
                    }
                    f.write_str(")")?;
                }
                f.write_str("}")
            }
            _ => {
                f.write_str("{")?;
                for (i, v) in self.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
        }
    }
}
