//! Lexical environments.
//!
//! A [`Scope`] is an immutable chain of frames. Binding never mutates a scope; it
//! returns a child that shadows the parent, so closures can capture a scope by
//! cloning an `Arc`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Name under which the current element is bound.
pub const CURRENT: &str = ".";

#[derive(Clone, Default)]
pub struct Scope(Option<Arc<Frame>>);

struct Frame {
    bindings: BTreeMap<String, Value>,
    parent: Scope,
}

impl Scope {
    /// The empty root scope.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, name: impl Into<String>, value: Value) -> Scope {
        let mut bindings = BTreeMap::new();
        bindings.insert(name.into(), value);
        self.child(bindings)
    }

    pub fn bind_all<K: Into<String>>(&self, bindings: impl IntoIterator<Item = (K, Value)>) -> Scope {
        self.child(bindings.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Binds `.` to `element` and, for a tuple, each attribute under its name.
    pub fn bind_element(&self, element: &Value) -> Scope {
        let mut bindings = BTreeMap::new();
        if let Value::Tuple(t) = element {
            for (name, value) in t.iter() {
                bindings.insert(name.to_string(), value.clone());
            }
        }
        bindings.insert(CURRENT.to_string(), element.clone());
        self.child(bindings)
    }

    fn child(&self, bindings: BTreeMap<String, Value>) -> Scope {
        Scope(Some(Arc::new(Frame {
            bindings,
            parent: self.clone(),
        })))
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope = self;
        while let Some(frame) = &scope.0 {
            if let Some(value) = frame.bindings.get(name) {
                return Some(value);
            }
            scope = &frame.parent;
        }
        None
    }

    /// Identity of the innermost frame.
    pub(crate) fn addr(&self) -> usize {
        self.0
            .as_ref()
            .map_or(0, |frame| Arc::as_ptr(frame) as *const () as usize)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        let mut scope = self;
        while let Some(frame) = &scope.0 {
            names.extend(frame.bindings.keys().map(String::as_str));
            scope = &frame.parent;
        }
        f.debug_struct("Scope").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_outward() {
        let root = Scope::new().bind("x", Value::number(1.0));
        let inner = root.bind("y", Value::number(2.0));
        assert_eq!(inner.lookup("x"), Some(&Value::number(1.0)));
        assert_eq!(inner.lookup("y"), Some(&Value::number(2.0)));
        assert_eq!(root.lookup("y"), None);
    }

    #[test]
    fn test_child_shadows_parent() {
        let scope = Scope::new().bind("x", Value::number(1.0)).bind("x", Value::number(2.0));
        assert_eq!(scope.lookup("x"), Some(&Value::number(2.0)));
    }

    #[test]
    fn test_bind_element_tuple() {
        let element = Value::tuple([("a", Value::number(1.0)), ("b", Value::string("s"))])
            .expect("Should build tuple");
        let scope = Scope::new().bind_element(&element);
        assert_eq!(scope.lookup("a"), Some(&Value::number(1.0)));
        assert_eq!(scope.lookup("b"), Some(&Value::string("s")));
        assert_eq!(scope.lookup(CURRENT), Some(&element));
    }

    #[test]
    fn test_bind_all() {
        let scope = Scope::new().bind_all([("a", Value::None), ("b", Value::number(3.0))]);
        assert_eq!(scope.lookup("a"), Some(&Value::None));
        assert_eq!(scope.lookup("b"), Some(&Value::number(3.0)));
        assert_eq!(scope.lookup("c"), None);
    }
}
