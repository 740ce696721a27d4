use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::Value;
use crate::error::{Failure, Result};

/// A markup element: tag, attributes and ordered content.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tree(Arc<Element>);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Element {
    tag: String,
    attrs: BTreeMap<String, Value>,
    children: Vec<Value>,
}

impl Tree {
    pub fn new<K: Into<String>>(
        tag: impl Into<String>,
        attrs: impl IntoIterator<Item = (K, Value)>,
        children: Vec<Value>,
    ) -> Result<Tree> {
        let mut map = BTreeMap::new();
        for (name, value) in attrs {
            let name = name.into();
            if map.contains_key(&name) {
                return Err(Failure::DuplicateAttribute(name));
            }
            map.insert(name, value);
        }
        Ok(Tree(Arc::new(Element {
            tag: tag.into(),
            attrs: map,
            children,
        })))
    }

    pub fn tag(&self) -> &str {
        &self.0.tag
    }

    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.0.attrs.get(name)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn children(&self) -> &[Value] {
        &self.0.children
    }
}

fn escape_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => f.write_str("&amp;")?,
            '<' => f.write_str("&lt;")?,
            '>' => f.write_str("&gt;")?,
            '{' => f.write_str("&#123;")?,
            c => write!(f, "{c}")?,
        }
    }
    Ok(())
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag())?;
        for (name, value) in self.attrs() {
            match value {
                Value::Number(_) | Value::String(_) => write!(f, " {name}={value}")?,
                other => write!(f, " {name}={{{other}}}")?,
            }
        }
        if self.children().is_empty() {
            return f.write_str("/>");
        }
        f.write_str(">")?;
        for child in self.children() {
            match child {
                Value::String(text) => escape_text(f, text)?,
                Value::Tree(tree) => write!(f, "{tree}")?,
                other => write!(f, "{{{other}}}")?,
            }
        }
        write!(f, "</{}>", self.tag())
    }
}
