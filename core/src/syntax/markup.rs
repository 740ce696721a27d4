//! XML literals
//!
//! `<tag attr=value>content</tag>` compiles to an [`Expr::Tree`]. Namespace
//! declarations and `xml:space` are resolved here, at compile time, so a tree
//! value only ever carries expanded `{namespace}local` names.

use std::collections::HashMap;

use pest::iterators::Pair;

use super::compile::{next, string_literal, unexpected, Compiler};
use super::{parse_error, Rule};
use crate::error::{Failure, Result};
use crate::expr::Expr;
use crate::value::Value;

const XML_NAMESPACE: &str = "https://www.w3.org/XML/1998/namespace";
const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Namespace and whitespace settings in force for an element.
#[derive(Clone, Debug)]
struct Context {
    default_ns: Option<String>,
    prefixes: HashMap<String, String>,
    preserve_space: bool,
}

impl Default for Context {
    fn default() -> Self {
        let mut prefixes = HashMap::new();
        prefixes.insert("xml".to_string(), XML_NAMESPACE.to_string());
        Self {
            default_ns: None,
            prefixes,
            preserve_space: false,
        }
    }
}

impl Context {
    fn expand(&self, name: &str, use_default: bool) -> String {
        match name.split_once(':') {
            Some((prefix, local)) => match self.prefixes.get(prefix) {
                Some(ns) => format!("{{{ns}}}{local}"),
                None => name.to_string(),
            },
            None => match (&self.default_ns, use_default) {
                (Some(ns), true) => format!("{{{ns}}}{name}"),
                _ => name.to_string(),
            },
        }
    }
}

pub(super) fn build_xml(compiler: &Compiler<'_>, pair: Pair<'_, Rule>) -> Result<Expr> {
    build_element(compiler, pair, &Context::default())
}

fn build_element(compiler: &Compiler<'_>, pair: Pair<'_, Rule>, parent: &Context) -> Result<Expr> {
    let mut inner = pair.into_inner();
    let name = next(&mut inner, "xml")?.as_str().to_string();

    let mut context = parent.clone();
    let mut raw_attrs = Vec::new();
    let mut content = None;
    for child in inner {
        match child.as_rule() {
            Rule::xml_attr => {
                let mut parts = child.into_inner();
                let attr = next(&mut parts, "xml attribute")?;
                let value = next(&mut parts, "xml attribute")?;
                declare(&mut context, attr.as_str(), &value)?;
                raw_attrs.push((attr.as_str().to_string(), value));
            }
            Rule::xml_content => content = Some(child),
            _ => return Err(unexpected(&child, "xml")),
        }
    }

    let mut attrs: Vec<(String, Expr)> = Vec::new();
    for (raw, value) in raw_attrs {
        let name = match raw.as_str() {
            "xmlns" => raw.clone(),
            _ => match raw.strip_prefix("xmlns:") {
                Some(prefix) => format!("{{{XMLNS_NAMESPACE}}}{prefix}"),
                None => context.expand(&raw, false),
            },
        };
        if attrs.iter().any(|(n, _)| *n == name) {
            return Err(Failure::DuplicateAttribute(name));
        }
        attrs.push((name, build_value(compiler, value)?));
    }

    let children = match content {
        Some(content) => build_content(compiler, content, &context)?,
        None => Vec::new(),
    };
    Ok(Expr::Tree {
        tag: context.expand(&name, true),
        attrs,
        children,
    })
}

/// Applies a namespace or `xml:space` declaration to `context`.
fn declare(context: &mut Context, attr: &str, value: &Pair<'_, Rule>) -> Result<()> {
    if attr == "xml:space" {
        context.preserve_space = match literal_text(value)?.as_deref() {
            Some("preserve") => true,
            Some("default") => false,
            _ => return Err(parse_error(value, "xml:space must be \"preserve\" or \"default\"")),
        };
    } else if attr == "xmlns" {
        let ns = literal_text(value)?.ok_or_else(|| parse_error(value, "xmlns must be a string literal"))?;
        context.default_ns = Some(ns);
    } else if let Some(prefix) = attr.strip_prefix("xmlns:") {
        let ns = literal_text(value)?
            .ok_or_else(|| parse_error(value, format!("xmlns:{prefix} must be a string literal")))?;
        context.prefixes.insert(prefix.to_string(), ns);
    }
    Ok(())
}

/// The decoded string when `value` is a string literal.
fn literal_text(value: &Pair<'_, Rule>) -> Result<Option<String>> {
    match value.clone().into_inner().next() {
        Some(inner) if inner.as_rule() == Rule::string => string_literal(&inner).map(Some),
        _ => Ok(None),
    }
}

fn build_value(compiler: &Compiler<'_>, value: Pair<'_, Rule>) -> Result<Expr> {
    let inner = next(&mut value.into_inner(), "xml value")?;
    match inner.as_rule() {
        Rule::number => inner
            .as_str()
            .parse::<f64>()
            .map(Expr::literal)
            .map_err(|e| parse_error(&inner, e.to_string())),
        Rule::string => string_literal(&inner).map(Expr::literal),
        _ => compiler.build_expr(inner),
    }
}

fn build_content(compiler: &Compiler<'_>, content: Pair<'_, Rule>, context: &Context) -> Result<Vec<Expr>> {
    let mut children = Vec::new();
    let mut text = String::new();
    for part in content.into_inner() {
        match part.as_rule() {
            Rule::xml_text => text.push_str(part.as_str()),
            Rule::xml_entity => text.push(entity(&part)?),
            Rule::xml => {
                flush_text(&mut text, &mut children, context);
                children.push(build_element(compiler, part, context)?);
            }
            Rule::xml_expr => {
                flush_text(&mut text, &mut children, context);
                children.push(compiler.build_expr(next(&mut part.into_inner(), "xml expr")?)?);
            }
            _ => return Err(unexpected(&part, "xml content")),
        }
    }
    flush_text(&mut text, &mut children, context);
    Ok(children)
}

fn flush_text(text: &mut String, children: &mut Vec<Expr>, context: &Context) {
    let taken = std::mem::take(text);
    let kept = if context.preserve_space {
        taken
    } else {
        taken.trim().to_string()
    };
    if !kept.is_empty() {
        children.push(Expr::Literal(Value::string(kept)));
    }
}

fn entity(pair: &Pair<'_, Rule>) -> Result<char> {
    let text = pair.as_str();
    let body = text
        .strip_prefix('&')
        .and_then(|s| s.strip_suffix(';'))
        .ok_or_else(|| parse_error(pair, "malformed entity"))?;
    let code = if let Some(hex) = body.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(dec) = body.strip_prefix('#') {
        dec.parse::<u32>().ok()
    } else {
        let named = match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            "copy" => '©',
            "reg" => '®',
            "euro" => '€',
            _ => return Err(parse_error(pair, format!("unknown entity {text}"))),
        };
        return Ok(named);
    };
    code.and_then(char::from_u32)
        .ok_or_else(|| parse_error(pair, format!("invalid character reference {text}")))
}
