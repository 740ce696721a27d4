//! Syntax - pest-based parser and compiler for relish source
//!
//! Source text is matched against `relish.pest`, and the resulting labeled
//! syntax tree is compiled into an [`Expr`]. The same tree can instead be
//! reflected into a [`Value`](crate::value::Value) with [`parse_tree`] and
//! [`reflect::tree_to_value`].

pub mod ast;
mod compile;
pub(crate) mod embed;
mod markup;
pub mod operators;
pub mod reflect;
mod unescape;


use pest::error::{Error as PestError, LineColLocation};
use pest::iterators::Pair;
use pest::{Parser, RuleType};
use pest_derive::Parser;
use tracing::debug;

use crate::error::{Failure, Result};
use crate::expr::Expr;

use compile::Compiler;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "syntax/relish.pest"]
pub struct RelishParser;

/* ===================== Public API ===================== */

/// Parses and compiles `source`.
///
/// `source_dir` is the directory local package references (`//./path`) are
/// resolved against. It may be empty, in which case local references fail
/// to compile.
pub fn parse_source(source: &str, source_dir: &str) -> Result<Expr> {
    debug!(len = source.len(), source_dir, "compiling source");
    let pairs = RelishParser::parse(Rule::source, source).map_err(|e| parse_failure(&e))?;
    Compiler::new(source_dir).build_source(pairs)
}

/// Parses `source` into its labeled syntax tree without compiling it.
pub fn parse_tree(source: &str) -> Result<ast::Node> {
    let mut pairs = RelishParser::parse(Rule::source, source).map_err(|e| parse_failure(&e))?;
    let (expr, rest) = split_source(pairs.next())?;
    check_consumed(&rest)?;
    Ok(ast::Node::from_pairs([expr], |rule: Rule| format!("{rule:?}")))
}

/* ===================== Helpers ===================== */

/// Splits the `source` pair into its expression and trailing input.
fn split_source(source: Option<Pair<'_, Rule>>) -> Result<(Pair<'_, Rule>, Pair<'_, Rule>)> {
    let missing = || Failure::MalformedTree("source lacks expr or rest".to_string());
    let mut inner = source.ok_or_else(missing)?.into_inner();
    let expr = inner.next().ok_or_else(missing)?;
    let rest = inner.next().ok_or_else(missing)?;
    Ok((expr, rest))
}

fn check_consumed(rest: &Pair<'_, Rule>) -> Result<()> {
    if rest.as_str().is_empty() {
        return Ok(());
    }
    let (line, column) = rest.as_span().start_pos().line_col();
    Err(Failure::InputNotConsumed { line, column })
}

/// Converts a pest error from any grammar into a parse failure.
pub(crate) fn parse_failure<R: RuleType>(err: &PestError<R>) -> Failure {
    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    Failure::Parse {
        message: err.variant.message().into_owned(),
        line,
        column,
    }
}

/// Parse failure positioned at `pair`.
pub(crate) fn parse_error(pair: &Pair<'_, Rule>, message: impl Into<String>) -> Failure {
    let (line, column) = pair.as_span().start_pos().line_col();
    Failure::Parse {
        message: message.into(),
        line,
        column,
    }
}
