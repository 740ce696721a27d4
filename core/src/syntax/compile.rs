//! AST builder: pest pairs to expression tree
//!
//! One `build_*` function per grammar level. A level that matched a single
//! operand holds exactly that operand, so the builders recurse straight through
//! levels that carry no operator.

use std::path::Path;

use pest::iterators::{Pair, Pairs};

use super::operators::{self, Binary};
use super::unescape::unescape;
use super::{check_consumed, markup, parse_error, split_source, Rule};
use crate::error::{Failure, Result};
use crate::expr::{BinOp, Expr, UnOp};
use crate::package::PackageKind;
use crate::value::Value;

/// Parameter of the closure a `&` prefix wraps its operand in.
pub(crate) const REFERENCE_PARAM: &str = "-";

pub(crate) struct Compiler<'s> {
    source_dir: &'s str,
}

/* ===================== Helpers ===================== */

pub(super) fn unexpected(pair: &Pair<'_, Rule>, context: &str) -> Failure {
    Failure::MalformedTree(format!("unexpected {:?} in {context}", pair.as_rule()))
}

pub(super) fn next<'i>(pairs: &mut Pairs<'i, Rule>, context: &str) -> Result<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| Failure::MalformedTree(format!("{context} is missing a child")))
}

/// Text of a string literal, without quotes and with escapes decoded.
pub(super) fn string_literal(pair: &Pair<'_, Rule>) -> Result<String> {
    let text = pair.as_str();
    let body = text
        .get(1..text.len().saturating_sub(1))
        .ok_or_else(|| parse_error(pair, "unterminated literal"))?;
    unescape(body).map_err(|message| parse_error(pair, message))
}

/// Name of an identifier, unquoting `'...'` forms.
pub(super) fn ident_name(pair: &Pair<'_, Rule>) -> Result<String> {
    if pair.as_str().starts_with('\'') {
        string_literal(pair)
    } else {
        Ok(pair.as_str().to_string())
    }
}

/// Wraps `expr` so that it is evaluated only when forced.
fn reference(expr: Expr) -> Expr {
    Expr::function(REFERENCE_PARAM, expr)
}

impl<'s> Compiler<'s> {
    pub(crate) fn new(source_dir: &'s str) -> Self {
        Self { source_dir }
    }

    pub(crate) fn build_source(&self, mut pairs: Pairs<'_, Rule>) -> Result<Expr> {
        let (expr, rest) = split_source(pairs.next())?;
        check_consumed(&rest)?;
        self.build_expr(expr)
    }

    /* ===================== Levels ===================== */

    pub(super) fn build_expr(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        match pair.as_rule() {
            Rule::expr => self.build_transforms(pair),
            Rule::with_level
            | Rule::or_level
            | Rule::and_level
            | Rule::cmp_level
            | Rule::add_level
            | Rule::join_level
            | Rule::mul_level => self.build_binary(pair),
            Rule::pow_level => self.build_power(pair),
            Rule::if_level => self.build_if(pair),
            Rule::unary_level => self.build_unary(pair),
            Rule::call_level => self.build_call(pair),
            Rule::count_level => self.build_count(pair),
            Rule::dot_level => self.build_dots(pair),
            _ => self.build_primary(pair),
        }
    }

    fn build_transforms(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // expr = { amp* ~ with_level ~ transform* }
        let mut amps = 0;
        let mut result = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::amp => amps += 1,
                Rule::with_level => result = Some(self.build_expr(child)?),
                Rule::transform => {
                    let subject = result
                        .take()
                        .ok_or_else(|| Failure::MalformedTree("transform without subject".to_string()))?;
                    result = Some(self.build_transform(subject, child)?);
                }
                _ => return Err(unexpected(&child, "expr")),
            }
        }
        let mut expr = result.ok_or_else(|| Failure::MalformedTree("empty expr".to_string()))?;
        for _ in 0..amps {
            expr = reference(expr);
        }
        Ok(expr)
    }

    fn build_transform(&self, subject: Expr, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut inner = pair.into_inner();
        let first = next(&mut inner, "transform")?;
        match first.as_rule() {
            Rule::nest => {
                // nest = { kw_nest ~ names ~ ident }
                let mut parts = first.into_inner().skip(1);
                let names = parts
                    .next()
                    .ok_or_else(|| Failure::MalformedTree("nest without names".to_string()))?;
                let attr = parts
                    .next()
                    .ok_or_else(|| Failure::MalformedTree("nest without name".to_string()))?;
                Ok(Expr::Nest {
                    subject: Box::new(subject),
                    names: self.build_names(names)?,
                    attr: ident_name(&attr)?,
                })
            }
            Rule::unnest => {
                // unnest = { kw_unnest ~ ident }
                let attr = first
                    .into_inner()
                    .nth(1)
                    .ok_or_else(|| Failure::MalformedTree("unnest without name".to_string()))?;
                Ok(Expr::Unnest {
                    subject: Box::new(subject),
                    attr: ident_name(&attr)?,
                })
            }
            Rule::arrow_op => {
                let rhs = self.build_expr(next(&mut inner, "arrow")?)?;
                let op = operators::binary(first.as_str())
                    .ok_or_else(|| unexpected(&first, "arrow"))?;
                Ok(op.build(subject, rhs))
            }
            _ => Err(unexpected(&first, "transform")),
        }
    }

    /// Left fold of `operand (op operand)*`.
    fn build_binary(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        let context = format!("{:?}", pair.as_rule());
        let mut inner = pair.into_inner();
        let mut result = self.build_expr(next(&mut inner, &context)?)?;
        while let Some(op) = inner.next() {
            let ctor: Binary =
                operators::binary(op.as_str()).ok_or_else(|| unexpected(&op, &context))?;
            let rhs = self.build_expr(next(&mut inner, &context)?)?;
            result = ctor.build(result, rhs);
        }
        Ok(result)
    }

    /// Right fold of `operand (** operand)*`.
    fn build_power(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut operands = pair
            .into_inner()
            .filter(|p| p.as_rule() != Rule::pow_op)
            .map(|p| self.build_expr(p))
            .collect::<Result<Vec<_>>>()?;
        let mut result = operands
            .pop()
            .ok_or_else(|| Failure::MalformedTree("empty pow_level".to_string()))?;
        while let Some(lhs) = operands.pop() {
            result = Binary::Op(BinOp::Pow).build(lhs, result);
        }
        Ok(result)
    }

    fn build_if(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // if_level = { add_level ~ if_clause* }
        let mut inner = pair.into_inner();
        let mut result = self.build_expr(next(&mut inner, "if_level")?)?;
        for clause in inner {
            let mut branches = clause.into_inner().filter(|p| p.as_rule() == Rule::expr);
            let missing = || Failure::MalformedTree("if clause needs a condition and an else branch".to_string());
            let cond = self.build_expr(branches.next().ok_or_else(missing)?)?;
            let otherwise = self.build_expr(branches.next().ok_or_else(missing)?)?;
            result = Expr::IfElse {
                then: Box::new(result),
                cond: Box::new(cond),
                otherwise: Box::new(otherwise),
            };
        }
        Ok(result)
    }

    fn build_unary(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // unary_level = { unary_op* ~ call_level }
        let mut ops = Vec::new();
        let mut operand = None;
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::unary_op => {
                    ops.push(operators::unary(child.as_str()).ok_or_else(|| unexpected(&child, "unary"))?)
                }
                _ => operand = Some(self.build_expr(child)?),
            }
        }
        let mut result = operand.ok_or_else(|| Failure::MalformedTree("unary without operand".to_string()))?;
        for op in ops.into_iter().rev() {
            result = Expr::unary(op, result);
        }
        Ok(result)
    }

    fn build_call(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // call_level = { count_level ~ call_args* }; f(a, b) is f(a)(b)
        let mut inner = pair.into_inner();
        let mut result = self.build_expr(next(&mut inner, "call_level")?)?;
        for args in inner {
            for arg in args.into_inner() {
                result = Expr::call(result, self.build_expr(arg)?);
            }
        }
        Ok(result)
    }

    fn build_count(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // count_level = { dot_level ~ kw_count? ~ touch? }
        let mut inner = pair.into_inner();
        let mut result = self.build_expr(next(&mut inner, "count_level")?)?;
        for child in inner {
            match child.as_rule() {
                Rule::kw_count => result = Expr::Count(Box::new(result)),
                Rule::touch => result = self.build_touch(result, child)?,
                _ => return Err(unexpected(&child, "count_level")),
            }
        }
        Ok(result)
    }

    fn build_touch(&self, subject: Expr, pair: Pair<'_, Rule>) -> Result<Expr> {
        let mut path = Vec::new();
        let mut args = Vec::new();
        for child in pair.into_inner() {
            match child.as_rule() {
                Rule::touch_op => {}
                Rule::touch_step => {
                    let step = child
                        .into_inner()
                        .next()
                        .ok_or_else(|| Failure::MalformedTree("empty touch step".to_string()))?;
                    path.push(self.attr_name(&step)?);
                }
                Rule::expr => args.push(self.build_expr(child)?),
                _ => return Err(unexpected(&child, "touch")),
            }
        }
        Ok(Expr::Touch {
            subject: Box::new(subject),
            path,
            args,
        })
    }

    fn build_dots(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // dot_level = { dot+ | primary ~ dot* }
        let mut inner = pair.into_inner().peekable();
        let mut result = if matches!(inner.peek(), Some(first) if first.as_rule() == Rule::dot) {
            Expr::current()
        } else {
            self.build_expr(next_peeked(&mut inner)?)?
        };
        for dot in inner {
            let target = dot
                .into_inner()
                .next()
                .ok_or_else(|| Failure::MalformedTree("empty dot".to_string()))?;
            result = match target.as_rule() {
                Rule::dot_all => Expr::DotAll(Box::new(result)),
                _ => Expr::dot(result, self.attr_name(&target)?),
            };
        }
        Ok(result)
    }

    /// Attribute named by an `ident`, `"string"` or `&ident` pair.
    fn attr_name(&self, pair: &Pair<'_, Rule>) -> Result<String> {
        match pair.as_rule() {
            Rule::ident => ident_name(pair),
            Rule::string => string_literal(pair),
            Rule::attr_ref => {
                let ident = pair
                    .clone()
                    .into_inner()
                    .next()
                    .ok_or_else(|| Failure::MalformedTree("empty attr_ref".to_string()))?;
                Ok(format!("&{}", ident_name(&ident)?))
            }
            _ => Err(unexpected(pair, "attribute name")),
        }
    }

    fn build_names(&self, pair: Pair<'_, Rule>) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for ident in pair.into_inner() {
            let name = ident_name(&ident)?;
            if names.contains(&name) {
                return Err(Failure::DuplicateAttribute(name));
            }
            names.push(name);
        }
        Ok(names)
    }

    /* ===================== Primaries ===================== */

    fn build_primary(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        match pair.as_rule() {
            Rule::number => pair
                .as_str()
                .parse::<f64>()
                .map(Expr::literal)
                .map_err(|e| parse_error(&pair, e.to_string())),
            Rule::string => string_literal(&pair).map(Expr::literal),
            Rule::ident => {
                let name = ident_name(&pair)?;
                Ok(match name.as_str() {
                    "true" if !pair.as_str().starts_with('\'') => Expr::Literal(Value::bool(true)),
                    "false" if !pair.as_str().starts_with('\'') => Expr::Literal(Value::bool(false)),
                    "none" if !pair.as_str().starts_with('\'') => Expr::Literal(Value::None),
                    _ => Expr::Ident(name),
                })
            }
            Rule::current => Ok(Expr::current()),
            Rule::tuple => self.build_tuple(pair),
            Rule::set => {
                let items = self.build_all(pair.into_inner())?;
                Ok(fold_literals(items, Value::set).unwrap_or_else(Expr::Set))
            }
            Rule::array => {
                let items = self.build_all(pair.into_inner())?;
                Ok(fold_literals(items, Value::array).unwrap_or_else(Expr::Array))
            }
            Rule::relation => self.build_relation(pair),
            Rule::embed => self.build_embed(pair),
            Rule::xml => markup::build_xml(self, pair),
            Rule::deref => {
                let operand = next(&mut pair.into_inner(), "deref")?;
                Ok(Expr::unary(UnOp::Eval, self.build_expr(operand)?))
            }
            Rule::function => {
                // function = { "\\" ~ ident ~ expr }
                let mut inner = pair.into_inner();
                let param = ident_name(&next(&mut inner, "function")?)?;
                let body = self.build_expr(next(&mut inner, "function")?)?;
                Ok(Expr::function(param, body))
            }
            Rule::package => self.build_package(pair),
            _ => Err(unexpected(&pair, "primary")),
        }
    }

    fn build_all(&self, pairs: Pairs<'_, Rule>) -> Result<Vec<Expr>> {
        pairs.map(|p| self.build_expr(p)).collect()
    }

    fn build_tuple(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // tuple_entry = { (attr_ref | ident | string) ~ ":" ~ expr | ":" ~ expr }
        let mut entries: Vec<(String, Expr)> = Vec::new();
        for entry in pair.into_inner() {
            let mut parts = entry.into_inner();
            let first = next(&mut parts, "tuple entry")?;
            let (name, value) = match first.as_rule() {
                Rule::expr => {
                    let value = self.build_expr(first)?;
                    let name = value
                        .inferred_name()
                        .map(str::to_string)
                        .ok_or_else(|| Failure::AmbiguousAttributeName(value.to_string()))?;
                    (name, value)
                }
                Rule::attr_ref => {
                    let value = self.build_expr(next(&mut parts, "tuple entry")?)?;
                    (self.attr_name(&first)?, reference(value))
                }
                _ => {
                    let value = self.build_expr(next(&mut parts, "tuple entry")?)?;
                    (self.attr_name(&first)?, value)
                }
            };
            if entries.iter().any(|(n, _)| *n == name) {
                return Err(Failure::DuplicateAttribute(name));
            }
            entries.push((name, value));
        }
        Ok(Expr::Tuple(entries))
    }

    fn build_relation(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // relation = { "{" ~ names ~ (row ~ ("," ~ row)* ~ ","?)? ~ "}" }
        let mut inner = pair.into_inner();
        let names = self.build_names(next(&mut inner, "relation")?)?;
        let mut rows = Vec::new();
        for row in inner {
            let values = self.build_all(row.into_inner())?;
            if values.len() != names.len() {
                return Err(Failure::shape(format!(
                    "row has {} values for {} attributes",
                    values.len(),
                    names.len()
                )));
            }
            rows.push(values);
        }
        Ok(Expr::Relation { names, rows })
    }

    fn build_embed(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // embed = { "{:" ~ embed_grammar ~ "." ~ ident ~ embed_body }
        let mut inner = pair.into_inner();
        let grammar = next(&mut next(&mut inner, "embed")?.into_inner(), "embed grammar")?;
        let grammar = match grammar.as_rule() {
            Rule::ident => Expr::Ident(ident_name(&grammar)?),
            Rule::string => Expr::literal(string_literal(&grammar)?),
            _ => self.build_expr(grammar)?,
        };
        let rule = ident_name(&next(&mut inner, "embed")?)?;
        let text = next(&mut next(&mut inner, "embed")?.into_inner(), "embed body")?;
        Ok(Expr::Embed {
            grammar: Box::new(grammar),
            rule,
            text: text.as_str().to_string(),
        })
    }

    fn build_package(&self, pair: Pair<'_, Rule>) -> Result<Expr> {
        // package = ${ "//" ~ (pkg_local | pkg_remote)? }
        let Some(form) = pair.into_inner().next() else {
            return Ok(Expr::Package(PackageKind::Context));
        };
        match form.as_rule() {
            Rule::pkg_local => {
                let parts = form
                    .into_inner()
                    .map(|p| ident_name(&p))
                    .collect::<Result<Vec<_>>>()?;
                let relative = parts.join("/");
                if self.source_dir.is_empty() {
                    return Err(Failure::MissingSourceDir(relative));
                }
                let path = Path::new(self.source_dir).join(&relative);
                Ok(Expr::call(
                    Expr::Package(PackageKind::Local),
                    Expr::literal(path.to_string_lossy().into_owned()),
                ))
            }
            Rule::pkg_remote => {
                let mut reference = String::new();
                let mut qualified = false;
                for part in form.into_inner() {
                    match part.as_rule() {
                        Rule::pkg_scheme => {
                            reference.push_str(part.as_str());
                            qualified = true;
                        }
                        Rule::pkg_host => {
                            let labels = part
                                .into_inner()
                                .map(|p| ident_name(&p))
                                .collect::<Result<Vec<_>>>()?;
                            reference.push_str(&labels.join("."));
                        }
                        Rule::pkg_path => {
                            let segment = next(&mut part.into_inner(), "package path")?;
                            reference.push('/');
                            reference.push_str(&ident_name(&segment)?);
                            qualified = true;
                        }
                        _ => return Err(unexpected(&part, "package")),
                    }
                }
                let kind = if qualified {
                    PackageKind::Remote
                } else {
                    PackageKind::Std
                };
                Ok(Expr::call(Expr::Package(kind), Expr::literal(reference)))
            }
            _ => Err(unexpected(&form, "package")),
        }
    }
}

fn next_peeked<'i>(
    pairs: &mut std::iter::Peekable<Pairs<'i, Rule>>,
) -> Result<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| Failure::MalformedTree("dot_level is missing a child".to_string()))
}

/// Folds a constructor whose operands are all literals into a literal.
fn fold_literals(items: Vec<Expr>, build: fn(Vec<Value>) -> Value) -> Result<Expr, Vec<Expr>> {
    if !items.iter().all(|e| matches!(e, Expr::Literal(_))) {
        return Err(items);
    }
    let values = items
        .into_iter()
        .filter_map(|e| match e {
            Expr::Literal(v) => Some(v),
            _ => None,
        })
        .collect();
    Ok(Expr::Literal(build(values)))
}
