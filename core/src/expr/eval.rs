//! Expression evaluation

use tracing::trace;

use super::{ops, relational, Expr};
use crate::error::{Failure, Result};
use crate::package;
use crate::scope::Scope;
use crate::syntax::embed;
use crate::value::{Function, Set, Tree, Tuple, Value};

impl Expr {
    /// Evaluates the expression against `scope`.
    ///
    /// Failures from sub-expressions propagate unchanged. `&&`, `||` and
    /// conditionals evaluate only the operands needed to decide the result.
    pub fn eval(&self, scope: &Scope) -> Result<Value> {
        match self {
            Expr::Literal(v) => Ok(v.clone()),

            Expr::Ident(name) => scope
                .lookup(name)
                .cloned()
                .ok_or_else(|| Failure::UnboundName(name.clone())),

            Expr::Unary { op, operand } => ops::apply_unary(*op, operand.eval(scope)?),

            Expr::Binary { op, lhs, rhs } => {
                let subject = lhs.eval(scope)?;
                if op.is_per_element() {
                    relational::apply(*op, &subject, rhs, scope)
                } else {
                    ops::apply_binary(*op, subject, rhs.eval(scope)?)
                }
            }

            Expr::And(lhs, rhs) => {
                let decided = lhs.eval(scope)?;
                if decided.truthy() {
                    rhs.eval(scope)
                } else {
                    Ok(decided)
                }
            }

            Expr::Or(lhs, rhs) => {
                let decided = lhs.eval(scope)?;
                if decided.truthy() {
                    Ok(decided)
                } else {
                    rhs.eval(scope)
                }
            }

            Expr::IfElse {
                then,
                cond,
                otherwise,
            } => {
                if cond.eval(scope)?.truthy() {
                    then.eval(scope)
                } else {
                    otherwise.eval(scope)
                }
            }

            Expr::Call { callee, arg } => {
                let callee = callee.eval(scope)?;
                let Value::Function(f) = &callee else {
                    return Err(Failure::type_mismatch("call", "function", &callee));
                };
                let arg = arg.eval(scope)?;
                trace!(callee = %f, %arg, "call");
                f.call(arg)
            }

            Expr::Dot { subject, attr } => {
                let value = subject.eval(scope)?;
                match &value {
                    Value::Tuple(t) => t.get(attr).cloned().ok_or_else(|| Failure::NoSuchAttribute {
                        attr: attr.clone(),
                        value: value.to_string(),
                    }),
                    other => Err(Failure::type_mismatch(format!(".{attr}"), "tuple", other)),
                }
            }

            Expr::DotAll(subject) => match subject.eval(scope)? {
                tuple @ Value::Tuple(_) => Ok(tuple),
                other => Err(Failure::type_mismatch(".*", "tuple", &other)),
            },

            Expr::Count(subject) => {
                let value = subject.eval(scope)?;
                let n = match &value {
                    Value::Set(s) => s.len(),
                    Value::Array(a) => a.len(),
                    Value::String(s) => s.chars().count(),
                    Value::Tuple(t) => t.len(),
                    other => return Err(Failure::type_mismatch("count", "collection", other)),
                };
                Ok(Value::Number(n as f64))
            }

            Expr::Touch { .. } => Err(Failure::NotSupported("->* (touch)".to_string())),

            Expr::Nest {
                subject,
                names,
                attr,
            } => {
                let value = subject.eval(scope)?;
                let set = value
                    .as_set()
                    .ok_or_else(|| Failure::type_mismatch("nest", "relation", &value))?;
                set.nest(names, attr).map(Value::Set)
            }

            Expr::Unnest { subject, attr } => {
                let value = subject.eval(scope)?;
                let set = value
                    .as_set()
                    .ok_or_else(|| Failure::type_mismatch("unnest", "relation", &value))?;
                set.unnest(attr).map(Value::Set)
            }

            Expr::Tuple(entries) => {
                let attrs = entries
                    .iter()
                    .map(|(name, e)| Ok((name.clone(), e.eval(scope)?)))
                    .collect::<Result<Vec<(String, Value)>>>()?;
                Ok(Value::Tuple(Tuple::from_pairs(attrs)?))
            }

            Expr::Set(items) => Ok(Value::Set(
                items.iter().map(|e| e.eval(scope)).collect::<Result<Set>>()?,
            )),

            Expr::Array(items) => Ok(Value::array(
                items.iter().map(|e| e.eval(scope)).collect::<Result<Vec<_>>>()?,
            )),

            Expr::Relation { names, rows } => {
                let mut tuples = Vec::with_capacity(rows.len());
                for row in rows {
                    let values = row.iter().map(|e| e.eval(scope)).collect::<Result<Vec<_>>>()?;
                    tuples.push(Tuple::from_row(names, values)?);
                }
                Ok(Value::Set(Set::relation(tuples)?))
            }

            Expr::Tree {
                tag,
                attrs,
                children,
            } => {
                let attrs = attrs
                    .iter()
                    .map(|(name, e)| Ok((name.clone(), e.eval(scope)?)))
                    .collect::<Result<Vec<(String, Value)>>>()?;
                let children = children.iter().map(|e| e.eval(scope)).collect::<Result<Vec<_>>>()?;
                Ok(Value::Tree(Tree::new(tag.clone(), attrs, children)?))
            }

            Expr::Function { param, body } => Ok(Value::Function(Function::closure(
                param.clone(),
                body.clone(),
                scope.clone(),
            ))),

            Expr::Package(kind) => package::resolve(*kind, scope),

            Expr::Embed {
                grammar,
                rule,
                text,
            } => {
                let grammar = grammar.eval(scope)?;
                let source = grammar
                    .as_str()
                    .ok_or_else(|| Failure::type_mismatch("embedded grammar", "string", &grammar))?;
                embed::parse_embedded(source, rule, text)
            }
        }
    }
}
