//! Element-wise operators: the arrow family, filtering, ordering and aggregates.
//!
//! Each element of the left operand is bound as `.` (and, for a tuple, each of
//! its attributes by name) while the right operand is evaluated.

use super::{BinOp, Expr};
use crate::error::{Failure, Result};
use crate::scope::Scope;
use crate::value::{number, Set, Value};

/// Elements of a set in canonical order, or of an array in index order.
fn elements<'a>(op: BinOp, subject: &'a Value) -> Result<(Vec<&'a Value>, bool)> {
    match subject {
        Value::Set(s) => Ok((s.iter().collect(), false)),
        Value::Array(a) => Ok((a.iter().collect(), true)),
        other => Err(Failure::type_mismatch(op.symbol(), "set or array", other)),
    }
}

fn numbers(op: BinOp, values: Vec<Value>) -> Result<Vec<f64>> {
    values
        .iter()
        .map(|v| {
            v.as_number()
                .ok_or_else(|| Failure::type_mismatch(op.symbol(), "number", v))
        })
        .collect()
}

pub(crate) fn apply(op: BinOp, subject: &Value, rhs: &Expr, scope: &Scope) -> Result<Value> {
    let (items, is_array) = elements(op, subject)?;
    let project = |v: &Value| rhs.eval(&scope.bind_element(v));
    let collect = |values: Vec<Value>| {
        if is_array {
            Value::array(values)
        } else {
            Value::set(values)
        }
    };

    match op {
        BinOp::Arrow => Ok(Value::Set(
            items.iter().map(|&v| project(v)).collect::<Result<Set>>()?,
        )),
        BinOp::SeqArrow => Ok(Value::array(
            items.iter().map(|&v| project(v)).collect::<Result<Vec<_>>>()?,
        )),
        BinOp::MergeArrow => {
            let mut merged = Vec::with_capacity(items.len());
            for &item in &items {
                let tuple = item
                    .as_tuple()
                    .ok_or_else(|| Failure::type_mismatch("=>", "tuple", item))?;
                let extra = project(item)?;
                let extra = extra
                    .as_tuple()
                    .ok_or_else(|| Failure::type_mismatch("=>", "tuple", &extra))?;
                merged.push(tuple.merge(extra));
            }
            if is_array {
                Ok(Value::array(merged.into_iter().map(Value::Tuple)))
            } else {
                Ok(Value::Set(Set::relation(merged)?))
            }
        }
        BinOp::Where => {
            let mut kept = Vec::new();
            for item in items {
                if project(item)?.truthy() {
                    kept.push(item.clone());
                }
            }
            Ok(collect(kept))
        }
        BinOp::Order => {
            let mut keyed = items
                .into_iter()
                .map(|v| -> Result<(Value, Value)> { Ok((project(v)?, v.clone())) })
                .collect::<Result<Vec<_>>>()?;
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            Ok(Value::array(keyed.into_iter().map(|(_, v)| v)))
        }
        BinOp::Sum | BinOp::Mean | BinOp::Median | BinOp::Min | BinOp::Max => {
            let projected = items
                .into_iter()
                .map(|v| project(v))
                .collect::<Result<Vec<_>>>()?;
            aggregate(op, projected)
        }
        _ => Err(Failure::NotSupported(format!(
            "{} in an element context",
            op.symbol()
        ))),
    }
}

fn aggregate(op: BinOp, values: Vec<Value>) -> Result<Value> {
    if values.is_empty() {
        return match op {
            BinOp::Sum => Ok(Value::Number(0.0)),
            _ => Err(Failure::EmptyAggregate(op.symbol())),
        };
    }
    match op {
        BinOp::Sum => Ok(Value::Number(numbers(op, values)?.iter().sum())),
        BinOp::Mean => {
            let ns = numbers(op, values)?;
            Ok(Value::Number(ns.iter().sum::<f64>() / ns.len() as f64))
        }
        BinOp::Median => {
            let mut ns = numbers(op, values)?;
            ns.sort_by(|a, b| number::compare(*a, *b));
            let mid = ns.len() / 2;
            if ns.len() % 2 == 0 {
                Ok(Value::Number((ns[mid - 1] + ns[mid]) / 2.0))
            } else {
                Ok(Value::Number(ns[mid]))
            }
        }
        BinOp::Min => Ok(values.into_iter().min().unwrap_or(Value::None)),
        BinOp::Max => Ok(values.into_iter().max().unwrap_or(Value::None)),
        _ => Err(Failure::NotSupported(format!("aggregate {}", op.symbol()))),
    }
}
