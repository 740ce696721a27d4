//! Operators over already-evaluated values.

use std::cmp::Ordering;

use crate::error::{Failure, Result};
use crate::value::Value;

/* ===================== Operator Kinds ===================== */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    /// `->`, map into a set
    Arrow,
    /// `>>`, map into an array
    SeqArrow,
    /// `=>`, merge each tuple with a computed tuple
    MergeArrow,
    Where,
    Order,
    Sum,
    Max,
    Mean,
    Median,
    Min,
    With,
    Without,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Add,
    Sub,
    Join,
    Mul,
    Div,
    Mod,
    SubMod,
    IntDiv,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnOp {
    Pos,
    Neg,
    Not,
    /// `*e`, force a deferred value
    Eval,
    /// `**e`
    PowerSet,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Arrow => "->",
            BinOp::SeqArrow => ">>",
            BinOp::MergeArrow => "=>",
            BinOp::Where => "where",
            BinOp::Order => "order",
            BinOp::Sum => "sum",
            BinOp::Max => "max",
            BinOp::Mean => "mean",
            BinOp::Median => "median",
            BinOp::Min => "min",
            BinOp::With => "with",
            BinOp::Without => "without",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Join => "<&>",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::SubMod => "-%",
            BinOp::IntDiv => "//",
            BinOp::Pow => "**",
        }
    }

    /// Operators whose right operand is evaluated once per element of the left.
    pub fn is_per_element(self) -> bool {
        matches!(
            self,
            BinOp::Arrow
                | BinOp::SeqArrow
                | BinOp::MergeArrow
                | BinOp::Where
                | BinOp::Order
                | BinOp::Sum
                | BinOp::Max
                | BinOp::Mean
                | BinOp::Median
                | BinOp::Min
        )
    }
}

impl UnOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnOp::Pos => "+",
            UnOp::Neg => "-",
            UnOp::Not => "!",
            UnOp::Eval => "*",
            UnOp::PowerSet => "**",
        }
    }
}

/* ===================== Unary ===================== */

pub(crate) fn apply_unary(op: UnOp, value: Value) -> Result<Value> {
    match op {
        UnOp::Pos => number(op.symbol(), &value).map(Value::Number),
        UnOp::Neg => number(op.symbol(), &value).map(|n| Value::Number(-n)),
        UnOp::Not => Ok(Value::bool(!value.truthy())),
        UnOp::Eval => match value {
            Value::Function(f) => f.call(Value::None),
            other => Ok(other),
        },
        UnOp::PowerSet => match value {
            Value::Set(s) => Ok(Value::Set(s.power_set())),
            other => Err(Failure::type_mismatch(op.symbol(), "set", &other)),
        },
    }
}

/* ===================== Binary ===================== */

fn number(op: &str, value: &Value) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| Failure::type_mismatch(op, "number", value))
}

fn compare(op: BinOp, ordering: Ordering) -> bool {
    match op {
        BinOp::Eq => ordering == Ordering::Equal,
        BinOp::Ne => ordering != Ordering::Equal,
        BinOp::Lt => ordering == Ordering::Less,
        BinOp::Gt => ordering == Ordering::Greater,
        BinOp::Le => ordering != Ordering::Greater,
        BinOp::Ge => ordering != Ordering::Less,
        _ => false,
    }
}

fn arithmetic(op: BinOp, a: f64, b: f64) -> Result<f64> {
    let divides = matches!(op, BinOp::Div | BinOp::Mod | BinOp::SubMod | BinOp::IntDiv);
    if divides && b == 0.0 {
        return Err(Failure::DivisionByZero);
    }
    Ok(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        BinOp::Mod => a % b,
        BinOp::SubMod => a - a % b,
        BinOp::IntDiv => (a / b).floor(),
        BinOp::Pow => a.powf(b),
        _ => return Err(Failure::NotSupported(format!("arithmetic {}", op.symbol()))),
    })
}

/// Applies an operator whose operands are both evaluated up front.
pub(crate) fn apply_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    match op {
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
            Ok(Value::bool(compare(op, lhs.cmp(&rhs))))
        }
        BinOp::Add
        | BinOp::Sub
        | BinOp::Mul
        | BinOp::Div
        | BinOp::Mod
        | BinOp::SubMod
        | BinOp::IntDiv
        | BinOp::Pow => {
            let a = number(op.symbol(), &lhs)?;
            let b = number(op.symbol(), &rhs)?;
            arithmetic(op, a, b).map(Value::Number)
        }
        BinOp::Join => match (&lhs, &rhs) {
            (Value::Set(a), Value::Set(b)) => a.join(b).map(Value::Set),
            _ => Err(Failure::shape(format!(
                "<&> requires two relations, got {} and {}",
                lhs.kind(),
                rhs.kind()
            ))),
        },
        BinOp::With => with(lhs, rhs),
        BinOp::Without => without(lhs, rhs),
        _ => Err(Failure::NotSupported(format!(
            "{} outside an element context",
            op.symbol()
        ))),
    }
}

fn with(lhs: Value, rhs: Value) -> Result<Value> {
    match (&lhs, rhs) {
        (Value::Set(s), rhs) => s.with(rhs).map(Value::Set),
        (Value::Tuple(t), Value::Tuple(u)) => Ok(Value::Tuple(t.merge(&u))),
        (Value::Array(a), rhs) => Ok(Value::Array(a.push(rhs))),
        (Value::Tuple(_), rhs) => Err(Failure::type_mismatch("with", "tuple", &rhs)),
        _ => Err(Failure::type_mismatch("with", "set, tuple or array", &lhs)),
    }
}

fn without(lhs: Value, rhs: Value) -> Result<Value> {
    match (&lhs, &rhs) {
        (Value::Set(s), rhs) => Ok(Value::Set(s.without(rhs))),
        (Value::Tuple(t), Value::String(name)) => Ok(Value::Tuple(t.without(name))),
        (Value::Tuple(t), Value::Set(names)) => {
            let mut rest = t.clone();
            for name in names {
                let name = name
                    .as_str()
                    .ok_or_else(|| Failure::type_mismatch("without", "string", name))?;
                rest = rest.without(name);
            }
            Ok(Value::Tuple(rest))
        }
        (Value::Array(a), rhs) => Ok(Value::array(a.iter().filter(|v| *v != rhs).cloned())),
        (Value::Tuple(_), rhs) => Err(Failure::type_mismatch("without", "name or set of names", rhs)),
        _ => Err(Failure::type_mismatch("without", "set, tuple or array", &lhs)),
    }
}
