//! Compiled expression tree
//!
//! An [`Expr`] is produced once by the compiler and can be evaluated any number of
//! times against different scopes. Evaluation lives in `eval.rs`; operators on
//! plain values in `ops.rs`; operators that bind each element of a collection
//! and evaluate their right operand per element in `relational.rs`.

mod eval;
mod ops;
mod relational;

#[cfg(test)]
mod tests;

use std::fmt;
use std::sync::Arc;

use crate::package::PackageKind;
use crate::scope::CURRENT;
use crate::value::{fmt_name, Value};

pub use ops::{BinOp, UnOp};

/// A node of the compiled operator tree.
#[derive(Clone, Debug)]
pub enum Expr {
    Literal(Value),
    Ident(String),
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// `a && b`, short-circuiting.
    And(Box<Expr>, Box<Expr>),
    /// `a || b`, short-circuiting.
    Or(Box<Expr>, Box<Expr>),
    /// `then if cond else otherwise`
    IfElse {
        then: Box<Expr>,
        cond: Box<Expr>,
        otherwise: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arg: Box<Expr>,
    },
    Dot {
        subject: Box<Expr>,
        attr: String,
    },
    /// `subject.*`
    DotAll(Box<Expr>),
    Count(Box<Expr>),
    /// `subject ->* path (args)`, a nested update.
    Touch {
        subject: Box<Expr>,
        path: Vec<String>,
        args: Vec<Expr>,
    },
    Nest {
        subject: Box<Expr>,
        names: Vec<String>,
        attr: String,
    },
    Unnest {
        subject: Box<Expr>,
        attr: String,
    },
    Tuple(Vec<(String, Expr)>),
    Set(Vec<Expr>),
    Array(Vec<Expr>),
    Relation {
        names: Vec<String>,
        rows: Vec<Vec<Expr>>,
    },
    Tree {
        tag: String,
        attrs: Vec<(String, Expr)>,
        children: Vec<Expr>,
    },
    Function {
        param: String,
        body: Arc<Expr>,
    },
    /// The loader bound in scope for a package form.
    Package(PackageKind),
    /// `{: grammar . rule : text :}`
    Embed {
        grammar: Box<Expr>,
        rule: String,
        text: String,
    },
}

/* ===================== Builders ===================== */

impl Expr {
    pub fn literal(value: impl Into<Value>) -> Expr {
        Expr::Literal(value.into())
    }

    pub fn ident(name: impl Into<String>) -> Expr {
        Expr::Ident(name.into())
    }

    /// The element bound by the innermost arrow, `.`.
    pub fn current() -> Expr {
        Expr::Ident(CURRENT.to_string())
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn unary(op: UnOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn call(callee: Expr, arg: Expr) -> Expr {
        Expr::Call {
            callee: Box::new(callee),
            arg: Box::new(arg),
        }
    }

    pub fn dot(subject: Expr, attr: impl Into<String>) -> Expr {
        Expr::Dot {
            subject: Box::new(subject),
            attr: attr.into(),
        }
    }

    pub fn function(param: impl Into<String>, body: Expr) -> Expr {
        Expr::Function {
            param: param.into(),
            body: Arc::new(body),
        }
    }

    /// Name a tuple entry with an omitted key takes: the last attribute name
    /// on the dotted path, looking through left operands of binary operators.
    pub fn inferred_name(&self) -> Option<&str> {
        match self {
            Expr::Dot { attr, .. } => Some(attr),
            Expr::Binary { lhs, .. } | Expr::And(lhs, _) | Expr::Or(lhs, _) => lhs.inferred_name(),
            _ => None,
        }
    }
}

/* ===================== Rendering ===================== */

fn write_list<T>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
    mut write: impl FnMut(&mut fmt::Formatter<'_>, &T) -> fmt::Result,
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write(f, item)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{v}"),
            Expr::Ident(name) if name == CURRENT => f.write_str("."),
            Expr::Ident(name) => fmt_name(f, name),
            Expr::Unary { op, operand } => write!(f, "{}({operand})", op.symbol()),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::And(l, r) => write!(f, "({l} && {r})"),
            Expr::Or(l, r) => write!(f, "({l} || {r})"),
            Expr::IfElse {
                then,
                cond,
                otherwise,
            } => write!(f, "({then} if {cond} else {otherwise})"),
            Expr::Call { callee, arg } => write!(f, "{callee}({arg})"),
            Expr::Dot { subject, attr } => {
                if !matches!(subject.as_ref(), Expr::Ident(n) if n == CURRENT) {
                    write!(f, "{subject}")?;
                }
                f.write_str(".")?;
                fmt_name(f, attr)
            }
            Expr::DotAll(subject) => write!(f, "{subject}.*"),
            Expr::Count(subject) => write!(f, "{subject} count"),
            Expr::Touch {
                subject,
                path,
                args,
            } => {
                write!(f, "{subject}")?;
                for step in path {
                    f.write_str(" ->* ")?;
                    fmt_name(f, step)?;
                }
                f.write_str("(")?;
                write_list(f, args, |f, a| write!(f, "{a}"))?;
                f.write_str(")")
            }
            Expr::Nest {
                subject,
                names,
                attr,
            } => {
                write!(f, "({subject} nest |")?;
                write_list(f, names, |f, n| fmt_name(f, n))?;
                f.write_str("| ")?;
                fmt_name(f, attr)?;
                f.write_str(")")
            }
            Expr::Unnest { subject, attr } => {
                write!(f, "({subject} unnest ")?;
                fmt_name(f, attr)?;
                f.write_str(")")
            }
            Expr::Tuple(entries) => {
                f.write_str("(")?;
                write_list(f, entries, |f, (k, v)| {
                    fmt_name(f, k)?;
                    write!(f, ": {v}")
                })?;
                f.write_str(")")
            }
            Expr::Set(items) => {
                f.write_str("{")?;
                write_list(f, items, |f, v| write!(f, "{v}"))?;
                f.write_str("}")
            }
            Expr::Array(items) => {
                f.write_str("[")?;
                write_list(f, items, |f, v| write!(f, "{v}"))?;
                f.write_str("]")
            }
            Expr::Relation { names, rows } => {
                f.write_str("{|")?;
                write_list(f, names, |f, n| fmt_name(f, n))?;
                f.write_str("| ")?;
                write_list(f, rows, |f, row| {
                    f.write_str("(")?;
                    write_list(f, row, |f, v| write!(f, "{v}"))?;
                    f.write_str(")")
                })?;
                f.write_str("}")
            }
            Expr::Tree {
                tag,
                attrs,
                children,
            } => {
                write!(f, "<{tag}")?;
                for (name, value) in attrs {
                    write!(f, " {name}={{{value}}}")?;
                }
                f.write_str(">")?;
                for child in children {
                    write!(f, "{{{child}}}")?;
                }
                write!(f, "</{tag}>")
            }
            Expr::Function { param, body } => write!(f, "\\{param} {body}"),
            Expr::Package(kind) => f.write_str(kind.binding()),
            Expr::Embed {
                grammar,
                rule,
                text,
            } => write!(f, "{{:({grammar}).{rule}:{text}:}}"),
        }
    }
}
