use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::Value;
use crate::error::Result;
use crate::expr::Expr;
use crate::scope::Scope;

/// Signature of a host-provided function.
pub type NativeFn = dyn Fn(Value) -> Result<Value> + Send + Sync;

/// A single-parameter function value.
#[derive(Clone)]
pub enum Function {
    Closure(Closure),
    Native(Native),
}

/// A compiled body together with the scope it was created in.
#[derive(Clone)]
pub struct Closure {
    pub(crate) param: String,
    pub(crate) body: Arc<Expr>,
    pub(crate) scope: Scope,
}

/// A function implemented by the host, identified by name.
#[derive(Clone)]
pub struct Native {
    name: String,
    func: Arc<NativeFn>,
}

impl Function {
    pub fn closure(param: impl Into<String>, body: Arc<Expr>, scope: Scope) -> Function {
        Function::Closure(Closure {
            param: param.into(),
            body,
            scope,
        })
    }

    pub fn native(
        name: impl Into<String>,
        func: impl Fn(Value) -> Result<Value> + Send + Sync + 'static,
    ) -> Function {
        Function::Native(Native {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    /// Applies the function. A closure evaluates its body with `arg` bound to
    /// its parameter in a child of the captured scope.
    pub fn call(&self, arg: Value) -> Result<Value> {
        match self {
            Function::Closure(c) => {
                tracing::trace!(param = %c.param, "apply closure");
                c.body.eval(&c.scope.bind(c.param.clone(), arg))
            }
            Function::Native(n) => {
                tracing::trace!(name = %n.name, "apply native");
                (n.func)(arg)
            }
        }
    }
}

impl Closure {
    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }
}

impl Native {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Function {}

impl PartialOrd for Function {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Function {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Function::Closure(a), Function::Closure(b)) => a
                .param
                .cmp(&b.param)
                .then_with(|| a.body.to_string().cmp(&b.body.to_string()))
                .then_with(|| a.scope.addr().cmp(&b.scope.addr())),
            (Function::Native(a), Function::Native(b)) => a.name.cmp(&b.name),
            (Function::Closure(_), Function::Native(_)) => Ordering::Less,
            (Function::Native(_), Function::Closure(_)) => Ordering::Greater,
        }
    }
}

impl Hash for Function {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Function::Closure(c) => {
                c.param.hash(state);
                c.body.to_string().hash(state);
            }
            Function::Native(n) => n.name.hash(state),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Closure(c) => write!(f, "\\{} {}", c.param, c.body),
            Function::Native(n) => write!(f, "<native {}>", n.name),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({self})")
    }
}
