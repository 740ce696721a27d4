//! Relish: a relational expression language.
//!
//! Source text is compiled by [`syntax::parse_source`] into an [`Expr`], which
//! evaluates against a [`Scope`] to an immutable [`Value`]. Package loading is
//! delegated to the host through [`package::PackageLoader`].

pub mod cli;
pub mod config;
pub mod error;
pub mod expr;
pub mod package;
pub mod scope;
pub mod syntax;
pub mod translate;
pub mod value;

pub use error::{Failure, Result};
pub use expr::Expr;
pub use scope::Scope;
pub use syntax::parse_source;
pub use value::Value;
