//! Failure taxonomy shared by the compiler, the evaluator and the translators.
//!
//! Every operation in the core returns a [`Failure`] instead of panicking. None of
//! them are fatal: callers decide whether to report, retry with other input, or
//! give up.

use thiserror::Error;

/// A typed failure produced while parsing, compiling, evaluating or translating.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Failure {
    /// Source text does not match the grammar.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    /// The syntax tree does not have the shape the compiler expects. This is a
    /// grammar/compiler mismatch rather than a user error.
    #[error("malformed syntax tree: {0}")]
    MalformedTree(String),

    /// A tuple entry omitted its key and none could be inferred.
    #[error("cannot infer attribute name for {0}")]
    AmbiguousAttributeName(String),

    #[error("duplicate attribute {0:?}")]
    DuplicateAttribute(String),

    #[error("unbound name {0:?}")]
    UnboundName(String),

    #[error("no attribute {attr:?} in {value}")]
    NoSuchAttribute { attr: String, value: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("{0} of empty input")]
    EmptyAggregate(&'static str),

    /// Relation construction or combination with inconsistent tuple shapes.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("{op}: expected {expected}, got {actual}")]
    TypeMismatch {
        op: String,
        expected: &'static str,
        actual: String,
    },

    /// A value has no equivalent in the target representation.
    #[error("cannot represent {value} as {target}")]
    Unrepresentable { value: String, target: &'static str },

    #[error("input not consumed at {line}:{column}")]
    InputNotConsumed { line: usize, column: usize },

    /// The host package loader failed. The message is opaque to the core.
    #[error("failed to load package {reference:?}: {message}")]
    Load { reference: String, message: String },

    #[error("local import {0:?} invalid; no source directory")]
    MissingSourceDir(String),

    #[error("{0} is not supported")]
    NotSupported(String),

    /// An embedded grammar failed to compile or lacks the requested rule.
    #[error("grammar error: {0}")]
    Grammar(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

impl Failure {
    pub(crate) fn type_mismatch(
        op: impl Into<String>,
        expected: &'static str,
        actual: &crate::value::Value,
    ) -> Self {
        Failure::TypeMismatch {
            op: op.into(),
            expected,
            actual: actual.kind().to_string(),
        }
    }

    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Failure::ShapeMismatch(message.into())
    }
}

/// Result type used throughout the core.
pub type Result<T, E = Failure> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_display() {
        let err = Failure::Parse {
            message: "expected expr".to_string(),
            line: 1,
            column: 4,
        };
        assert_eq!(err.to_string(), "parse error at 1:4: expected expr");

        let err = Failure::NoSuchAttribute {
            attr: "b".to_string(),
            value: "(a: 1)".to_string(),
        };
        assert_eq!(err.to_string(), "no attribute \"b\" in (a: 1)");

        assert_eq!(Failure::DivisionByZero.to_string(), "division by zero");
        assert_eq!(
            Failure::EmptyAggregate("median").to_string(),
            "median of empty input"
        );
        assert_eq!(
            Failure::InputNotConsumed { line: 2, column: 3 }.to_string(),
            "input not consumed at 2:3"
        );
    }
}
