//! Operator tables
//!
//! Maps operator spellings, as they appear in the syntax tree, to the expression
//! constructors the compiler folds operands with.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::expr::{BinOp, Expr, UnOp};

/// Constructor for a binary operator spelling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binary {
    Op(BinOp),
    And,
    Or,
}

impl Binary {
    pub fn build(self, lhs: Expr, rhs: Expr) -> Expr {
        match self {
            Binary::Op(op) => Expr::binary(op, lhs, rhs),
            Binary::And => Expr::And(Box::new(lhs), Box::new(rhs)),
            Binary::Or => Expr::Or(Box::new(lhs), Box::new(rhs)),
        }
    }
}

const BINARY_OPS: [BinOp; 27] = [
    BinOp::Arrow,
    BinOp::SeqArrow,
    BinOp::MergeArrow,
    BinOp::Where,
    BinOp::Order,
    BinOp::Sum,
    BinOp::Max,
    BinOp::Mean,
    BinOp::Median,
    BinOp::Min,
    BinOp::With,
    BinOp::Without,
    BinOp::Eq,
    BinOp::Ne,
    BinOp::Lt,
    BinOp::Gt,
    BinOp::Le,
    BinOp::Ge,
    BinOp::Add,
    BinOp::Sub,
    BinOp::Join,
    BinOp::Mul,
    BinOp::Div,
    BinOp::Mod,
    BinOp::SubMod,
    BinOp::IntDiv,
    BinOp::Pow,
];

const UNARY_OPS: [UnOp; 5] = [UnOp::Pos, UnOp::Neg, UnOp::Not, UnOp::Eval, UnOp::PowerSet];

static BINARY: OnceLock<HashMap<&'static str, Binary>> = OnceLock::new();
static UNARY: OnceLock<HashMap<&'static str, UnOp>> = OnceLock::new();

/// Looks up a binary operator by spelling.
pub fn binary(symbol: &str) -> Option<Binary> {
    BINARY
        .get_or_init(|| {
            let mut table: HashMap<_, _> = BINARY_OPS
                .iter()
                .map(|op| (op.symbol(), Binary::Op(*op)))
                .collect();
            table.insert("&&", Binary::And);
            table.insert("||", Binary::Or);
            table
        })
        .get(symbol)
        .copied()
}

/// Looks up a prefix operator by spelling.
pub fn unary(symbol: &str) -> Option<UnOp> {
    UNARY
        .get_or_init(|| UNARY_OPS.iter().map(|op| (op.symbol(), *op)).collect())
        .get(symbol)
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_spelling_resolves() {
        for op in BINARY_OPS {
            assert_eq!(binary(op.symbol()), Some(Binary::Op(op)));
        }
        for op in UNARY_OPS {
            assert_eq!(unary(op.symbol()), Some(op));
        }
        assert_eq!(binary("&&"), Some(Binary::And));
        assert_eq!(binary("||"), Some(Binary::Or));
        assert_eq!(binary("??"), None);
    }

    #[test]
    fn test_and_builds_short_circuit_node() {
        let expr = Binary::And.build(Expr::literal(1.0), Expr::literal(2.0));
        assert!(matches!(expr, Expr::And(_, _)));
    }
}
