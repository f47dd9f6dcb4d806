//! Expressions (spec §3). A tagged variant rather than `core_lang`'s
//! `union` + `ExprType` discriminant — `match` on `ExprKind` is the
//! compile-time exhaustiveness check spec §9 asks for in place of the
//! source's `default: assert(0)` idiom.

use crate::semantic_analysis::namespace::Binding;
use crate::span::Span;
use crate::types::ActualType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Mult,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Id {
        name: String,
        bind: Option<Binding>,
    },
    Num(i32),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub actual_type: Option<ActualType>,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            actual_type: None,
            span,
        }
    }
}
