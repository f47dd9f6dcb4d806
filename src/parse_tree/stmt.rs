//! Statements (spec §3).

use crate::semantic_analysis::namespace::Binding;
use crate::span::Span;

use super::decl::ProcId;
use super::expr::Expr;

#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        lvalue: Expr,
        rvalue: Expr,
        span: Span,
    },
    For {
        var_name: String,
        bind: Option<Binding>,
        from: Expr,
        to: Expr,
        body: Vec<Stmt>,
        span: Span,
    },
    Return {
        proc: ProcId,
        expr: Option<Expr>,
        span: Span,
    },
    Call {
        expr: Expr,
        span: Span,
    },
}
