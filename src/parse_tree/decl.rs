//! Declarations: procedures, formal parameters, local variables (spec §3).

use crate::semantic_analysis::namespace::{Binding, ScopeId};
use crate::span::Span;
use crate::types::ActualType;

use super::stmt::Stmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcId(pub usize);

#[derive(Debug, Clone)]
pub struct FParam {
    pub nid: u32,
    pub name: String,
    pub type_name: String,
    pub type_bind: Option<Binding>,
    pub actual_type: Option<ActualType>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Var {
    pub nid: u32,
    pub name: String,
    pub type_name: String,
    pub type_bind: Option<Binding>,
    pub actual_type: Option<ActualType>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Proc {
    pub nid: ProcId,
    pub name: String,
    pub fparams: Vec<FParam>,
    pub is_function: bool,
    pub return_type_name: Option<String>,
    pub return_type_bind: Option<Binding>,
    pub return_actual_type: Option<ActualType>,
    pub vars: Vec<Var>,
    pub body: Vec<Stmt>,
    /// Set when the trailing `end <name>;` repeats the procedure's own
    /// name. The name is inherited as-is from the original source, where
    /// it is set on a *match*, not a mismatch — see DESIGN.md. Nothing
    /// downstream reads it; it is a diagnostic breadcrumb only.
    pub mismatch: bool,
    pub actual_type: Option<ActualType>,
    /// This procedure's own scope, a child of the program's global scope.
    /// Set by the parser when the procedure header is parsed, since
    /// formal-parameter and return-type names must resolve *within* it
    /// during the per-procedure name-resolution pass.
    pub scope: ScopeId,
    pub span: Span,
}

impl Proc {
    pub fn fparam_count(&self) -> usize {
        self.fparams.len()
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }
}
