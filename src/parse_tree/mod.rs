//! The abstract syntax tree, following `core_lang`'s own `parse_tree`
//! module split: one file per node family instead of one giant enum file.

pub mod decl;
pub mod expr;
pub mod stmt;

pub use decl::{FParam, Proc, ProcId, Var};
pub use expr::{BinaryOp, Expr, ExprKind};
pub use stmt::Stmt;
