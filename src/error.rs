//! Every phase collapses its outcome into `Result<T, CompileError>` — spec
//! §7 rules out error recovery, so unlike `core_lang`'s `CompileResult<T>`
//! (which accumulates warnings and errors across a whole compilation) there
//! is nothing to accumulate: the first error aborts its phase and is handed
//! straight back to the caller.

use crate::span::Position;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CompileError {
    #[error("{0}: syntax error")]
    Syntax(Position),

    #[error("`{name}` is already bound in this scope")]
    AlreadyBound { name: String },

    #[error("unresolved identifier `{name}`")]
    UnresolvedIdent { name: String },

    #[error("unresolved type `{name}`")]
    UnresolvedType { name: String },

    #[error("a type name cannot be used as a value")]
    TypeUsedAsValue,

    #[error("operands of `+`/`*` must both be `integer`")]
    NonIntegerOperand,

    #[error("`{name}` is not callable")]
    NotCallable { name: String },

    #[error("call expects {expected} argument(s), found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("argument {index} has the wrong type")]
    ArgTypeMismatch { index: usize },

    #[error("left-hand side of `:=` is not an assignable location")]
    NotAnLvalue,

    #[error("cannot assign to a constant")]
    AssignToConstant,

    #[error("the two sides of `:=` have different types")]
    AssignTypeMismatch,

    #[error("`for` bounds must be `integer` expressions")]
    NonIntegerLoopBound,

    #[error("`for` loop variable `{name}` must be a local `integer` variable")]
    BadLoopVar { name: String },

    #[error("no procedure named `main` was found")]
    MissingMain,

    #[error("the interpreter encountered an invalid opcode")]
    InvalidOpcode,

    #[error("procedure `{name}` has more than {max} {what} (JIT immediate-8 limit)")]
    FrameTooLarge {
        name: String,
        what: &'static str,
        max: usize,
    },

    #[error("failed to map executable memory: {0}")]
    MapExec(String),
}

pub type CompileResult<T> = Result<T, CompileError>;
