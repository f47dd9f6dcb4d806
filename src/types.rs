//! The type model (spec §3). `core_lang`'s own type engine interns types
//! behind a `TypeId` and unifies inference variables — far more machinery
//! than this language needs, since it has exactly one scalar type and no
//! inference. Spec §9's own redesign note for "Type identity" asks for
//! exactly what's here: structural equality on a small sum type stands in
//! for the original's singleton-pointer/`memcmp` scheme, because in Rust
//! `#[derive(PartialEq)]` on a value type already *is* "byte-identical
//! images", and `Type::Integer` being a unit variant already *is* the
//! singleton the C source constructs once and compares by pointer.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcType {
    pub params: Vec<Type>,
    pub return_type: Option<Box<Type>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Stands in for "no value": zero-initialized declaration storage
    /// before a type is attached (spec §3), and also what the type
    /// checker assigns to the result of calling a procedure that returns
    /// nothing, wherever an expression is expected to produce one. Since
    /// it never equals `Integer`, using such a call as a value falls out
    /// of the existing mismatch checks instead of needing a case of its
    /// own.
    Uninitialized,
    Integer,
    Proc(ProcType),
}

impl Type {
    pub fn is_proc(&self) -> bool {
        matches!(self, Type::Proc(_))
    }

    pub fn as_proc(&self) -> Option<&ProcType> {
        match self {
            Type::Proc(p) => Some(p),
            _ => None,
        }
    }
}

/// Attached to every expression, parameter, variable, and procedure (spec
/// §3). `is_lvalue` distinguishes assignable storage from the values
/// expressions produce; `is_constant` marks procedures — assignable-like in
/// that they name storage but may never be the target of `:=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualType {
    pub ty: Type,
    pub is_lvalue: bool,
    pub is_constant: bool,
}

impl ActualType {
    pub fn rvalue(ty: Type) -> Self {
        ActualType {
            ty,
            is_lvalue: false,
            is_constant: false,
        }
    }

    pub fn lvalue(ty: Type) -> Self {
        ActualType {
            ty,
            is_lvalue: true,
            is_constant: false,
        }
    }

    pub fn constant(ty: Type) -> Self {
        ActualType {
            ty,
            is_lvalue: true,
            is_constant: true,
        }
    }
}
