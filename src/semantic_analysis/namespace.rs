//! Scopes and bindings (spec §3: "Scope / Context" and "Binding").
//!
//! `core_lang`'s own `Namespace` is a `HashMap<Ident, TypedDeclaration>` per
//! module plus trait-impl and sub-module tables — built for a language with
//! modules, traits and generics. This language has neither, so the
//! namespace here keeps only what spec §3 actually describes: a parent
//! chain of scopes, each owning its own bindings, with the intrusive
//! linked list of `core_lang`'s C ancestor replaced by a `HashMap` (spec
//! §9's redesign note: "ownership of children moves from intrusive parent
//! pointers to exclusive-owner semantics").

use std::collections::HashMap;

use crate::error::CompileError;
use crate::parse_tree::ProcId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// Links a name to the declaration that introduced it. `Type` has no
/// payload: `integer` is the only type name and it is pre-bound into the
/// builtin scope once, at namespace construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    FParam { proc: ProcId, nid: u32 },
    Var { proc: ProcId, nid: u32 },
    Proc(ProcId),
    Type,
}

#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<String, Binding>,
}

/// Owns every scope created over the course of resolving one program. The
/// builtin scope (id 0) is pre-populated with exactly one binding,
/// `integer -> Binding::Type`, matching spec §3.
#[derive(Debug)]
pub struct Namespace {
    scopes: Vec<Scope>,
    pub builtin: ScopeId,
}

impl Namespace {
    pub fn new() -> Self {
        let mut builtin = Scope::default();
        builtin.bindings.insert("integer".to_string(), Binding::Type);
        Namespace {
            scopes: vec![builtin],
            builtin: ScopeId(0),
        }
    }

    pub fn new_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            parent: Some(parent),
            bindings: HashMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn local_lookup(&self, scope: ScopeId, name: &str) -> Option<Binding> {
        self.scopes[scope.0].bindings.get(name).copied()
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<Binding> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(binding) = self.local_lookup(id, name) {
                return Some(binding);
            }
            current = self.scopes[id.0].parent;
        }
        None
    }

    /// Fails if `name` is already bound *locally* in `scope` (spec §4.2:
    /// "fail if the name already exists locally"); shadowing a binding in a
    /// parent scope is not checked here because this language never
    /// declares peers across scope levels that would collide that way.
    pub fn bind(&mut self, scope: ScopeId, name: &str, binding: Binding) -> Result<(), CompileError> {
        if self.local_lookup(scope, name).is_some() {
            return Err(CompileError::AlreadyBound {
                name: name.to_string(),
            });
        }
        self.scopes[scope.0]
            .bindings
            .insert(name.to_string(), binding);
        Ok(())
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Namespace::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_integer_resolves_from_nested_scope() {
        let mut ns = Namespace::new();
        let global = ns.new_scope(ns.builtin);
        let proc_scope = ns.new_scope(global);
        assert_eq!(ns.lookup(proc_scope, "integer"), Some(Binding::Type));
    }

    #[test]
    fn duplicate_local_bind_fails() {
        let mut ns = Namespace::new();
        let global = ns.new_scope(ns.builtin);
        ns.bind(global, "f", Binding::Proc(ProcId(0))).unwrap();
        assert!(ns.bind(global, "f", Binding::Proc(ProcId(1))).is_err());
    }

    #[test]
    fn shadow_in_child_scope_is_allowed() {
        let mut ns = Namespace::new();
        let global = ns.new_scope(ns.builtin);
        let proc_scope = ns.new_scope(global);
        ns.bind(global, "x", Binding::Proc(ProcId(0))).unwrap();
        assert!(ns
            .bind(proc_scope, "x", Binding::Var { proc: ProcId(0), nid: 0 })
            .is_ok());
    }
}
