//! Name resolution (spec §4.2), grounded in `original_source/binds.c`: a
//! global pass that registers every procedure before anything else is
//! looked at, followed by one pass per procedure over its own signature,
//! locals and body. A name always resolves by walking the current scope's
//! parent chain (`Namespace::lookup`), so a procedure's formals and locals
//! can shadow another procedure's name, but never a peer in the same scope.

use crate::error::{CompileError, CompileResult};
use crate::parse_tree::{Expr, ExprKind, Proc, Stmt};

use super::namespace::{Binding, Namespace, ScopeId};

/// Binds every procedure name into `global_scope`, then resolves each
/// procedure's own return type, formals, locals and body in turn.
///
/// Procedures are bound globally first so that forward calls — a
/// procedure calling one declared later in the file — resolve; the spec
/// calls this out explicitly (§4.2: "first pass establishes every
/// procedure's name before the second pass looks inside any of them").
pub fn resolve_program(
    procs: &mut [Proc],
    namespace: &mut Namespace,
    global_scope: ScopeId,
) -> CompileResult<()> {
    for proc in procs.iter() {
        namespace.bind(global_scope, &proc.name, Binding::Proc(proc.nid))?;
    }
    for proc in procs.iter_mut() {
        resolve_proc(proc, namespace)?;
    }
    Ok(())
}

fn resolve_proc(proc: &mut Proc, namespace: &mut Namespace) -> CompileResult<()> {
    // Per SPEC_FULL.md §C: the declared return type is only resolved (and
    // later type-attached) when the procedure is a function. The original
    // source resolves it unconditionally and the type checker then
    // dereferences an unset binding for void procedures; this crate
    // follows spec §4.2's prose instead of reproducing that.
    if proc.is_function {
        let type_name = proc
            .return_type_name
            .as_ref()
            .expect("is_function implies a declared return type name");
        proc.return_type_bind = Some(resolve_type_name(namespace, proc.scope, type_name)?);
    }

    for fparam in proc.fparams.iter_mut() {
        fparam.type_bind = Some(resolve_type_name(namespace, proc.scope, &fparam.type_name)?);
        namespace.bind(
            proc.scope,
            &fparam.name,
            Binding::FParam {
                proc: proc.nid,
                nid: fparam.nid,
            },
        )?;
    }

    for var in proc.vars.iter_mut() {
        var.type_bind = Some(resolve_type_name(namespace, proc.scope, &var.type_name)?);
        namespace.bind(
            proc.scope,
            &var.name,
            Binding::Var {
                proc: proc.nid,
                nid: var.nid,
            },
        )?;
    }

    resolve_stmts(&mut proc.body, proc.scope, namespace)
}

/// A declared type name must resolve to the `Binding::Type` the builtin
/// scope pre-populates (spec §3: `integer` is the only type). Resolving to
/// anything else — a shadowing variable or procedure — is as much an
/// error as not resolving at all, so both collapse to `UnresolvedType`.
fn resolve_type_name(namespace: &Namespace, scope: ScopeId, name: &str) -> CompileResult<Binding> {
    match namespace.lookup(scope, name) {
        Some(Binding::Type) => Ok(Binding::Type),
        _ => Err(CompileError::UnresolvedType {
            name: name.to_string(),
        }),
    }
}

fn resolve_ident(namespace: &Namespace, scope: ScopeId, name: &str) -> CompileResult<Binding> {
    namespace
        .lookup(scope, name)
        .ok_or_else(|| CompileError::UnresolvedIdent {
            name: name.to_string(),
        })
}

fn resolve_stmts(stmts: &mut [Stmt], scope: ScopeId, namespace: &Namespace) -> CompileResult<()> {
    for stmt in stmts.iter_mut() {
        resolve_stmt(stmt, scope, namespace)?;
    }
    Ok(())
}

fn resolve_stmt(stmt: &mut Stmt, scope: ScopeId, namespace: &Namespace) -> CompileResult<()> {
    match stmt {
        Stmt::Assign { lvalue, rvalue, .. } => {
            resolve_expr(lvalue, scope, namespace)?;
            resolve_expr(rvalue, scope, namespace)?;
        }
        Stmt::For {
            var_name,
            bind,
            from,
            to,
            body,
            ..
        } => {
            *bind = Some(resolve_ident(namespace, scope, var_name)?);
            resolve_expr(from, scope, namespace)?;
            resolve_expr(to, scope, namespace)?;
            resolve_stmts(body, scope, namespace)?;
        }
        Stmt::Return { expr, .. } => {
            if let Some(expr) = expr {
                resolve_expr(expr, scope, namespace)?;
            }
        }
        Stmt::Call { expr, .. } => {
            resolve_expr(expr, scope, namespace)?;
        }
    }
    Ok(())
}

fn resolve_expr(expr: &mut Expr, scope: ScopeId, namespace: &Namespace) -> CompileResult<()> {
    match &mut expr.kind {
        ExprKind::Binary { left, right, .. } => {
            resolve_expr(left, scope, namespace)?;
            resolve_expr(right, scope, namespace)?;
        }
        ExprKind::Id { name, bind } => {
            *bind = Some(resolve_ident(namespace, scope, name)?);
        }
        ExprKind::Num(_) => {}
        ExprKind::Call { callee, args } => {
            resolve_expr(callee, scope, namespace)?;
            for arg in args.iter_mut() {
                resolve_expr(arg, scope, namespace)?;
            }
        }
    }
    Ok(())
}
