//! Type checking (spec §4.3), grounded in `original_source/type-checker.c`:
//! a pass that attaches an `ActualType` to every declaration, followed by
//! a pass that walks statements and expressions checking the rules in
//! spec §3's "Type rules" against what the first pass attached.
//!
//! The language has exactly one scalar type, so most of what a richer type
//! checker would call "unification" collapses to equality against
//! `Type::Integer`; `Type::Uninitialized` stands in for "no value" and
//! both declaration storage before it's typed, and the result of calling a
//! void procedure where a value is expected, flow into it on purpose —
//! either way it can never equal `Integer`, so existing mismatch errors
//! catch it without a case of their own.

use std::collections::HashMap;

use crate::error::{CompileError, CompileResult};
use crate::parse_tree::{Expr, ExprKind, Proc, ProcId, Stmt};
use crate::semantic_analysis::namespace::Binding;
use crate::types::{ActualType, ProcType, Type};

pub fn type_check_program(procs: &mut [Proc]) -> CompileResult<()> {
    let mut proc_types = HashMap::with_capacity(procs.len());
    for proc in procs.iter_mut() {
        attach_proc_type(proc);
        proc_types.insert(proc.nid, proc.actual_type.clone().expect("just attached"));
    }
    for proc in procs.iter_mut() {
        check_proc_body(proc, &proc_types)?;
    }
    Ok(())
}

/// Pass 1: every formal and local is `integer`; the procedure's own type
/// is a `Type::Proc` built from its formals and, only for functions, its
/// declared return type.
fn attach_proc_type(proc: &mut Proc) {
    for fparam in proc.fparams.iter_mut() {
        fparam.actual_type = Some(ActualType::lvalue(Type::Integer));
    }
    for var in proc.vars.iter_mut() {
        var.actual_type = Some(ActualType::lvalue(Type::Integer));
    }
    proc.return_actual_type = if proc.is_function {
        Some(ActualType::rvalue(Type::Integer))
    } else {
        None
    };

    let params = proc
        .fparams
        .iter()
        .map(|f| f.actual_type.as_ref().unwrap().ty.clone())
        .collect();
    let return_type = proc
        .return_actual_type
        .as_ref()
        .map(|a| Box::new(a.ty.clone()));
    proc.actual_type = Some(ActualType::constant(Type::Proc(ProcType {
        params,
        return_type,
    })));
}

/// Borrowed view of the current procedure's own locals, for resolving
/// `Binding::FParam`/`Binding::Var` identifiers while `proc.body` itself is
/// borrowed mutably — the two are disjoint fields of the same `Proc`.
struct Locals<'a> {
    fparams: &'a [crate::parse_tree::FParam],
    vars: &'a [crate::parse_tree::Var],
}

fn check_proc_body(proc: &mut Proc, proc_types: &HashMap<ProcId, ActualType>) -> CompileResult<()> {
    let locals = Locals {
        fparams: &proc.fparams,
        vars: &proc.vars,
    };
    check_stmts(&mut proc.body, &locals, proc_types)
}

fn check_stmts(
    stmts: &mut [Stmt],
    locals: &Locals,
    proc_types: &HashMap<ProcId, ActualType>,
) -> CompileResult<()> {
    for stmt in stmts.iter_mut() {
        check_stmt(stmt, locals, proc_types)?;
    }
    Ok(())
}

fn check_stmt(
    stmt: &mut Stmt,
    locals: &Locals,
    proc_types: &HashMap<ProcId, ActualType>,
) -> CompileResult<()> {
    match stmt {
        Stmt::Assign { lvalue, rvalue, .. } => {
            let lhs = check_expr(lvalue, locals, proc_types)?;
            let rhs = check_expr(rvalue, locals, proc_types)?;
            if !lhs.is_lvalue {
                return Err(CompileError::NotAnLvalue);
            }
            if lhs.is_constant {
                return Err(CompileError::AssignToConstant);
            }
            if lhs.ty != rhs.ty {
                return Err(CompileError::AssignTypeMismatch);
            }
        }
        Stmt::For {
            bind,
            from,
            to,
            body,
            var_name,
            ..
        } => {
            let loop_var_ty = match bind.expect("resolved by resolve_program") {
                Binding::Var { nid, .. } => locals.vars[nid as usize].actual_type.clone().unwrap(),
                _ => {
                    return Err(CompileError::BadLoopVar {
                        name: var_name.clone(),
                    })
                }
            };
            if loop_var_ty.ty != Type::Integer {
                return Err(CompileError::BadLoopVar {
                    name: var_name.clone(),
                });
            }
            let from_ty = check_expr(from, locals, proc_types)?;
            let to_ty = check_expr(to, locals, proc_types)?;
            if from_ty.ty != Type::Integer || to_ty.ty != Type::Integer {
                return Err(CompileError::NonIntegerLoopBound);
            }
            check_stmts(body, locals, proc_types)?;
        }
        Stmt::Return { expr, .. } => {
            // Spec §4.3: "if present, the expression type-checks" — that
            // is the whole rule. §9 notes the original source does not
            // cross-check the returned expression against the enclosing
            // procedure's declared return type (and does not verify a
            // function returns on every path); this crate does not
            // tighten that, so `return 5;` in a void procedure and
            // `return;` in a function both type-check.
            if let Some(expr) = expr {
                check_expr(expr, locals, proc_types)?;
            }
        }
        Stmt::Call { expr, .. } => {
            check_expr(expr, locals, proc_types)?;
        }
    }
    Ok(())
}

fn check_expr(
    expr: &mut Expr,
    locals: &Locals,
    proc_types: &HashMap<ProcId, ActualType>,
) -> CompileResult<ActualType> {
    let result = match &mut expr.kind {
        ExprKind::Binary { left, right, .. } => {
            let lhs = check_expr(left, locals, proc_types)?;
            let rhs = check_expr(right, locals, proc_types)?;
            if lhs.ty != Type::Integer || rhs.ty != Type::Integer {
                return Err(CompileError::NonIntegerOperand);
            }
            ActualType::rvalue(Type::Integer)
        }
        ExprKind::Num(_) => ActualType::rvalue(Type::Integer),
        ExprKind::Id { bind, .. } => match bind.expect("resolved by resolve_program") {
            Binding::FParam { nid, .. } => locals.fparams[nid as usize].actual_type.clone().unwrap(),
            Binding::Var { nid, .. } => locals.vars[nid as usize].actual_type.clone().unwrap(),
            Binding::Proc(id) => proc_types.get(&id).expect("every proc is typed").clone(),
            Binding::Type => return Err(CompileError::TypeUsedAsValue),
        },
        ExprKind::Call { callee, args } => {
            let callee_ty = check_expr(callee, locals, proc_types)?;
            let proc_ty = callee_ty.ty.as_proc().cloned().ok_or_else(|| {
                CompileError::NotCallable {
                    name: callee_name(callee),
                }
            })?;
            if args.len() != proc_ty.params.len() {
                return Err(CompileError::ArityMismatch {
                    expected: proc_ty.params.len(),
                    found: args.len(),
                });
            }
            for (index, (arg, expected)) in args.iter_mut().zip(proc_ty.params.iter()).enumerate() {
                let arg_ty = check_expr(arg, locals, proc_types)?;
                if arg_ty.ty != *expected {
                    return Err(CompileError::ArgTypeMismatch { index });
                }
            }
            match proc_ty.return_type {
                Some(ty) => ActualType::rvalue(*ty),
                None => ActualType::rvalue(Type::Uninitialized),
            }
        }
    };
    expr.actual_type = Some(result.clone());
    Ok(result)
}

fn callee_name(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Id { name, .. } => name.clone(),
        _ => "<expression>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::semantic_analysis::namespace::Namespace;
    use crate::semantic_analysis::resolve::resolve_program;
    use crate::token::SliceSource;

    fn check(src: &str) -> CompileResult<()> {
        let mut namespace = Namespace::new();
        let global = namespace.new_scope(namespace.builtin);
        let mut parser = Parser::new(SliceSource::new(src.as_bytes()));
        let mut procs = parser.parse_program(&mut namespace, global).unwrap();
        resolve_program(&mut procs, &mut namespace, global).unwrap();
        type_check_program(&mut procs)
    }

    #[test]
    fn arithmetic_is_well_typed() {
        assert!(check(
            "procedure main:integer; var r:integer; begin r := 2 + 3 * 4; return r; end main;"
        )
        .is_ok());
    }

    #[test]
    fn calling_with_wrong_arity_fails() {
        assert_eq!(
            check(
                "procedure f(x:integer); begin end f; \
                 procedure main; begin f(); end main;"
            ),
            Err(CompileError::ArityMismatch {
                expected: 1,
                found: 0
            })
        );
    }

    #[test]
    fn using_a_void_call_as_a_value_fails() {
        assert_eq!(
            check(
                "procedure f; begin end f; \
                 procedure main; var r:integer; begin r := f(); end main;"
            ),
            Err(CompileError::AssignTypeMismatch)
        );
    }

    /// Spec §4.3 only requires the returned expression (if any) to
    /// type-check; it is never compared against the enclosing
    /// procedure's declared return type (spec §9).
    #[test]
    fn a_valueless_return_in_a_function_type_checks() {
        assert!(check("procedure main:integer; begin return; end main;").is_ok());
    }

    #[test]
    fn a_value_returning_return_in_a_void_procedure_type_checks() {
        assert!(check("procedure main; begin return 1; end main;").is_ok());
    }

    #[test]
    fn assigning_to_a_formal_parameter_is_allowed() {
        assert!(check(
            "procedure f(x:integer):integer; begin x := x + 1; return x; end f; \
             procedure main; begin end main;"
        )
        .is_ok());
    }

    #[test]
    fn assigning_to_a_procedure_name_fails() {
        assert_eq!(
            check(
                "procedure f; begin end f; \
                 procedure main; begin f := 1; end main;"
            ),
            Err(CompileError::AssignToConstant)
        );
    }

    #[test]
    fn assigning_to_a_number_literal_fails() {
        assert_eq!(
            check("procedure main; begin 2 := 1; end main;"),
            Err(CompileError::NotAnLvalue)
        );
    }

    #[test]
    fn for_loop_var_must_be_a_local_integer() {
        assert!(check(
            "procedure main; var i:integer; begin for i := 1 to 5 do done; end main;"
        )
        .is_ok());
        assert_eq!(
            check(
                "procedure f; begin end f; \
                 procedure main; begin for f := 1 to 5 do done; end main;"
            ),
            Err(CompileError::BadLoopVar {
                name: "f".to_string()
            })
        );
    }
}
