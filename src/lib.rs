//! A toolchain for a tiny imperative procedure language: lexer, parser,
//! name resolver, type checker, bytecode lowering, stack-VM interpreter
//! and x86-64 JIT. `lib.rs` is the pipeline: each phase borrows or
//! consumes the previous one's output and returns a `CompileResult`, with
//! no accumulation of partial results across a failed phase (spec §7).

pub mod asm_generation;
pub mod asm_lang;
pub mod build_config;
pub mod error;
pub mod interp;
pub mod jit;
pub mod parse_tree;
pub mod parser;
pub mod semantic_analysis;
pub mod span;
pub mod token;
pub mod types;

use tracing::info;

use asm_lang::InterpProg;
use build_config::BuildConfig;
use error::CompileResult;
use parse_tree::Proc;
use parser::Parser;
use semantic_analysis::namespace::{Namespace, ScopeId};
use token::SliceSource;

/// A fully decorated program: the resolved, type-checked AST plus its
/// namespace, still available after lowering for tools that want to walk
/// the source-level tree (e.g. a future diagnostics renderer).
pub struct Program {
    pub namespace: Namespace,
    pub global_scope: ScopeId,
    pub procs: Vec<Proc>,
}

/// Runs the parser, then both semantic analysis passes, over `source`.
/// Mirrors spec §6's driver contract one phase at a time: callers print
/// `Syntax Ok` / `Names Ok` / `Types Ok` between these calls.
pub fn parse(source: &[u8]) -> CompileResult<Program> {
    let _span = debug_span("parse");
    let mut namespace = Namespace::new();
    let global_scope = namespace.new_scope(namespace.builtin);
    let mut parser = Parser::new(SliceSource::new(source));
    let procs = parser.parse_program(&mut namespace, global_scope)?;
    Ok(Program {
        namespace,
        global_scope,
        procs,
    })
}

pub fn resolve_names(program: &mut Program) -> CompileResult<()> {
    let _span = debug_span("resolve_names");
    semantic_analysis::resolve::resolve_program(
        &mut program.procs,
        &mut program.namespace,
        program.global_scope,
    )
}

pub fn check_types(program: &mut Program) -> CompileResult<()> {
    let _span = debug_span("check_types");
    semantic_analysis::type_check::type_check_program(&mut program.procs)
}

pub fn lower(program: &Program) -> CompileResult<InterpProg> {
    let _span = debug_span("lower");
    asm_generation::lower_program(&program.procs)
}

/// Parses, resolves and type-checks `source` in one call, for callers
/// that don't need per-phase status lines (e.g. tests).
pub fn compile(source: &[u8]) -> CompileResult<(Program, InterpProg)> {
    let mut program = parse(source)?;
    resolve_names(&mut program)?;
    check_types(&mut program)?;
    let bytecode = lower(&program)?;
    Ok((program, bytecode))
}

pub fn interpret(bytecode: &InterpProg, config: &BuildConfig) -> CompileResult<i64> {
    let _span = debug_span("interpret");
    let result = interp::eval(bytecode, config.stack_capacity())?;
    info!(result, "interpreter finished");
    Ok(result)
}

pub fn jit_run(bytecode: &InterpProg) -> CompileResult<i64> {
    let _span = debug_span("jit_run");
    let result = jit::run(bytecode)?;
    info!(result, "jit finished");
    Ok(result)
}

fn debug_span(name: &'static str) -> tracing::span::EnteredSpan {
    tracing::debug_span!("phase", name).entered()
}
