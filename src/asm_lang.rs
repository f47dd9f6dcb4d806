//! The bytecode instruction set (spec §4.4), grounded in
//! `original_source/interp.h`'s `InterpOp`/`InterpInstr`. One `Op` variant
//! per opcode, carrying its own immediate instead of a bare `(tag, i32)`
//! pair — `match`ing an `Op` is the compile-time exhaustiveness check spec
//! §9 asks for in place of the source's `default: assert(0)`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Push(i32),
    Pop,
    Load,
    Store,
    /// Push the in-stack address of the k-th local of the current frame.
    Var(u32),
    /// Push the in-stack address of the k-th parameter in the caller's frame.
    Param(u32),
    /// Push a procedure id. The JIT later rewrites this immediate in place
    /// to the procedure's absolute entry address.
    Proc(u32),
    Dup,
    Add,
    Mul,
    Inc,
    Cmp,
    Jmp(u32),
    Jlt(u32),
    Call,
    Callv,
    Ret(u32),
    Retv(u32),
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(v) => write!(f, "PUSH {v}"),
            Op::Pop => write!(f, "POP"),
            Op::Load => write!(f, "LOAD"),
            Op::Store => write!(f, "STORE"),
            Op::Var(k) => write!(f, "VAR {k}"),
            Op::Param(k) => write!(f, "PARAM {k}"),
            Op::Proc(id) => write!(f, "PROC {id}"),
            Op::Dup => write!(f, "DUP"),
            Op::Add => write!(f, "ADD"),
            Op::Mul => write!(f, "MUL"),
            Op::Inc => write!(f, "INC"),
            Op::Cmp => write!(f, "CMP"),
            Op::Jmp(t) => write!(f, "JMP {t}"),
            Op::Jlt(t) => write!(f, "JLT {t}"),
            Op::Call => write!(f, "CALL"),
            Op::Callv => write!(f, "CALLV"),
            Op::Ret(n) => write!(f, "RET {n}"),
            Op::Retv(n) => write!(f, "RETV {n}"),
        }
    }
}

/// One procedure's flattened instruction array plus the frame shape the
/// interpreter and JIT both need: how many parameter and local slots to
/// account for at call/return boundaries.
#[derive(Debug, Clone)]
pub struct InterpCode {
    pub name: String,
    pub fparam_count: u32,
    pub var_count: u32,
    pub instrs: Vec<Op>,
}

/// The whole program's bytecode image (spec §6: "held in memory as
/// per-procedure arrays ... addressed by zero-based pc"). `ProcId` values
/// are indices into `procs`, so `Op::Proc`/`Op::Call` need no separate
/// lookup table.
#[derive(Debug, Clone)]
pub struct InterpProg {
    pub procs: Vec<InterpCode>,
    pub main_id: usize,
}

impl InterpProg {
    /// Renders the `Proc (i)` / `%6d: OP` disassembly from spec §6. A pure
    /// function of the bytecode image, so two dumps of the same image are
    /// byte-identical (spec §8, property 9).
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (i, proc) in self.procs.iter().enumerate() {
            out.push_str(&format!("Proc ({i})\n"));
            for (pc, op) in proc.instrs.iter().enumerate() {
                out.push_str(&format!("{pc:6}: {op}\n"));
            }
        }
        out
    }
}
