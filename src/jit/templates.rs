//! x86-64 System V machine-code templates for each bytecode op (spec
//! §4.6), grounded in `original_source/jit.c`'s `emit_*` functions. Every
//! template is emitted byte-for-byte with only its immediates patched;
//! none of it depends on surrounding instructions except `JMP`/`JLT`,
//! whose relative displacement is filled in during the second pass.

use std::convert::TryFrom;

use crate::asm_lang::Op;
use crate::error::CompileError;

/// A template's relative-displacement field still needing the real
/// target once that target's position in the procedure is known.
#[derive(Debug, Clone, Copy)]
pub enum Reloc {
    /// Offset of the 4-byte rel32 field, plus the bytecode pc it targets.
    Branch { operand_offset: usize, target_pc: u32 },
    /// Offset of the 8-byte immediate, plus the procedure id it targets —
    /// rewritten by the link phase from a numeric id to an absolute address.
    ProcImm { operand_offset: usize, target_proc: u32 },
}

/// Procedure prologue (spec §4.6): `push %rbp; mov %rsp, %rbp`.
pub const PROLOGUE: [u8; 4] = [0x55, 0x48, 0x89, 0xE5];

/// Encodes one bytecode instruction into its fixed template, returning the
/// bytes and, for `VAR`/`PARAM`/`PROC`/`JMP`/`JLT`, the relocation still
/// outstanding. `proc_name` is only used to name the procedure in a
/// `FrameTooLarge` error.
pub fn encode(op: Op, proc_name: &str) -> Result<(Vec<u8>, Option<Reloc>), CompileError> {
    match op {
        Op::Push(v) => Ok((movabs_rax_push(v as i64), None)),
        Op::Proc(id) => {
            let mut bytes = movabs_rax_push(id as i64);
            // The imm64 field starts right after the `48 B8` opcode bytes.
            let reloc = Reloc::ProcImm {
                operand_offset: 2,
                target_proc: id,
            };
            // Placeholder value is irrelevant; the link phase overwrites it.
            bytes[2..10].copy_from_slice(&(id as u64).to_le_bytes());
            Ok((bytes, Some(reloc)))
        }
        Op::Pop => Ok((vec![0x58], None)), // popq %rax
        Op::Load => Ok((vec![0x58, 0x48, 0x8B, 0x00, 0x50], None)),
        Op::Store => Ok((vec![0x59, 0x58, 0x48, 0x89, 0x01], None)),
        Op::Var(k) => encode_frame_offset(8 * (k as i64) + 8, true, proc_name, "locals", 15),
        Op::Param(k) => encode_frame_offset(8 * (k as i64) + 16, false, proc_name, "parameters", 14),
        Op::Dup => Ok((vec![0x48, 0x8B, 0x04, 0x24, 0x50], None)),
        Op::Add => Ok((vec![0x59, 0x58, 0x48, 0x01, 0xC8, 0x50], None)),
        Op::Mul => Ok((vec![0x59, 0x58, 0x48, 0x0F, 0xAF, 0xC1, 0x50], None)),
        Op::Inc => Ok((vec![0x58, 0x48, 0xFF, 0x00], None)),
        Op::Cmp => Ok((vec![0x59, 0x58, 0x48, 0x29, 0xC8, 0x50], None)),
        Op::Jmp(target) => {
            let bytes = vec![0xE9, 0, 0, 0, 0];
            Ok((
                bytes,
                Some(Reloc::Branch {
                    operand_offset: 1,
                    target_pc: target,
                }),
            ))
        }
        Op::Jlt(target) => {
            // popq %rax; cmpl $0, %eax; jl rel32
            let bytes = vec![0x58, 0x3D, 0, 0, 0, 0, 0x0F, 0x8C, 0, 0, 0, 0];
            Ok((
                bytes,
                Some(Reloc::Branch {
                    operand_offset: 8,
                    target_pc: target,
                }),
            ))
        }
        Op::Call => Ok((vec![0x58, 0xFF, 0xD0, 0x50], None)),
        Op::Callv => Ok((vec![0x58, 0xFF, 0xD0], None)),
        Op::Ret(n) => {
            let imm16 = (8u32 * n).to_le_bytes();
            Ok((
                vec![0x58, 0x48, 0x89, 0xEC, 0x5D, 0xC2, imm16[0], imm16[1]],
                None,
            ))
        }
        Op::Retv(n) => {
            // `xorl %eax, %eax` ahead of the fixed RETV shape: a void
            // procedure carries no return value, but the entry procedure
            // is always invoked through a fn() -> i64 pointer (spec
            // §4.6 "Emit & execute"), so whatever RETV leaves in %rax
            // becomes the JIT's reported result when `main` is void.
            // Zeroing it keeps that result defined instead of whatever
            // scratch value %rax last held.
            let imm16 = (8u32 * n).to_le_bytes();
            Ok((
                vec![
                    0x31, 0xC0, // xor %eax, %eax
                    0x48, 0x89, 0xEC, 0x5D, 0xC2, imm16[0], imm16[1],
                ],
                None,
            ))
        }
    }
}

fn movabs_rax_push(imm64: i64) -> Vec<u8> {
    let mut bytes = vec![0x48, 0xB8];
    bytes.extend_from_slice(&imm64.to_le_bytes());
    bytes.push(0x50); // pushq %rax
    bytes
}

/// `VAR`/`PARAM` both compute `%rbp ± imm8` into `%rax` then push it. The
/// immediate is encoded as a single signed byte (spec §9), which is what
/// caps a procedure to 15 locals or 14 parameters.
fn encode_frame_offset(
    offset: i64,
    is_sub: bool,
    proc_name: &str,
    what: &'static str,
    max: usize,
) -> Result<(Vec<u8>, Option<Reloc>), CompileError> {
    let imm8 = i8::try_from(offset).map_err(|_| CompileError::FrameTooLarge {
        name: proc_name.to_string(),
        what,
        max,
    })?;
    let op_byte = if is_sub { 0xE8 } else { 0xC0 };
    Ok((
        vec![0x48, 0x89, 0xE8, 0x48, 0x83, op_byte, imm8 as u8, 0x50],
        None,
    ))
}
