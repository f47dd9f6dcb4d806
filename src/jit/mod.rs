//! The x86-64 JIT backend (spec §4.6), grounded in
//! `original_source/jit.c`. Two passes per procedure assemble each
//! instruction's template and patch intra-procedure branch displacements;
//! a link phase then lays every procedure's code out consecutively inside
//! one executable mapping and rewrites `PROC` immediates from numeric ids
//! to absolute addresses.

mod templates;

use crate::asm_lang::{InterpCode, InterpProg};
use crate::error::{CompileError, CompileResult};
use templates::{Reloc, PROLOGUE};

struct EncodedInstr {
    bytes: Vec<u8>,
    reloc: Option<Reloc>,
    rel_offset: usize,
}

/// Pass 1 + pass 2 for one procedure: template selection and
/// immediate-patching, then branch-displacement patching. Returns the
/// procedure's full byte buffer (prologue included) and the list of
/// `(byte offset, target procedure id)` pairs still needing the link
/// phase's absolute addresses.
fn encode_proc(code: &InterpCode) -> CompileResult<(Vec<u8>, Vec<(usize, u32)>)> {
    let mut encoded = Vec::with_capacity(code.instrs.len());
    let mut cursor = PROLOGUE.len();
    for &op in &code.instrs {
        let (bytes, reloc) = templates::encode(op, &code.name)?;
        let rel_offset = cursor;
        cursor += bytes.len();
        encoded.push(EncodedInstr {
            bytes,
            reloc,
            rel_offset,
        });
    }

    let mut buffer = Vec::with_capacity(cursor);
    buffer.extend_from_slice(&PROLOGUE);
    for instr in &encoded {
        buffer.extend_from_slice(&instr.bytes);
    }

    let mut proc_relocs = Vec::new();
    for instr in &encoded {
        match instr.reloc {
            Some(Reloc::Branch {
                operand_offset,
                target_pc,
            }) => {
                let target_offset = encoded[target_pc as usize].rel_offset;
                let this_end = instr.rel_offset + instr.bytes.len();
                let displacement = target_offset as i32 - this_end as i32;
                let field = instr.rel_offset + operand_offset;
                buffer[field..field + 4].copy_from_slice(&displacement.to_le_bytes());
            }
            Some(Reloc::ProcImm {
                operand_offset,
                target_proc,
            }) => {
                proc_relocs.push((instr.rel_offset + operand_offset, target_proc));
            }
            None => {}
        }
    }
    Ok((buffer, proc_relocs))
}

/// Compiles and immediately invokes `prog`'s entry procedure, returning
/// its integer result (spec §4.6 "Emit & execute").
pub fn run(prog: &InterpProg) -> CompileResult<i64> {
    let mut proc_bytes = Vec::with_capacity(prog.procs.len());
    let mut pending_relocs = Vec::new();
    for (proc_index, code) in prog.procs.iter().enumerate() {
        let (bytes, relocs) = encode_proc(code)?;
        for (field_offset, target_proc) in relocs {
            pending_relocs.push((proc_index, field_offset, target_proc));
        }
        proc_bytes.push(bytes);
    }

    let mut proc_offsets = Vec::with_capacity(proc_bytes.len());
    let mut cursor = 0usize;
    for bytes in &proc_bytes {
        proc_offsets.push(cursor);
        cursor += bytes.len();
    }
    let total_size = cursor.max(1);

    // Mapped read-write first so relocations can be patched in place;
    // `make_exec` below mprotects the same pages to read+exec without
    // moving them, matching spec §9's W^X mitigation (write, then
    // remap-exec, rather than holding both permissions at once).
    let mut mmap = memmap2::MmapOptions::new()
        .len(total_size)
        .map_anon()
        .map_err(|e| CompileError::MapExec(e.to_string()))?;

    for (offset, bytes) in proc_offsets.iter().zip(proc_bytes.iter()) {
        mmap[*offset..*offset + bytes.len()].copy_from_slice(bytes);
    }

    let base_ptr = mmap.as_ptr() as usize;
    for (proc_index, field_offset, target_proc) in pending_relocs {
        let abs_addr = base_ptr + proc_offsets[target_proc as usize];
        let global_offset = proc_offsets[proc_index] + field_offset;
        mmap[global_offset..global_offset + 8].copy_from_slice(&(abs_addr as u64).to_le_bytes());
    }

    let exec_map = mmap
        .make_exec()
        .map_err(|e| CompileError::MapExec(e.to_string()))?;

    let entry_addr = base_ptr + proc_offsets[prog.main_id];
    // Safety: `entry_addr` points at a procedure prologue this pass just
    // assembled and wrote into `exec_map`, which is now mapped read+exec
    // for exactly this call's duration.
    let entry: extern "C" fn() -> i64 =
        unsafe { std::mem::transmute::<usize, extern "C" fn() -> i64>(entry_addr) };
    let result = entry();

    drop(exec_map);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm_generation::lower_program;
    use crate::parser::Parser;
    use crate::semantic_analysis::namespace::Namespace;
    use crate::semantic_analysis::{resolve::resolve_program, type_check::type_check_program};
    use crate::token::SliceSource;

    fn jit_run(src: &str) -> i64 {
        let mut namespace = Namespace::new();
        let global = namespace.new_scope(namespace.builtin);
        let mut parser = Parser::new(SliceSource::new(src.as_bytes()));
        let mut procs = parser.parse_program(&mut namespace, global).unwrap();
        resolve_program(&mut procs, &mut namespace, global).unwrap();
        type_check_program(&mut procs).unwrap();
        let prog = lower_program(&procs).unwrap();
        run(&prog).unwrap()
    }

    #[test]
    fn s1_arithmetic() {
        assert_eq!(
            jit_run("procedure main:integer; var r:integer; begin r := 2 + 3 * 4; return r; end main;"),
            14
        );
    }

    #[test]
    fn s3_function_call_matches_interpreter() {
        let src = "procedure f(x:integer):integer; begin return x * x; end f; \
                   procedure main:integer; begin return f(7); end main;";
        assert_eq!(jit_run(src), 49);
    }

    #[test]
    fn s4_nested_loop_and_recursion_matches_interpreter() {
        let src = "procedure fact(n:integer):integer; var r,i:integer; begin r := 1; \
                   for i := 1 to n do r := r * i; done; return r; end fact; \
                   procedure main:integer; begin return fact(5); end main;";
        assert_eq!(jit_run(src), 120);
    }

    #[test]
    fn frame_too_large_is_rejected() {
        let mut namespace = Namespace::new();
        let global = namespace.new_scope(namespace.builtin);
        let mut decls = String::from("procedure main:integer; var ");
        // Identifiers never allow digits, even mid-name (grounded on
        // `original_source/lexer.c`: both the start and continuation
        // checks are `isalpha(c) || c == '_'`), so distinct locals here
        // are distinct letters rather than digit-suffixed names.
        let names: Vec<String> = ('a'..='t').map(|c| c.to_string()).collect();
        decls.push_str(&names.join(","));
        decls.push_str(":integer; begin return a; end main;");
        let mut parser = Parser::new(SliceSource::new(decls.as_bytes()));
        let mut procs = parser.parse_program(&mut namespace, global).unwrap();
        resolve_program(&mut procs, &mut namespace, global).unwrap();
        type_check_program(&mut procs).unwrap();
        let prog = lower_program(&procs).unwrap();
        assert!(matches!(
            run(&prog),
            Err(CompileError::FrameTooLarge { .. })
        ));
    }
}
