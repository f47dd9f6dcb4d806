//! The stack-VM interpreter (spec §4.5), grounded in
//! `original_source/interp.c`'s `eval_interp_code`/`eval_interp_prog`.
//!
//! Spec §9's redesign note for "evaluation stack aliases values and
//! addresses" is implemented literally: every slot is an `i64`, and an
//! "address" is never a raw pointer, only an index back into the same
//! stack. `VAR`/`PARAM` compute that index; `LOAD`/`STORE` resolve it.

use crate::asm_lang::{InterpProg, Op};
use crate::error::{CompileError, CompileResult};

/// One shared evaluation stack, reused across every recursive call within
/// one evaluation (spec §5). `BuildConfig::stack_capacity` sizes the
/// initial reservation only — unlike the fixed-size C array it replaces,
/// this one can grow past it rather than invoke undefined behavior; see
/// DESIGN.md.
pub struct Interp<'a> {
    procs: &'a [crate::asm_lang::InterpCode],
    stack: Vec<i64>,
}

impl<'a> Interp<'a> {
    pub fn new(prog: &'a InterpProg, stack_capacity: usize) -> Self {
        Interp {
            procs: &prog.procs,
            stack: Vec::with_capacity(stack_capacity),
        }
    }

    /// Evaluates `proc_id` with its frame base at `bp` — the stack length
    /// at call time, with the callee's arguments already pushed below it.
    fn run(&mut self, proc_id: usize, bp: usize) -> CompileResult<i64> {
        let code = self.procs.get(proc_id).ok_or(CompileError::InvalidOpcode)?;
        let mut pc = 0usize;
        loop {
            let instr = *code.instrs.get(pc).ok_or(CompileError::InvalidOpcode)?;
            match instr {
                Op::Push(v) => {
                    self.stack.push(v as i64);
                    pc += 1;
                }
                Op::Pop => {
                    self.stack.pop();
                    pc += 1;
                }
                Op::Load => {
                    let addr = self.pop()?;
                    let v = *self
                        .stack
                        .get(addr as usize)
                        .ok_or(CompileError::InvalidOpcode)?;
                    self.stack.push(v);
                    pc += 1;
                }
                Op::Store => {
                    let addr = self.pop()?;
                    let v = self.pop()?;
                    *self
                        .stack
                        .get_mut(addr as usize)
                        .ok_or(CompileError::InvalidOpcode)? = v;
                    pc += 1;
                }
                Op::Var(k) => {
                    self.stack.push((bp + k as usize) as i64);
                    pc += 1;
                }
                Op::Param(k) => {
                    self.stack.push(bp as i64 - k as i64 - 1);
                    pc += 1;
                }
                Op::Proc(id) => {
                    self.stack.push(id as i64);
                    pc += 1;
                }
                Op::Dup => {
                    let v = *self.stack.last().ok_or(CompileError::InvalidOpcode)?;
                    self.stack.push(v);
                    pc += 1;
                }
                Op::Add => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.stack.push(a + b);
                    pc += 1;
                }
                Op::Mul => {
                    let b = self.pop()?;
                    let a = self.pop()?;
                    self.stack.push(a * b);
                    pc += 1;
                }
                Op::Inc => {
                    let addr = self.pop()?;
                    let slot = self
                        .stack
                        .get_mut(addr as usize)
                        .ok_or(CompileError::InvalidOpcode)?;
                    *slot += 1;
                    pc += 1;
                }
                Op::Cmp => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    self.stack.push(left - right);
                    pc += 1;
                }
                Op::Jmp(target) => pc = target as usize,
                Op::Jlt(target) => {
                    let v = self.pop()?;
                    pc = if v < 0 { target as usize } else { pc + 1 };
                }
                Op::Call => {
                    let id = self.pop()? as usize;
                    let callee_bp = self.stack.len();
                    let ret = self.run(id, callee_bp)?;
                    self.stack.push(ret);
                    pc += 1;
                }
                Op::Callv => {
                    let id = self.pop()? as usize;
                    let callee_bp = self.stack.len();
                    self.run(id, callee_bp)?;
                    pc += 1;
                }
                Op::Ret(n) => {
                    let v = self.pop()?;
                    self.unwind_frame(bp, n);
                    return Ok(v);
                }
                Op::Retv(n) => {
                    self.unwind_frame(bp, n);
                    return Ok(0);
                }
            }
        }
    }

    fn pop(&mut self) -> CompileResult<i64> {
        self.stack.pop().ok_or(CompileError::InvalidOpcode)
    }

    /// `RET`/`RETV`: drop everything back to the frame base (the callee's
    /// locals), then drop the caller's `n` pushed arguments beneath it.
    fn unwind_frame(&mut self, bp: usize, n: u32) {
        self.stack.truncate(bp);
        let new_len = self.stack.len().saturating_sub(n as usize);
        self.stack.truncate(new_len);
    }
}

/// Evaluates `prog`'s entry procedure with an empty initial stack and
/// returns its integer result.
pub fn eval(prog: &InterpProg, stack_capacity: usize) -> CompileResult<i64> {
    let mut interp = Interp::new(prog, stack_capacity);
    interp.run(prog.main_id, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm_generation::lower_program;
    use crate::build_config::DEFAULT_STACK_CAPACITY;
    use crate::parser::Parser;
    use crate::semantic_analysis::namespace::Namespace;
    use crate::semantic_analysis::{resolve::resolve_program, type_check::type_check_program};
    use crate::token::SliceSource;

    fn run(src: &str) -> i64 {
        let mut namespace = Namespace::new();
        let global = namespace.new_scope(namespace.builtin);
        let mut parser = Parser::new(SliceSource::new(src.as_bytes()));
        let mut procs = parser.parse_program(&mut namespace, global).unwrap();
        resolve_program(&mut procs, &mut namespace, global).unwrap();
        type_check_program(&mut procs).unwrap();
        let prog = lower_program(&procs).unwrap();
        eval(&prog, DEFAULT_STACK_CAPACITY).unwrap()
    }

    #[test]
    fn s1_arithmetic() {
        assert_eq!(
            run("procedure main:integer; var r:integer; begin r := 2 + 3 * 4; return r; end main;"),
            14
        );
    }

    #[test]
    fn s2_for_loop_sum() {
        assert_eq!(
            run(
                "procedure main:integer; var s,i:integer; begin s := 0; \
                 for i := 1 to 5 do s := s + i; done; return s; end main;"
            ),
            15
        );
    }

    #[test]
    fn s3_function_call() {
        assert_eq!(
            run(
                "procedure f(x:integer):integer; begin return x * x; end f; \
                 procedure main:integer; begin return f(7); end main;"
            ),
            49
        );
    }

    #[test]
    fn s4_nested_loop_and_recursion() {
        assert_eq!(
            run(
                "procedure fact(n:integer):integer; var r,i:integer; begin r := 1; \
                 for i := 1 to n do r := r * i; done; return r; end fact; \
                 procedure main:integer; begin return fact(5); end main;"
            ),
            120
        );
    }

    #[test]
    fn for_loop_with_a_greater_than_b_runs_zero_iterations() {
        assert_eq!(
            run(
                "procedure main:integer; var s,i:integer; begin s := 0; \
                 for i := 5 to 1 do s := s + 1; done; return s; end main;"
            ),
            0
        );
    }

    #[test]
    fn for_loop_with_a_equal_b_runs_exactly_once() {
        assert_eq!(
            run(
                "procedure main:integer; var s,i:integer; begin s := 0; \
                 for i := 3 to 3 do s := s + 1; done; return s; end main;"
            ),
            1
        );
    }
}
