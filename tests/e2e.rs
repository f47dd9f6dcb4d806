//! Black-box end-to-end scenarios (spec §8's S1-S6 table), driven through
//! the public `tinyproc` API rather than any one phase's internals.

use tinyproc::error::CompileError;

fn run_both(src: &str) -> (i64, i64) {
    let (_, bytecode) = tinyproc::compile(src.as_bytes()).expect("compiles");
    let interp = tinyproc::interpret(&bytecode, &Default::default()).expect("interprets");
    let jit = tinyproc::jit_run(&bytecode).expect("jits");
    (interp, jit)
}

#[test]
fn s1_arithmetic_precedence() {
    let src = "procedure main:integer; var r:integer; begin r := 2 + 3 * 4; return r; end main;";
    assert_eq!(run_both(src), (14, 14));
}

#[test]
fn s2_for_loop_accumulation() {
    let src = "procedure main:integer; var s,i:integer; begin s := 0; \
               for i := 1 to 5 do s := s + i; done; return s; end main;";
    assert_eq!(run_both(src), (15, 15));
}

#[test]
fn s3_procedure_call_with_argument() {
    let src = "procedure f(x:integer):integer; begin return x * x; end f; \
               procedure main:integer; begin return f(7); end main;";
    assert_eq!(run_both(src), (49, 49));
}

#[test]
fn s4_recursive_style_nested_loop_and_call() {
    let src = "procedure fact(n:integer):integer; var r,i:integer; begin r := 1; \
               for i := 1 to n do r := r * i; done; return r; end fact; \
               procedure main:integer; begin return fact(5); end main;";
    assert_eq!(run_both(src), (120, 120));
}

/// S5: a `main` with no declared return type and no `return` still
/// lowers and runs — spec §8 leaves the "must `main` be a function"
/// question out of scope for the core and treats both outcomes as
/// acceptable; this crate accepts the void `main` and the synthesized
/// trailing `RETV` (spec §9's mitigation) gives it a well-defined result
/// of 0 on both backends — the JIT's `RETV` template zeroes `%rax`
/// before returning (`jit/templates.rs`) precisely so this case has a
/// defined value instead of whatever `%rax` last held.
#[test]
fn s5_void_main_compiles_and_runs() {
    let src = "procedure main; begin end main;";
    let (program, bytecode) = tinyproc::compile(src.as_bytes()).expect("compiles");
    assert!(!program.procs[0].is_function);
    let interp = tinyproc::interpret(&bytecode, &Default::default()).unwrap();
    let jit = tinyproc::jit_run(&bytecode).unwrap();
    assert_eq!((interp, jit), (0, 0));
}

/// S6: a missing `;` after the procedure header is a syntax error, not a
/// silent partial parse.
#[test]
fn s6_missing_semicolon_is_syntax_error() {
    let src = "procedure main begin end main;";
    assert!(matches!(
        tinyproc::parse(src.as_bytes()),
        Err(CompileError::Syntax(_))
    ));
}

#[test]
fn interpreter_and_jit_agree_on_forward_calls() {
    let src = "procedure main:integer; begin return callee(3, 4); end main; \
               procedure callee(a:integer; b:integer):integer; begin return a * b + 1; end callee;";
    assert_eq!(run_both(src), (13, 13));
}

#[test]
fn arity_mismatch_fails_type_checking() {
    let src = "procedure f(x:integer); begin end f; \
               procedure main; begin f(1, 2); end main;";
    let mut program = tinyproc::parse(src.as_bytes()).expect("parses");
    tinyproc::resolve_names(&mut program).expect("resolves");
    assert!(matches!(
        tinyproc::check_types(&mut program),
        Err(CompileError::ArityMismatch {
            expected: 1,
            found: 2
        })
    ));
}

#[test]
fn assigning_to_a_literal_fails_type_checking() {
    let src = "procedure main; begin 1 := 2; end main;";
    let mut program = tinyproc::parse(src.as_bytes()).expect("parses");
    tinyproc::resolve_names(&mut program).expect("resolves");
    assert!(matches!(
        tinyproc::check_types(&mut program),
        Err(CompileError::NotAnLvalue)
    ));
}

#[test]
fn bytecode_dump_is_deterministic() {
    let src = "procedure main:integer; var r:integer; begin r := 2 + 3 * 4; return r; end main;";
    let (_, bytecode) = tinyproc::compile(src.as_bytes()).unwrap();
    assert_eq!(bytecode.dump(), bytecode.dump());
    assert!(bytecode.dump().starts_with("Proc (0)\n"));
}

#[test]
fn driver_binary_reads_the_fixed_input_path() {
    use std::io::Write;
    use std::process::Command;

    let dir = tempfile::tempdir().expect("scratch dir");
    let input_path = dir.path().join("input.txt");
    std::fs::File::create(&input_path)
        .unwrap()
        .write_all(b"procedure main:integer; begin return 9; end main;")
        .unwrap();

    let exe = env!("CARGO_BIN_EXE_tinyproc");
    let output = Command::new(exe)
        .current_dir(dir.path())
        .output()
        .expect("driver binary runs");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Syntax Ok"));
    assert!(stdout.contains("Names Ok"));
    assert!(stdout.contains("Types Ok"));
    assert!(stdout.contains("Compiling Ok"));
    assert!(stdout.contains("Eval 9"));
    assert!(stdout.contains("JIT Eval 9"));
}

