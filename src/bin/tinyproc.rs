//! The driver (spec §6), grounded in `core_lang`'s own `utils/selector_debug.rs`
//! bin target for its `structopt` CLI shape, and in `original_source/main.c`
//! for the phase sequence and status lines themselves.

use std::path::PathBuf;
use std::process::ExitCode;

use structopt::StructOpt;

use tinyproc::build_config::BuildConfig;
use tinyproc::error::CompileError;

#[derive(StructOpt)]
#[structopt(name = "tinyproc", about = "Compile and run a tiny procedure-language program.")]
struct Opt {
    /// Source file to compile. Defaults to `input.txt` in the current
    /// directory, matching the original driver's fixed path.
    #[structopt(default_value = "input.txt")]
    input: PathBuf,

    /// Skip printing the bytecode disassembly between `Compiling Ok` and
    /// `Eval`.
    #[structopt(long)]
    no_dump: bool,

    /// Capacity (in slots) of the interpreter's evaluation stack. Defaults
    /// to spec §4.5's documented floor of 10,240 slots.
    #[structopt(long, default_value = "10240")]
    stack_capacity: usize,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let opt = Opt::from_args();

    let source = match std::fs::read(&opt.input) {
        Ok(bytes) => bytes,
        Err(err) => {
            eprintln!("failed to open {}: {err}", opt.input.display());
            return ExitCode::FAILURE;
        }
    };

    let config = BuildConfig::new(Some(opt.input.clone()))
        .with_stack_capacity(opt.stack_capacity)
        .with_dump_bytecode(!opt.no_dump);

    run_pipeline(&source, &config);
    ExitCode::SUCCESS
}

/// Runs every phase in order, printing spec §6's status lines and
/// stopping silently — but still exiting successfully, since the input
/// file did open — at the first failing phase.
fn run_pipeline(source: &[u8], config: &BuildConfig) {
    let mut program = match tinyproc::parse(source) {
        Ok(program) => {
            println!("Syntax Ok");
            program
        }
        Err(CompileError::Syntax(_)) => {
            println!("Syntax Error");
            return;
        }
        Err(_) => return,
    };

    if tinyproc::resolve_names(&mut program).is_err() {
        return;
    }
    println!("Names Ok");

    if tinyproc::check_types(&mut program).is_err() {
        return;
    }
    println!("Types Ok");

    let bytecode = match tinyproc::lower(&program) {
        Ok(bytecode) => bytecode,
        Err(_) => return,
    };
    println!("Compiling Ok");

    if config.dump_bytecode() {
        print!("{}", bytecode.dump());
    }

    if let Ok(result) = tinyproc::interpret(&bytecode, config) {
        println!("Eval {result}");
    }

    if let Ok(result) = tinyproc::jit_run(&bytecode) {
        println!("JIT Eval {result}");
    }
}
