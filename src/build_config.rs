//! Configuration for a single compilation, following `core_lang`'s own
//! `BuildConfig`: a small, explicitly-constructed bag of knobs rather than a
//! pile of `Default::default()` globals.

use std::path::PathBuf;

/// The evaluation stack holds all data for every nested interpreter
/// invocation (spec §4.5: "fixed capacity (≥10,240 slots)").
pub const DEFAULT_STACK_CAPACITY: usize = 10 * 1024;

#[derive(Debug, Clone)]
pub struct BuildConfig {
    source_path: Option<PathBuf>,
    stack_capacity: usize,
    dump_bytecode: bool,
}

impl BuildConfig {
    /// `core_lang::BuildConfig::default` is intentionally not `Default`,
    /// since a build always has at least a notional source location.
    pub fn new(source_path: Option<PathBuf>) -> Self {
        BuildConfig {
            source_path,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            dump_bytecode: true,
        }
    }

    pub fn with_stack_capacity(mut self, capacity: usize) -> Self {
        self.stack_capacity = capacity;
        self
    }

    pub fn with_dump_bytecode(mut self, dump: bool) -> Self {
        self.dump_bytecode = dump;
        self
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.source_path.as_ref()
    }

    pub fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }

    pub fn dump_bytecode(&self) -> bool {
        self.dump_bytecode
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig::new(None)
    }
}
