// fixed memory layout of the target machine
pub const POINTER_BASE: u16 = 3;
pub const TEMP_BASE: u16 = 5;
pub const STATIC_BASE: u16 = 100;
pub const STACK_BASE: u16 = 256;

/// Largest value an address instruction can load (15 bits).
pub const MAX_ADDRESS: u16 = 0x7FFF;

/// Return address plus the four saved segment pointers.
pub const FRAME_SIZE: u16 = 5;

/// Function the bootstrap transfers control to.
pub const ENTRY_FUNCTION: &str = "Sys.init";

pub const SOURCE_EXTENSION: &str = "vm";
pub const OUTPUT_EXTENSION: &str = "asm";

use crate::processor::asm::Instruction;
use crate::processor::ast::ClassifiedCommand;
use serde::Serialize;
use std::path::PathBuf;

/// One input file, read but not yet lexed.
#[derive(Debug, Clone)]
pub struct SourceUnit {
    /// File stem; used for diagnostics and as the unit name.
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Everything the loader produced for one invocation.
///
/// Units are kept in translation order; `bootstrap` is set in
/// directory (program) mode.
#[derive(Debug, Clone)]
pub struct RawProgram {
    pub units: Vec<SourceUnit>,
    pub output: PathBuf,
    pub bootstrap: bool,
}

/// Classified commands of one unit, kept for the command dump.
#[derive(Debug, Clone, Serialize)]
pub struct ParsedUnit {
    pub name: String,
    pub commands: Vec<ClassifiedCommand>,
}

/// Fully translated output handed to `writer`.
pub struct TranslatedProgram {
    pub assembly: Vec<Instruction>,
    pub units: Vec<ParsedUnit>,
}
