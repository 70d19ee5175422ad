//! Component 2 – the functional core.
//!
//! Classifies every unit's commands and lowers them, in order, into one
//! instruction stream.
pub mod asm;
pub mod ast;
pub mod codegen;
pub mod command_parser;
#[cfg(any(test, feature = "test-support"))]
pub mod emulator;
pub mod lexer;

use crate::model::{ParsedUnit, RawProgram, TranslatedProgram};
use anyhow::{Context, Result};
use codegen::CodeWriter;
use command_parser::CommandSource;
use log::info;

/// Runs every processing pass and returns a read-only structure for writers.
pub fn run(raw: &RawProgram) -> Result<TranslatedProgram> {
    let mut writer = CodeWriter::new();
    if raw.bootstrap {
        writer.write_init()?;
    }

    let mut units = Vec::with_capacity(raw.units.len());
    for unit in &raw.units {
        let source = CommandSource::new(&unit.source);
        info!("translating {} ({} commands)", unit.name, source.len());

        writer.set_unit_name(&unit.name);
        let commands = source
            .parse_all()
            .with_context(|| format!("Parsing {}", unit.path.display()))?;
        for cmd in &commands {
            writer
                .translate(cmd)
                .with_context(|| format!("Translating {}", unit.path.display()))?;
        }

        units.push(ParsedUnit {
            name: unit.name.clone(),
            commands,
        });
    }

    let assembly = writer.finish();
    Ok(TranslatedProgram { assembly, units })
}
