pub mod cli;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

pub use error::{TranslateError, TranslateResult};

use anyhow::Context;
use clap::Parser;
use log::info;

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    execute(&args)
}

/// Translate one input path as described by `args`.
pub fn execute(args: &cli::Cli) -> anyhow::Result<()> {
    // 1. ── Load ───────────────────────────────────────────────────────
    let mut raw_program = parser::load(&args.input)
        .with_context(|| format!("Loading {}", args.input.display()))?;
    raw_program.bootstrap |= args.program;
    if let Some(output) = &args.output {
        raw_program.output = output.clone();
    }

    // 2. ── Process ────────────────────────────────────────────────────
    let translated =
        processor::run(&raw_program).with_context(|| "Translating VM commands")?;

    // 3. ── Write outputs ──────────────────────────────────────────────
    writer::asm::emit(&translated, &raw_program.output)
        .with_context(|| format!("Writing {}", raw_program.output.display()))?;
    info!(
        "wrote {} instructions to {}",
        translated.assembly.len(),
        raw_program.output.display()
    );

    if let Some(path) = &args.dump_commands {
        writer::json::emit(&translated, path)
            .with_context(|| format!("Writing {}", path.display()))?;
    }

    Ok(())
}
