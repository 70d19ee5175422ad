//! Render the instruction stream as assembly text.

use crate::model::TranslatedProgram;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub fn emit(program: &TranslatedProgram, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_to(program, &mut out)?;
    out.flush()
}

/// One instruction per line.
pub fn write_to<W: Write>(program: &TranslatedProgram, out: &mut W) -> io::Result<()> {
    for instr in &program.assembly {
        writeln!(out, "{instr}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::asm::{Comp, Dest, Instruction};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_layout() {
        let program = TranslatedProgram {
            assembly: vec![
                Instruction::comment("push constant 7"),
                Instruction::value(7),
                Instruction::assign(Dest::D, Comp::A),
                Instruction::label("Foo$L"),
            ],
            units: vec![],
        };
        let mut buf = Vec::new();
        write_to(&program, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "// push constant 7\n@7\nD=A\n(Foo$L)\n"
        );
    }
}
