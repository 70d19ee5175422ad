//! Dump classified commands for debugging the command source.

use crate::model::TranslatedProgram;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub fn emit(program: &TranslatedProgram, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, &program.units)?;
    writeln!(out)?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParsedUnit;
    use crate::processor::ast::{ClassifiedCommand, CommandKind};
    use serde_json::Value;

    #[test]
    fn test_dump_shape() {
        let program = TranslatedProgram {
            assembly: vec![],
            units: vec![ParsedUnit {
                name: "Main".into(),
                commands: vec![
                    ClassifiedCommand::new(CommandKind::Push, Some("constant".into()), Some(7), 1),
                    ClassifiedCommand::new(CommandKind::Return, None, None, 2),
                ],
            }],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.json");
        emit(&program, &path).unwrap();

        let dump: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(dump[0]["name"], "Main");
        assert_eq!(dump[0]["commands"][0]["kind"], "Push");
        assert_eq!(dump[0]["commands"][0]["arg2"], 7);
        assert_eq!(dump[0]["commands"][1]["arg1"], Value::Null);
    }
}
