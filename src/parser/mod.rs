use anyhow::{Context, Result};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::TranslateError;
use crate::model::{OUTPUT_EXTENSION, RawProgram, SOURCE_EXTENSION, SourceUnit};

/// Read the input path into a `RawProgram`.
///
/// A single file becomes one unit written next to it as `<stem>.asm`.
/// A directory is a whole program: every `.vm` file inside it (sorted by
/// name) is a unit, the output is `<dir>/<dirname>.asm`, and the
/// bootstrap is emitted before the first unit.
pub fn load(input: &Path) -> Result<RawProgram> {
    let meta = fs::metadata(input).map_err(|e| TranslateError::io(input, e))?;

    if meta.is_file() {
        let unit = read_unit(input)?;
        info!("File loaded, size: {} bytes", unit.source.len());
        return Ok(RawProgram {
            units: vec![unit],
            output: input.with_extension(OUTPUT_EXTENSION),
            bootstrap: false,
        });
    }
    if !meta.is_dir() {
        return Err(TranslateError::InvalidInput {
            path: input.to_path_buf(),
        }
        .into());
    }

    let sources = list_sources(input)?;
    if sources.is_empty() {
        return Err(TranslateError::NoSources {
            path: input.to_path_buf(),
        }
        .into());
    }
    info!("Found {} source files in {}", sources.len(), input.display());

    let units = sources
        .iter()
        .map(|p| read_unit(p))
        .collect::<Result<Vec<_>>>()?;

    // canonicalize so that `.` still yields the directory's real name
    let mut file_name = input
        .canonicalize()
        .map_err(|e| TranslateError::io(input, e))?
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| TranslateError::InvalidInput {
            path: input.to_path_buf(),
        })?;
    file_name.push(format!(".{OUTPUT_EXTENSION}"));
    let output = input.join(file_name);

    Ok(RawProgram {
        units,
        output,
        bootstrap: true,
    })
}

fn is_source(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(SOURCE_EXTENSION))
}

/// Every `.vm` file directly inside `dir`, sorted by file name.
fn list_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| TranslateError::io(dir, e))?;

    let mut sources = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| TranslateError::io(dir, e))?.path();
        if is_source(&path) {
            sources.push(path);
        }
    }
    sources.sort();
    Ok(sources)
}

fn read_unit(path: &Path) -> Result<SourceUnit> {
    let source = fs::read_to_string(path)
        .map_err(|e| TranslateError::io(path, e))
        .with_context(|| format!("Reading {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    Ok(SourceUnit {
        name,
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_single_file_mode() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("SimpleAdd.vm");
        fs::write(&file, "push constant 7\n").unwrap();

        let raw = load(&file).unwrap();
        assert_eq!(raw.units.len(), 1);
        assert_eq!(raw.units[0].name, "SimpleAdd");
        assert_eq!(raw.output, dir.path().join("SimpleAdd.asm"));
        assert!(!raw.bootstrap);
    }

    #[test]
    fn test_directory_mode_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let prog = dir.path().join("Prog");
        fs::create_dir(&prog).unwrap();
        fs::write(prog.join("Sys.vm"), "function Sys.init 0\n").unwrap();
        fs::write(prog.join("Main.VM"), "function Main.main 0\n").unwrap();
        fs::write(prog.join("notes.txt"), "ignored").unwrap();
        fs::create_dir(prog.join("sub.vm")).unwrap();

        let raw = load(&prog).unwrap();
        let names: Vec<_> = raw.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Sys"]);
        assert_eq!(raw.output, prog.join("Prog.asm"));
        assert!(raw.bootstrap);
    }

    #[test]
    fn test_missing_path_and_empty_directory() {
        let dir = tempfile::tempdir().unwrap();

        let missing = load(&dir.path().join("nope.vm")).unwrap_err();
        assert!(missing.downcast_ref::<TranslateError>().is_some());

        let empty = load(dir.path()).unwrap_err();
        assert!(matches!(
            empty.downcast_ref::<TranslateError>(),
            Some(TranslateError::NoSources { .. })
        ));
    }
}
