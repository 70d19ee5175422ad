//! Errors raised while reading, classifying and translating VM code.
//!
//! Every variant is fatal: the translator is a single pass and aborts the
//! whole invocation on the first malformed command.

use std::path::PathBuf;
use thiserror::Error;

use crate::processor::ast::CommandKind;

pub type TranslateResult<T> = Result<T, TranslateError>;

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("line {line}: empty command")]
    EmptyCommand { line: usize },

    #[error("line {line}: unknown command `{word}`")]
    UnknownCommand { line: usize, word: String },

    #[error("line {line}: `{command}` takes {expected} operand(s), found {found}")]
    Arity {
        line: usize,
        command: String,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid index `{text}` (expected 0..=32767)")]
    InvalidIndex { line: usize, text: String },

    #[error("line {line}: unknown segment `{segment}`")]
    UnknownSegment { line: usize, segment: String },

    #[error("line {line}: unknown arithmetic command `{op}`")]
    UnknownArithmetic { line: usize, op: String },

    #[error("line {line}: {kind:?} command is missing its {operand} operand")]
    MissingOperand {
        line: usize,
        kind: CommandKind,
        operand: &'static str,
    },

    #[error("line {line}: {what} resolves to address {address}, past the last address 32767")]
    AddressOutOfRange {
        line: usize,
        what: String,
        address: usize,
    },

    #[error("{path}: not a file or directory")]
    InvalidInput { path: PathBuf },

    #[error("{path}: no .vm files found")]
    NoSources { path: PathBuf },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranslateError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
