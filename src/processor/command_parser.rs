//! Command source: classifies cleaned lines into `ClassifiedCommand`s.

use crate::error::{TranslateError, TranslateResult};
use crate::model::MAX_ADDRESS;

use super::ast::{ArithmeticOp, ClassifiedCommand, CommandKind};
use super::lexer::{Lexer, SourceLine};

/// All commands of one translation unit.
///
/// Holds the cleaned lines; `commands()` can be called any number of
/// times and always starts again from the first command.
#[derive(Debug, Clone)]
pub struct CommandSource {
    lines: Vec<SourceLine>,
}

impl CommandSource {
    pub fn new(src: &str) -> Self {
        Self {
            lines: Lexer::new(src).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn commands(&self) -> impl Iterator<Item = TranslateResult<ClassifiedCommand>> + '_ {
        self.lines.iter().map(classify)
    }

    /// Classify everything, stopping at the first malformed line.
    pub fn parse_all(&self) -> TranslateResult<Vec<ClassifiedCommand>> {
        self.commands().collect()
    }
}

pub fn classify(line: &SourceLine) -> TranslateResult<ClassifiedCommand> {
    let Some((head, operands)) = line.words.split_first() else {
        return Err(TranslateError::EmptyCommand { line: line.number });
    };

    let (kind, arity) = match head.as_str() {
        op if ArithmeticOp::from_mnemonic(op).is_some() => (CommandKind::Arithmetic, 0),
        "push" => (CommandKind::Push, 2),
        "pop" => (CommandKind::Pop, 2),
        "label" => (CommandKind::Label, 1),
        "goto" => (CommandKind::Goto, 1),
        "if-goto" => (CommandKind::IfGoto, 1),
        "function" => (CommandKind::Function, 2),
        "call" => (CommandKind::Call, 2),
        "return" => (CommandKind::Return, 0),
        other => {
            return Err(TranslateError::UnknownCommand {
                line: line.number,
                word: other.to_string(),
            });
        }
    };

    if operands.len() != arity {
        return Err(TranslateError::Arity {
            line: line.number,
            command: head.clone(),
            expected: arity,
            found: operands.len(),
        });
    }

    let arg1 = match kind {
        CommandKind::Arithmetic => Some(head.clone()),
        CommandKind::Return => None,
        _ => Some(operands[0].clone()),
    };
    let arg2 = match operands.get(1) {
        Some(text) => Some(parse_index(text, line.number)?),
        None => None,
    };

    Ok(ClassifiedCommand::new(kind, arg1, arg2, line.number))
}

fn parse_index(text: &str, line: usize) -> TranslateResult<u16> {
    text.parse::<u16>()
        .ok()
        .filter(|v| *v <= MAX_ADDRESS)
        .ok_or_else(|| TranslateError::InvalidIndex {
            line,
            text: text.to_string(),
        })
}
