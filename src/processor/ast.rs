//! Classified VM commands, as handed from the command source to the
//! code generator.

use serde::Serialize;

use crate::error::{TranslateError, TranslateResult};
use crate::processor::asm::Jump;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandKind {
    Arithmetic,
    Push,
    Pop,
    Label,
    Goto,
    IfGoto,
    Function,
    Call,
    Return,
}

/// One cleaned and classified source line.
///
/// `arg1` is the arithmetic mnemonic, segment name, or label/function
/// name; it is absent only for `return`. `arg2` is the index, argument
/// count or local count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedCommand {
    pub kind: CommandKind,
    pub arg1: Option<String>,
    pub arg2: Option<u16>,
    pub line: usize,
}

impl ClassifiedCommand {
    pub fn new(kind: CommandKind, arg1: Option<String>, arg2: Option<u16>, line: usize) -> Self {
        Self {
            kind,
            arg1,
            arg2,
            line,
        }
    }

    pub fn kind(&self) -> CommandKind {
        self.kind
    }

    pub fn arg1(&self) -> TranslateResult<&str> {
        self.arg1
            .as_deref()
            .ok_or(TranslateError::MissingOperand {
                line: self.line,
                kind: self.kind,
                operand: "first",
            })
    }

    pub fn arg2(&self) -> TranslateResult<u16> {
        self.arg2.ok_or(TranslateError::MissingOperand {
            line: self.line,
            kind: self.kind,
            operand: "second",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Temp,
    Static,
}

impl Segment {
    pub fn from_name(name: &str) -> Option<Self> {
        let seg = match name {
            "constant" => Self::Constant,
            "local" => Self::Local,
            "argument" => Self::Argument,
            "this" => Self::This,
            "that" => Self::That,
            "pointer" => Self::Pointer,
            "temp" => Self::Temp,
            "static" => Self::Static,
            _ => return None,
        };
        Some(seg)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Local => "local",
            Self::Argument => "argument",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
            Self::Static => "static",
        }
    }
}

/// The three comparisons share one compare-and-branch skeleton; only the
/// jump condition differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Lt,
}

impl Comparison {
    pub fn jump(self) -> Jump {
        match self {
            Self::Eq => Jump::Jeq,
            Self::Gt => Jump::Jgt,
            Self::Lt => Jump::Jlt,
        }
    }

    /// Prefix of the generated label pair.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Eq => "EQ",
            Self::Gt => "GT",
            Self::Lt => "LT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl ArithmeticOp {
    pub const MNEMONICS: &'static [&'static str] =
        &["add", "sub", "neg", "eq", "gt", "lt", "and", "or", "not"];

    pub fn from_mnemonic(name: &str) -> Option<Self> {
        let op = match name {
            "add" => Self::Add,
            "sub" => Self::Sub,
            "neg" => Self::Neg,
            "eq" => Self::Eq,
            "gt" => Self::Gt,
            "lt" => Self::Lt,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            _ => return None,
        };
        Some(op)
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_mnemonic_resolves() {
        for name in ArithmeticOp::MNEMONICS {
            let op = ArithmeticOp::from_mnemonic(name).expect("known mnemonic");
            assert_eq!(op.mnemonic(), *name);
        }
        assert_eq!(ArithmeticOp::from_mnemonic("shiftleft"), None);
    }

    #[test]
    fn test_segment_lookup() {
        assert_eq!(Segment::from_name("argument"), Some(Segment::Argument));
        assert_eq!(Segment::from_name("heap"), None);
    }

    #[test]
    fn test_missing_operands_are_reported() {
        let ret = ClassifiedCommand::new(CommandKind::Return, None, None, 7);
        let err = ret.arg1().unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 7: Return command is missing its first operand"
        );

        let label = ClassifiedCommand::new(CommandKind::Label, Some("L".into()), None, 3);
        assert_eq!(label.arg1().unwrap(), "L");
        assert!(label.arg2().is_err());
    }
}
