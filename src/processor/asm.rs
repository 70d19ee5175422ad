//! Typed assembly instructions for the 16-bit target machine.
//!
//! The code generator only ever builds these values; text is produced by
//! the `Display` impls when the program is written out.
//
//  Text forms:
//
//      @value | @symbol          address instruction
//      dest=comp                 compute and store
//      comp;jump                 compute and branch
//      dest=comp;jump            both
//      (label)                   label definition (no ROM slot)
//      // text                   comment (no ROM slot)

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Value(u16),
    Symbol(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v}"),
            Self::Symbol(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dest {
    M,
    D,
    MD,
    A,
    AM,
    AD,
    AMD,
}

impl Dest {
    pub fn writes_a(self) -> bool {
        matches!(self, Self::A | Self::AM | Self::AD | Self::AMD)
    }

    pub fn writes_d(self) -> bool {
        matches!(self, Self::D | Self::MD | Self::AD | Self::AMD)
    }

    pub fn writes_m(self) -> bool {
        matches!(self, Self::M | Self::MD | Self::AM | Self::AMD)
    }

    fn text(self) -> &'static str {
        match self {
            Self::M => "M",
            Self::D => "D",
            Self::MD => "MD",
            Self::A => "A",
            Self::AM => "AM",
            Self::AD => "AD",
            Self::AMD => "AMD",
        }
    }
}

/// The full computation table of the ALU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Zero,
    One,
    MinusOne,
    D,
    A,
    M,
    NotD,
    NotA,
    NotM,
    NegD,
    NegA,
    NegM,
    DPlusOne,
    APlusOne,
    MPlusOne,
    DMinusOne,
    AMinusOne,
    MMinusOne,
    DPlusA,
    DPlusM,
    DMinusA,
    DMinusM,
    AMinusD,
    MMinusD,
    DAndA,
    DAndM,
    DOrA,
    DOrM,
}

impl Comp {
    fn text(self) -> &'static str {
        match self {
            Self::Zero => "0",
            Self::One => "1",
            Self::MinusOne => "-1",
            Self::D => "D",
            Self::A => "A",
            Self::M => "M",
            Self::NotD => "!D",
            Self::NotA => "!A",
            Self::NotM => "!M",
            Self::NegD => "-D",
            Self::NegA => "-A",
            Self::NegM => "-M",
            Self::DPlusOne => "D+1",
            Self::APlusOne => "A+1",
            Self::MPlusOne => "M+1",
            Self::DMinusOne => "D-1",
            Self::AMinusOne => "A-1",
            Self::MMinusOne => "M-1",
            Self::DPlusA => "D+A",
            Self::DPlusM => "D+M",
            Self::DMinusA => "D-A",
            Self::DMinusM => "D-M",
            Self::AMinusD => "A-D",
            Self::MMinusD => "M-D",
            Self::DAndA => "D&A",
            Self::DAndM => "D&M",
            Self::DOrA => "D|A",
            Self::DOrM => "D|M",
        }
    }

    /// Evaluate with 16-bit wrapping arithmetic.
    pub fn eval(self, d: i16, a: i16, m: i16) -> i16 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
            Self::MinusOne => -1,
            Self::D => d,
            Self::A => a,
            Self::M => m,
            Self::NotD => !d,
            Self::NotA => !a,
            Self::NotM => !m,
            Self::NegD => d.wrapping_neg(),
            Self::NegA => a.wrapping_neg(),
            Self::NegM => m.wrapping_neg(),
            Self::DPlusOne => d.wrapping_add(1),
            Self::APlusOne => a.wrapping_add(1),
            Self::MPlusOne => m.wrapping_add(1),
            Self::DMinusOne => d.wrapping_sub(1),
            Self::AMinusOne => a.wrapping_sub(1),
            Self::MMinusOne => m.wrapping_sub(1),
            Self::DPlusA => d.wrapping_add(a),
            Self::DPlusM => d.wrapping_add(m),
            Self::DMinusA => d.wrapping_sub(a),
            Self::DMinusM => d.wrapping_sub(m),
            Self::AMinusD => a.wrapping_sub(d),
            Self::MMinusD => m.wrapping_sub(d),
            Self::DAndA => d & a,
            Self::DAndM => d & m,
            Self::DOrA => d | a,
            Self::DOrM => d | m,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jump {
    Jgt,
    Jeq,
    Jge,
    Jlt,
    Jne,
    Jle,
    Jmp,
}

impl Jump {
    pub fn taken(self, value: i16) -> bool {
        match self {
            Self::Jgt => value > 0,
            Self::Jeq => value == 0,
            Self::Jge => value >= 0,
            Self::Jlt => value < 0,
            Self::Jne => value != 0,
            Self::Jle => value <= 0,
            Self::Jmp => true,
        }
    }

    fn text(self) -> &'static str {
        match self {
            Self::Jgt => "JGT",
            Self::Jeq => "JEQ",
            Self::Jge => "JGE",
            Self::Jlt => "JLT",
            Self::Jne => "JNE",
            Self::Jle => "JLE",
            Self::Jmp => "JMP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Comment(String),
    Address(Operand),
    Compute {
        dest: Option<Dest>,
        comp: Comp,
        jump: Option<Jump>,
    },
    Label(String),
}

impl Instruction {
    pub fn at(symbol: impl Into<String>) -> Self {
        Self::Address(Operand::Symbol(symbol.into()))
    }

    pub fn value(value: u16) -> Self {
        Self::Address(Operand::Value(value))
    }

    pub fn assign(dest: Dest, comp: Comp) -> Self {
        Self::Compute {
            dest: Some(dest),
            comp,
            jump: None,
        }
    }

    pub fn branch(comp: Comp, jump: Jump) -> Self {
        Self::Compute {
            dest: None,
            comp,
            jump: Some(jump),
        }
    }

    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Whether the instruction occupies a ROM slot.
    pub fn is_executable(&self) -> bool {
        matches!(self, Self::Address(_) | Self::Compute { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(text) => write!(f, "// {text}"),
            Self::Address(op) => write!(f, "@{op}"),
            Self::Label(name) => write!(f, "({name})"),
            Self::Compute { dest, comp, jump } => {
                if let Some(dest) = dest {
                    write!(f, "{}=", dest.text())?;
                }
                f.write_str(comp.text())?;
                if let Some(jump) = jump {
                    write!(f, ";{}", jump.text())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_forms() {
        let test_cases = vec![
            (Instruction::value(256), "@256"),
            (Instruction::at("SP"), "@SP"),
            (Instruction::assign(Dest::AM, Comp::MMinusOne), "AM=M-1"),
            (Instruction::branch(Comp::Zero, Jump::Jmp), "0;JMP"),
            (Instruction::branch(Comp::D, Jump::Jne), "D;JNE"),
            (
                Instruction::Compute {
                    dest: Some(Dest::D),
                    comp: Comp::DMinusM,
                    jump: Some(Jump::Jle),
                },
                "D=D-M;JLE",
            ),
            (Instruction::label("Foo$L"), "(Foo$L)"),
            (Instruction::comment("push constant 7"), "// push constant 7"),
        ];

        for (instr, expected) in test_cases {
            assert_eq!(instr.to_string(), expected);
        }
    }

    #[test]
    fn test_comp_wraps() {
        assert_eq!(Comp::DPlusA.eval(i16::MAX, 1, 0), i16::MIN);
        assert_eq!(Comp::NotM.eval(0, 0, 0), -1);
        assert_eq!(Comp::MMinusD.eval(3, 0, 5), 2);
    }

    #[test]
    fn test_labels_and_comments_take_no_rom() {
        assert!(!Instruction::label("X").is_executable());
        assert!(!Instruction::comment("x").is_executable());
        assert!(Instruction::value(0).is_executable());
    }
}
