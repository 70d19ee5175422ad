//! Code generator: lowers classified VM commands into instructions for
//! the register machine.
//!
//! The machine has one data register (`D`), one address register (`A`)
//! and memory (`M` = RAM[A]). Stack and segment pointers live in the
//! low RAM cells `SP`, `LCL`, `ARG`, `THIS` and `THAT`; `R13` and `R14`
//! are scratch cells used by `pop` and `return`.
//
//  Call frame layout, growing upwards:
//
//      ARG ->  argument 0
//              ...
//              argument nArgs-1
//              return address
//              saved LCL
//              saved ARG
//              saved THIS
//              saved THAT
//      LCL ->  local 0
//              ...
//      SP  ->  (next free cell)

use log::{debug, warn};
use std::path::Path;

use crate::error::{TranslateError, TranslateResult};
use crate::model::{
    ENTRY_FUNCTION, FRAME_SIZE, MAX_ADDRESS, POINTER_BASE, STACK_BASE, STATIC_BASE, TEMP_BASE,
};

use super::asm::{Comp, Dest, Instruction, Jump};
use super::ast::{ArithmeticOp, ClassifiedCommand, CommandKind, Comparison, Segment};

const FRAME_SCRATCH: &str = "R13";
const RETURN_SCRATCH: &str = "R14";
const POP_SCRATCH: &str = "R13";

/// Reserves a block of static addresses per translation unit.
///
/// A unit's block starts at `STATIC_BASE` plus the number of static pops
/// translated before the unit began, so the allocator must be carried
/// from one unit to the next for the whole merged program. The count is
/// unbounded; addresses past the machine's range are rejected when a
/// static is resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct StaticAllocator {
    pops: usize,
}

impl StaticAllocator {
    fn new() -> Self {
        Self::default()
    }

    /// Base address for a unit starting now.
    fn unit_base(&self) -> usize {
        usize::from(STATIC_BASE).saturating_add(self.pops)
    }

    fn record_pop(&mut self) {
        self.pops = self.pops.saturating_add(1);
    }
}

/// How an arithmetic command touches the stack.
enum Shape {
    Unary(Comp),
    Binary(Comp),
    Compare(Comparison),
}

impl From<ArithmeticOp> for Shape {
    fn from(op: ArithmeticOp) -> Self {
        match op {
            ArithmeticOp::Add => Self::Binary(Comp::DPlusM),
            ArithmeticOp::Sub => Self::Binary(Comp::MMinusD),
            ArithmeticOp::And => Self::Binary(Comp::DAndM),
            ArithmeticOp::Or => Self::Binary(Comp::DOrM),
            ArithmeticOp::Neg => Self::Unary(Comp::NegM),
            ArithmeticOp::Not => Self::Unary(Comp::NotM),
            ArithmeticOp::Eq => Self::Compare(Comparison::Eq),
            ArithmeticOp::Gt => Self::Compare(Comparison::Gt),
            ArithmeticOp::Lt => Self::Compare(Comparison::Lt),
        }
    }
}

/// Where a segment index lives.
enum Location {
    /// Absolute address known at translation time.
    Direct(u16),
    /// Base pointer cell plus index, resolved at run time.
    Indirect(&'static str, u16),
}

/// One writer covers a whole output file: the label counter and the
/// static allocator live as long as it does, so every unit of a program
/// must go through the same writer.
pub struct CodeWriter {
    unit_name: String,
    function_name: String,
    label_counter: usize,
    statics: StaticAllocator,
    static_base: usize,
    /// Source line of the command being translated, for error messages.
    line: usize,
    out: Vec<Instruction>,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeWriter {
    pub fn new() -> Self {
        let statics = StaticAllocator::new();
        Self {
            unit_name: String::new(),
            function_name: String::new(),
            label_counter: 0,
            static_base: statics.unit_base(),
            statics,
            line: 0,
            out: Vec::new(),
        }
    }

    /// Start a new translation unit. Accepts a bare name or a file path;
    /// only the file stem is kept.
    pub fn set_unit_name(&mut self, name: &str) {
        self.unit_name = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name)
            .to_string();
        self.static_base = self.statics.unit_base();
        debug!(
            "unit {} statics start at {}",
            self.unit_name, self.static_base
        );
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn function_name(&self) -> &str {
        &self.function_name
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.out
    }

    /// Drain what has been emitted so far.
    pub fn take_instructions(&mut self) -> Vec<Instruction> {
        std::mem::take(&mut self.out)
    }

    pub fn finish(self) -> Vec<Instruction> {
        self.out
    }

    fn emit<I: IntoIterator<Item = Instruction>>(&mut self, instrs: I) {
        self.out.extend(instrs);
    }

    fn next_label_id(&mut self) -> usize {
        self.label_counter += 1;
        self.label_counter
    }

    /// Translate one classified command.
    pub fn translate(&mut self, cmd: &ClassifiedCommand) -> TranslateResult<()> {
        debug!("line {}: {:?} {:?} {:?}", cmd.line, cmd.kind, cmd.arg1, cmd.arg2);
        self.line = cmd.line;
        match cmd.kind() {
            CommandKind::Arithmetic => {
                let name = cmd.arg1()?;
                let op = ArithmeticOp::from_mnemonic(name).ok_or_else(|| {
                    TranslateError::UnknownArithmetic {
                        line: cmd.line,
                        op: name.to_string(),
                    }
                })?;
                self.write_arithmetic(op);
            }
            CommandKind::Push | CommandKind::Pop => {
                let name = cmd.arg1()?;
                let segment =
                    Segment::from_name(name).ok_or_else(|| TranslateError::UnknownSegment {
                        line: cmd.line,
                        segment: name.to_string(),
                    })?;
                let index = cmd.arg2()?;
                if cmd.kind() == CommandKind::Push {
                    self.write_push(segment, index)?;
                } else {
                    self.write_pop(segment, index)?;
                }
            }
            CommandKind::Label => self.write_label(cmd.arg1()?),
            CommandKind::Goto => self.write_goto(cmd.arg1()?),
            CommandKind::IfGoto => self.write_if(cmd.arg1()?),
            CommandKind::Function => self.write_function(cmd.arg1()?, cmd.arg2()?)?,
            CommandKind::Call => self.write_call(cmd.arg1()?, cmd.arg2()?)?,
            CommandKind::Return => self.write_return(),
        }
        Ok(())
    }

    // ── Stack helpers ────────────────────────────────────────────────

    /// *SP = D; SP++
    fn push_d() -> [Instruction; 4] {
        [
            Instruction::at("SP"),
            Instruction::assign(Dest::M, Comp::MPlusOne),
            Instruction::assign(Dest::A, Comp::MMinusOne),
            Instruction::assign(Dest::M, Comp::D),
        ]
    }

    /// SP--; D = *SP
    fn pop_d() -> [Instruction; 3] {
        [
            Instruction::at("SP"),
            Instruction::assign(Dest::AM, Comp::MMinusOne),
            Instruction::assign(Dest::D, Comp::M),
        ]
    }

    /// `base + offset` as an address-instruction literal.
    fn checked_address(&self, base: usize, offset: u16, what: String) -> TranslateResult<u16> {
        let address = base.saturating_add(usize::from(offset));
        u16::try_from(address)
            .ok()
            .filter(|a| *a <= MAX_ADDRESS)
            .ok_or(TranslateError::AddressOutOfRange {
                line: self.line,
                what,
                address,
            })
    }

    fn locate(&self, segment: Segment, index: u16) -> TranslateResult<Location> {
        let base = match segment {
            Segment::Local => return self.indirect("LCL", segment, index),
            Segment::Argument => return self.indirect("ARG", segment, index),
            Segment::This => return self.indirect("THIS", segment, index),
            Segment::That => return self.indirect("THAT", segment, index),
            Segment::Pointer => usize::from(POINTER_BASE),
            Segment::Temp => usize::from(TEMP_BASE),
            Segment::Static => self.static_base,
            Segment::Constant => 0,
        };
        let what = format!("{} {index}", segment.name());
        Ok(Location::Direct(self.checked_address(base, index, what)?))
    }

    fn indirect(&self, base: &'static str, segment: Segment, index: u16) -> TranslateResult<Location> {
        let what = format!("{} {index}", segment.name());
        Ok(Location::Indirect(base, self.checked_address(0, index, what)?))
    }

    // ── Arithmetic ───────────────────────────────────────────────────

    pub fn write_arithmetic(&mut self, op: ArithmeticOp) {
        self.emit([Instruction::comment(op.mnemonic())]);
        match Shape::from(op) {
            Shape::Unary(comp) => self.emit([
                Instruction::at("SP"),
                Instruction::assign(Dest::A, Comp::MMinusOne),
                Instruction::assign(Dest::M, comp),
            ]),
            Shape::Binary(comp) => {
                self.emit(Self::pop_d());
                self.emit([
                    Instruction::assign(Dest::A, Comp::AMinusOne),
                    Instruction::assign(Dest::M, comp),
                ]);
            }
            Shape::Compare(cmp) => self.write_compare(cmp),
        }
    }

    /// left - right into D, then branch on the sign of the difference.
    /// Result cell gets -1 (true) or 0 (false).
    fn write_compare(&mut self, cmp: Comparison) {
        let id = self.next_label_id();
        let true_label = format!("{}_TRUE.{id}", cmp.tag());
        let end_label = format!("{}_END.{id}", cmp.tag());

        self.emit(Self::pop_d());
        self.emit([
            Instruction::assign(Dest::A, Comp::AMinusOne),
            Instruction::assign(Dest::D, Comp::MMinusD),
            Instruction::at(true_label.as_str()),
            Instruction::branch(Comp::D, cmp.jump()),
            Instruction::at("SP"),
            Instruction::assign(Dest::A, Comp::MMinusOne),
            Instruction::assign(Dest::M, Comp::Zero),
            Instruction::at(end_label.as_str()),
            Instruction::branch(Comp::Zero, Jump::Jmp),
            Instruction::label(true_label),
            Instruction::at("SP"),
            Instruction::assign(Dest::A, Comp::MMinusOne),
            Instruction::assign(Dest::M, Comp::MinusOne),
            Instruction::label(end_label),
        ]);
    }

    // ── Memory access ────────────────────────────────────────────────

    pub fn write_push(&mut self, segment: Segment, index: u16) -> TranslateResult<()> {
        let location = self.locate(segment, index)?;
        self.emit([Instruction::comment(format!(
            "push {} {index}",
            segment.name()
        ))]);

        if segment == Segment::Constant {
            self.emit([
                Instruction::value(index),
                Instruction::assign(Dest::D, Comp::A),
            ]);
        } else {
            match location {
                Location::Direct(addr) => self.emit([
                    Instruction::value(addr),
                    Instruction::assign(Dest::D, Comp::M),
                ]),
                Location::Indirect(base, index) => self.emit([
                    Instruction::value(index),
                    Instruction::assign(Dest::D, Comp::A),
                    Instruction::at(base),
                    Instruction::assign(Dest::A, Comp::DPlusM),
                    Instruction::assign(Dest::D, Comp::M),
                ]),
            }
        }
        self.emit(Self::push_d());
        Ok(())
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> TranslateResult<()> {
        let location = self.locate(segment, index)?;
        self.emit([Instruction::comment(format!(
            "pop {} {index}",
            segment.name()
        ))]);

        // The popped value is discarded: constant is not a destination.
        if segment == Segment::Constant {
            self.emit([
                Instruction::at("SP"),
                Instruction::assign(Dest::M, Comp::MMinusOne),
            ]);
            return Ok(());
        }

        if let (Segment::Static, Location::Direct(addr)) = (segment, &location) {
            self.statics.record_pop();
            if *addr >= STACK_BASE {
                warn!(
                    "{}: static {index} resolves to {addr}, inside the stack region",
                    self.unit_name
                );
            }
        }

        match location {
            Location::Direct(addr) => {
                self.emit(Self::pop_d());
                self.emit([
                    Instruction::value(addr),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
            }
            Location::Indirect(base, index) => {
                self.emit([
                    Instruction::value(index),
                    Instruction::assign(Dest::D, Comp::A),
                    Instruction::at(base),
                    Instruction::assign(Dest::D, Comp::DPlusM),
                    Instruction::at(POP_SCRATCH),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
                self.emit(Self::pop_d());
                self.emit([
                    Instruction::at(POP_SCRATCH),
                    Instruction::assign(Dest::A, Comp::M),
                    Instruction::assign(Dest::M, Comp::D),
                ]);
            }
        }
        Ok(())
    }

    // ── Branching ────────────────────────────────────────────────────

    /// `function$label` inside a function, the bare label outside.
    fn scoped_label(&self, label: &str) -> String {
        if self.function_name.is_empty() {
            label.to_string()
        } else {
            format!("{}${label}", self.function_name)
        }
    }

    pub fn write_label(&mut self, label: &str) {
        let symbol = self.scoped_label(label);
        self.emit([
            Instruction::comment(format!("label {label}")),
            Instruction::label(symbol),
        ]);
    }

    pub fn write_goto(&mut self, label: &str) {
        let symbol = self.scoped_label(label);
        self.emit([
            Instruction::comment(format!("goto {label}")),
            Instruction::at(symbol),
            Instruction::branch(Comp::Zero, Jump::Jmp),
        ]);
    }

    pub fn write_if(&mut self, label: &str) {
        let symbol = self.scoped_label(label);
        self.emit([Instruction::comment(format!("if-goto {label}"))]);
        self.emit(Self::pop_d());
        self.emit([
            Instruction::at(symbol),
            Instruction::branch(Comp::D, Jump::Jne),
        ]);
    }

    // ── Functions ────────────────────────────────────────────────────

    pub fn write_function(&mut self, name: &str, n_vars: u16) -> TranslateResult<()> {
        let n_vars = self.checked_address(0, n_vars, format!("function {name} locals"))?;
        self.function_name = name.to_string();
        self.emit([
            Instruction::comment(format!("function {name} {n_vars}")),
            Instruction::label(name),
        ]);
        if n_vars == 0 {
            return Ok(());
        }

        // SP += n_vars, then walk the new cells from the old SP.
        self.emit([
            Instruction::value(n_vars),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at("SP"),
            Instruction::assign(Dest::M, Comp::DPlusM),
            Instruction::assign(Dest::A, Comp::MMinusD),
        ]);
        for i in 0..n_vars {
            if i > 0 {
                self.emit([Instruction::assign(Dest::A, Comp::APlusOne)]);
            }
            self.emit([Instruction::assign(Dest::M, Comp::Zero)]);
        }
        Ok(())
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> TranslateResult<()> {
        let arg_offset =
            self.checked_address(usize::from(FRAME_SIZE), n_args, format!("call {name} {n_args}"))?;
        let id = self.next_label_id();
        let return_label = format!("{name}$ret.{id}");

        self.emit([
            Instruction::comment(format!("call {name} {n_args}")),
            Instruction::at(return_label.as_str()),
            Instruction::assign(Dest::D, Comp::A),
        ]);
        self.emit(Self::push_d());
        for saved in ["LCL", "ARG", "THIS", "THAT"] {
            self.emit([
                Instruction::at(saved),
                Instruction::assign(Dest::D, Comp::M),
            ]);
            self.emit(Self::push_d());
        }

        // LCL = SP; ARG = SP - 5 - n_args
        self.emit([
            Instruction::at("SP"),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at("LCL"),
            Instruction::assign(Dest::M, Comp::D),
            Instruction::value(arg_offset),
            Instruction::assign(Dest::D, Comp::DMinusA),
            Instruction::at("ARG"),
            Instruction::assign(Dest::M, Comp::D),
            Instruction::at(name),
            Instruction::branch(Comp::Zero, Jump::Jmp),
            Instruction::label(return_label),
        ]);
        Ok(())
    }

    pub fn write_return(&mut self) {
        self.emit([
            Instruction::comment("return"),
            // frame = LCL
            Instruction::at("LCL"),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at(FRAME_SCRATCH),
            Instruction::assign(Dest::M, Comp::D),
            // return address = *(frame - 5), read before *ARG is overwritten
            Instruction::value(FRAME_SIZE),
            Instruction::assign(Dest::A, Comp::DMinusA),
            Instruction::assign(Dest::D, Comp::M),
            Instruction::at(RETURN_SCRATCH),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        // *ARG = pop(); SP = ARG + 1
        self.emit(Self::pop_d());
        self.emit([
            Instruction::at("ARG"),
            Instruction::assign(Dest::A, Comp::M),
            Instruction::assign(Dest::M, Comp::D),
            Instruction::at("ARG"),
            Instruction::assign(Dest::D, Comp::MPlusOne),
            Instruction::at("SP"),
            Instruction::assign(Dest::M, Comp::D),
        ]);

        // Walk the saved pointers downwards from the frame copy.
        for saved in ["THAT", "THIS", "ARG", "LCL"] {
            self.emit([
                Instruction::at(FRAME_SCRATCH),
                Instruction::assign(Dest::AM, Comp::MMinusOne),
                Instruction::assign(Dest::D, Comp::M),
                Instruction::at(saved),
                Instruction::assign(Dest::M, Comp::D),
            ]);
        }

        self.emit([
            Instruction::at(RETURN_SCRATCH),
            Instruction::assign(Dest::A, Comp::M),
            Instruction::branch(Comp::Zero, Jump::Jmp),
        ]);
    }

    /// SP = 256; call Sys.init 0
    pub fn write_init(&mut self) -> TranslateResult<()> {
        self.emit([
            Instruction::comment("bootstrap"),
            Instruction::value(STACK_BASE),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at("SP"),
            Instruction::assign(Dest::M, Comp::D),
        ]);
        self.write_call(ENTRY_FUNCTION, 0)
    }
}
