//! Interpreter for emitted instructions.
//!
//! Used by the tests to check what translated code actually does rather
//! than how it is spelled. Symbols are resolved the way the downstream
//! assembler would: labels to ROM addresses, the predefined registers to
//! their fixed cells, anything else to a fresh variable from address 16.

use std::collections::HashMap;
use thiserror::Error;

use super::asm::{Comp, Dest, Instruction, Jump, Operand};

const RAM_SIZE: usize = 0x8000;
const FIRST_VARIABLE: u16 = 16;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EmulatorError {
    #[error("no halt after {0} steps")]
    StepLimit(usize),
}

/// Executable form of one instruction, symbols already resolved.
#[derive(Debug, Clone, Copy)]
enum Op {
    Load(i16),
    Compute(Comp, Option<Dest>, Option<Jump>),
}

pub struct Emulator {
    rom: Vec<Op>,
    ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: usize,
}

fn predefined(symbol: &str) -> Option<u16> {
    let addr = match symbol {
        "SP" => 0,
        "LCL" => 1,
        "ARG" => 2,
        "THIS" => 3,
        "THAT" => 4,
        "SCREEN" => 0x4000,
        "KBD" => 0x6000,
        _ => {
            let reg = symbol.strip_prefix('R')?.parse::<u16>().ok()?;
            return (reg < 16).then_some(reg);
        }
    };
    Some(addr)
}

impl Emulator {
    pub fn new(program: &[Instruction]) -> Self {
        // first pass: bind labels to the next ROM slot
        let mut symbols = HashMap::<String, u16>::new();
        let mut rom_len = 0u16;
        for instr in program {
            match instr {
                Instruction::Label(name) => {
                    symbols.insert(name.clone(), rom_len);
                }
                i if i.is_executable() => rom_len += 1,
                _ => {}
            }
        }

        // second pass: resolve operands
        let mut next_variable = FIRST_VARIABLE;
        let mut rom = Vec::with_capacity(rom_len as usize);
        for instr in program {
            match instr {
                Instruction::Address(Operand::Value(v)) => rom.push(Op::Load(*v as i16)),
                Instruction::Address(Operand::Symbol(s)) => {
                    let addr = match predefined(s).or_else(|| symbols.get(s).copied()) {
                        Some(addr) => addr,
                        None => {
                            symbols.insert(s.clone(), next_variable);
                            next_variable += 1;
                            next_variable - 1
                        }
                    };
                    rom.push(Op::Load(addr as i16));
                }
                Instruction::Compute { dest, comp, jump } => {
                    rom.push(Op::Compute(*comp, *dest, *jump))
                }
                Instruction::Label(_) | Instruction::Comment(_) => {}
            }
        }

        Self {
            rom,
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
        }
    }

    pub fn poke(&mut self, addr: u16, value: i16) {
        self.ram[addr as usize % RAM_SIZE] = value;
    }

    pub fn peek(&self, addr: u16) -> i16 {
        self.ram[addr as usize % RAM_SIZE]
    }

    fn m_index(&self) -> usize {
        (self.a as u16 as usize) % RAM_SIZE
    }

    /// Run until the program counter leaves ROM or the program parks in a
    /// `@X / 0;JMP` self loop. Returns the number of steps taken.
    pub fn run(&mut self, max_steps: usize) -> Result<usize, EmulatorError> {
        for step in 0..max_steps {
            let Some(op) = self.rom.get(self.pc).copied() else {
                return Ok(step);
            };
            match op {
                Op::Load(v) => {
                    self.a = v;
                    self.pc += 1;
                }
                Op::Compute(comp, dest, jump) => {
                    let addr = self.m_index();
                    let value = comp.eval(self.d, self.a, self.ram[addr]);
                    let target = self.a as u16 as usize;
                    if let Some(dest) = dest {
                        if dest.writes_m() {
                            self.ram[addr] = value;
                        }
                        if dest.writes_a() {
                            self.a = value;
                        }
                        if dest.writes_d() {
                            self.d = value;
                        }
                    }
                    match jump {
                        Some(j) if j.taken(value) => {
                            if j == Jump::Jmp && target + 1 == self.pc {
                                return Ok(step + 1);
                            }
                            self.pc = target;
                        }
                        _ => self.pc += 1,
                    }
                }
            }
        }
        Err(EmulatorError::StepLimit(max_steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_off_the_end() {
        let program = vec![
            Instruction::value(7),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at("R5"),
            Instruction::assign(Dest::M, Comp::D),
        ];
        let mut emu = Emulator::new(&program);
        assert_eq!(emu.run(100), Ok(4));
        assert_eq!(emu.peek(5), 7);
    }

    #[test]
    fn test_halt_loop_stops() {
        let program = vec![
            Instruction::label("END"),
            Instruction::at("END"),
            Instruction::branch(Comp::Zero, Jump::Jmp),
        ];
        let mut emu = Emulator::new(&program);
        assert_eq!(emu.run(100), Ok(2));
    }

    #[test]
    fn test_step_limit() {
        // two-instruction loop that is not a self loop
        let program = vec![
            Instruction::label("TOP"),
            Instruction::value(0),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at("TOP"),
            Instruction::branch(Comp::Zero, Jump::Jmp),
        ];
        let mut emu = Emulator::new(&program);
        assert_eq!(emu.run(50), Err(EmulatorError::StepLimit(50)));
    }

    #[test]
    fn test_unknown_symbols_become_variables() {
        let program = vec![
            Instruction::value(3),
            Instruction::assign(Dest::D, Comp::A),
            Instruction::at("counter"),
            Instruction::assign(Dest::M, Comp::D),
            Instruction::at("other"),
            Instruction::assign(Dest::M, Comp::MinusOne),
        ];
        let mut emu = Emulator::new(&program);
        emu.run(100).unwrap();
        assert_eq!(emu.peek(16), 3);
        assert_eq!(emu.peek(17), -1);
    }

    #[test]
    fn test_memory_write_uses_address_before_update() {
        // AM=M-1 must store into the old A cell
        let program = vec![
            Instruction::at("SP"),
            Instruction::assign(Dest::AM, Comp::MMinusOne),
        ];
        let mut emu = Emulator::new(&program);
        emu.poke(0, 257);
        emu.run(10).unwrap();
        assert_eq!(emu.peek(0), 256);
    }
}
