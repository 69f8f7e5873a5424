//! Instruction decoder for the Harvard accumulator machine.
//!
//! Instructions are 11-bit words: a 3-bit opcode in the top bits and an
//! 8-bit operand in the low bits. All 8 opcode encodings are defined, so
//! decoding a width-valid word never fails.

use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Number of bits in an encoded instruction word.
pub const INSTR_WIDTH: u32 = 11;

/// Mask covering a full 11-bit instruction word.
pub const INSTR_MASK: u16 = (1 << INSTR_WIDTH) - 1;

/// The 8 operations, decoded from the 3-bit opcode field (MSB-first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    /// `acc := acc + memory_op` (wrapping)
    Add,
    /// `acc := acc - memory_op` (wrapping, two's complement)
    Sub,
    /// `acc := operand` (immediate, ignores memory)
    Ldi,
    /// `data_mem[addr] := acc`; operand 0 also latches `acc` on the output port
    St,
    /// `ip := operand` iff bit 7 of `acc` is set, else fall through
    Jmp,
    /// `mem_index := memory_op` for the duration of the next instruction
    Idx,
    /// `acc := acc & memory_op`
    And,
    /// No effect
    Nop,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Ldi,
        Opcode::St,
        Opcode::Jmp,
        Opcode::Idx,
        Opcode::And,
        Opcode::Nop,
    ];

    /// Decode from the 3-bit opcode field. Total over 0..=7.
    pub fn from_bits(bits: u8) -> Self {
        Self::ALL[(bits & 0b111) as usize]
    }

    /// The 3-bit encoding of this opcode.
    pub fn to_bits(self) -> u8 {
        match self {
            Opcode::Add => 0b000,
            Opcode::Sub => 0b001,
            Opcode::Ldi => 0b010,
            Opcode::St => 0b011,
            Opcode::Jmp => 0b100,
            Opcode::Idx => 0b101,
            Opcode::And => 0b110,
            Opcode::Nop => 0b111,
        }
    }

    /// Assembly mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Ldi => "LDI",
            Opcode::St => "ST",
            Opcode::Jmp => "JMP",
            Opcode::Idx => "IDX",
            Opcode::And => "AND",
            Opcode::Nop => "NOP",
        }
    }
}

/// A decoded instruction: opcode plus 8-bit operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instr {
    pub op: Opcode,
    pub operand: u8,
}

impl Instr {
    /// Construct an instruction.
    pub const fn new(op: Opcode, operand: u8) -> Self {
        Self { op, operand }
    }

    /// The power-on value of the instruction register.
    pub const NOP: Instr = Instr::new(Opcode::Nop, 0);

    /// Encode to an 11-bit word.
    pub fn encode(self) -> u16 {
        ((self.op.to_bits() as u16) << 8) | self.operand as u16
    }
}

/// Decode an 11-bit instruction word.
///
/// Words with bits set above bit 10 are rejected rather than masked: a
/// too-wide word is a loader contract violation, not a runtime condition.
pub fn decode(word: u16) -> Result<Instr, DecodeError> {
    if word & !INSTR_MASK != 0 {
        return Err(DecodeError::WordTooWide(word));
    }
    Ok(Instr {
        op: Opcode::from_bits((word >> 8) as u8),
        operand: (word & 0xFF) as u8,
    })
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("instruction word {0:#06x} wider than 11 bits")]
    WordTooWide(u16),
}

impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.op.mnemonic(), self.operand)
    }
}
