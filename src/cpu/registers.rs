//! Register file of the Harvard accumulator machine.
//!
//! Five registers:
//! - `ip`: 8-bit instruction pointer
//! - `ir`: latched 11-bit instruction (opcode + operand)
//! - `acc`: 8-bit accumulator
//! - `mem_index`: 8-bit transient index added to the operand for addressing
//! - `memory_op`: 8-bit operand latched from data memory on the falling edge

use crate::cpu::decode::Instr;
use serde::{Serialize, Deserialize};

/// The register file.
///
/// All values are 8-bit and wrap on arithmetic; the only sign interpretation
/// anywhere is the jump condition reading bit 7 of `acc`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// Instruction pointer. Starts at 0xFF so the first wrapping increment
    /// fetches address 0.
    pub ip: u8,

    /// Currently latched instruction. Drives the ALU action on the next
    /// rising edge and the memory action on the following falling edge.
    pub ir: Instr,

    /// Accumulator.
    pub acc: u8,

    /// Memory-index register. Added to the operand field to form the data
    /// address; decays to 0 every cycle unless refreshed by IDX.
    pub mem_index: u8,

    /// Operand latched from data memory on the falling edge, consumed by
    /// the ALU on the next rising edge.
    pub memory_op: u8,
}

impl Registers {
    /// Power-on register values.
    pub fn new() -> Self {
        Self {
            ip: 0xFF,
            ir: Instr::NOP,
            acc: 0,
            mem_index: 0,
            memory_op: 0,
        }
    }

    /// Reset all registers to their power-on values.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// True if `acc` is negative in two's-complement interpretation.
    pub fn acc_negative(&self) -> bool {
        self.acc & 0x80 != 0
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Opcode;

    #[test]
    fn test_power_on_values() {
        let regs = Registers::new();
        assert_eq!(regs.ip, 0xFF);
        assert_eq!(regs.ir, Instr::NOP);
        assert_eq!(regs.acc, 0);
        assert_eq!(regs.mem_index, 0);
        assert_eq!(regs.memory_op, 0);
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let mut regs = Registers::new();
        regs.ip = 7;
        regs.ir = Instr::new(Opcode::Add, 42);
        regs.acc = 0x80;
        regs.reset();
        assert_eq!(regs, Registers::new());
    }

    #[test]
    fn test_acc_sign() {
        let mut regs = Registers::new();
        regs.acc = 0x7F;
        assert!(!regs.acc_negative());
        regs.acc = 0x80;
        assert!(regs.acc_negative());
        regs.acc = 0xFF;
        assert!(regs.acc_negative());
    }
}
