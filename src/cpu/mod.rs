//! CPU emulation for the Harvard accumulator machine.
//!
//! This module implements the complete core:
//! - 256-word instruction memory, 256-byte data memory (disjoint spaces)
//! - 5 registers: `ip`, `ir`, `acc`, `mem_index`, `memory_op`
//! - 8-instruction set in 11-bit words, two-phase clocked

pub mod memory;
pub mod registers;
pub mod decode;
pub mod step;

pub use memory::{InstrMem, DataMem, LoadError};
pub use registers::Registers;
pub use decode::{Instr, Opcode, DecodeError};
pub use step::Cpu;
