//! # harv8
//!
//! An emulator of a minimal Harvard-architecture 8-bit accumulator CPU.
//!
//! The machine has separate instruction and data memories (256 words each),
//! a single accumulator, an 8-instruction set packed into 11-bit words, and
//! a two-phase clock: data memory is accessed on the falling edge, fetch and
//! ALU effects commit on the rising edge.

pub mod cpu;
pub mod asm;
pub mod trace;

// Re-export commonly used types
pub use cpu::{Cpu, Registers, Instr, Opcode, InstrMem, DataMem, LoadError, DecodeError};
pub use asm::{assemble, disassemble, AssemblerError, RomImage, load_rom, save_rom};
pub use trace::VcdTracer;
