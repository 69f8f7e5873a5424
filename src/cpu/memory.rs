//! Instruction and data memories.
//!
//! Harvard model: the two memories are disjoint address spaces. Instruction
//! memory is written once by the loader and read-only during execution; data
//! memory starts zeroed and is read or written once per cycle. Both are 256
//! cells deep and all addressing is 8-bit, so accesses wrap and can never
//! fault.

use crate::cpu::decode::Instr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Depth of each memory (8-bit address space).
pub const MEMORY_SIZE: usize = 256;

/// Instruction memory: 256 slots, filled by the loader.
///
/// Slots beyond the loaded program hold NOP, so running off the end of a
/// program is harmless (and the pointer wraps at 256 regardless).
#[derive(Clone, Serialize, Deserialize)]
pub struct InstrMem {
    cells: Vec<Instr>,
}

impl InstrMem {
    /// Create an instruction memory with every slot set to NOP.
    pub fn new() -> Self {
        Self {
            cells: vec![Instr::NOP; MEMORY_SIZE],
        }
    }

    /// Load a program starting at address 0.
    ///
    /// Rejects programs longer than 256 instructions; the loader must never
    /// silently truncate.
    pub fn load(&mut self, program: &[Instr]) -> Result<(), LoadError> {
        if program.len() > MEMORY_SIZE {
            return Err(LoadError::ProgramTooLarge {
                size: program.len(),
                capacity: MEMORY_SIZE,
            });
        }
        for (i, &instr) in program.iter().enumerate() {
            self.cells[i] = instr;
        }
        Ok(())
    }

    /// Fetch the instruction at an 8-bit address.
    #[inline]
    pub fn fetch(&self, addr: u8) -> Instr {
        self.cells[addr as usize]
    }

    /// Reset every slot back to NOP.
    pub fn clear(&mut self) {
        self.cells.fill(Instr::NOP);
    }
}

/// Data memory: 256 eight-bit cells, zeroed at power-on.
#[derive(Clone, Serialize, Deserialize)]
pub struct DataMem {
    cells: Vec<u8>,
}

impl DataMem {
    /// Create a zeroed data memory.
    pub fn new() -> Self {
        Self {
            cells: vec![0; MEMORY_SIZE],
        }
    }

    /// Read the cell at an 8-bit address.
    #[inline]
    pub fn read(&self, addr: u8) -> u8 {
        self.cells[addr as usize]
    }

    /// Write the cell at an 8-bit address.
    #[inline]
    pub fn write(&mut self, addr: u8, value: u8) {
        self.cells[addr as usize] = value;
    }

    /// Zero all cells.
    pub fn clear(&mut self) {
        self.cells.fill(0);
    }

    /// The full 256-byte contents, for snapshots and debugging.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }
}

impl Default for InstrMem {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for DataMem {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InstrMem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let loaded = self.cells.iter().filter(|i| **i != Instr::NOP).count();
        f.debug_struct("InstrMem")
            .field("non_nop_slots", &loaded)
            .field("capacity", &MEMORY_SIZE)
            .finish()
    }
}

impl std::fmt::Debug for DataMem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|c| **c != 0).count();
        f.debug_struct("DataMem")
            .field("non_zero_cells", &non_zero)
            .field("capacity", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("program size {size} exceeds instruction memory capacity {capacity}")]
    ProgramTooLarge { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Opcode;

    #[test]
    fn test_data_memory_read_write() {
        let mut mem = DataMem::new();
        assert_eq!(mem.read(10), 0);
        mem.write(10, 42);
        assert_eq!(mem.read(10), 42);
        mem.write(255, 7);
        assert_eq!(mem.read(255), 7);
    }

    #[test]
    fn test_data_memory_starts_zeroed() {
        let mem = DataMem::new();
        assert!(mem.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_load_program() {
        let mut mem = InstrMem::new();
        let program = vec![
            Instr::new(Opcode::Ldi, 10),
            Instr::new(Opcode::St, 0),
        ];
        mem.load(&program).unwrap();
        assert_eq!(mem.fetch(0), program[0]);
        assert_eq!(mem.fetch(1), program[1]);
        // Unloaded slots read as NOP
        assert_eq!(mem.fetch(2), Instr::NOP);
    }

    #[test]
    fn test_load_rejects_oversized_program() {
        let mut mem = InstrMem::new();
        let program = vec![Instr::NOP; MEMORY_SIZE + 1];
        let err = mem.load(&program).unwrap_err();
        assert_eq!(
            err,
            LoadError::ProgramTooLarge { size: 257, capacity: 256 }
        );
    }

    #[test]
    fn test_load_at_full_capacity() {
        let mut mem = InstrMem::new();
        let program = vec![Instr::new(Opcode::And, 1); MEMORY_SIZE];
        assert!(mem.load(&program).is_ok());
        assert_eq!(mem.fetch(255), Instr::new(Opcode::And, 1));
    }
}
