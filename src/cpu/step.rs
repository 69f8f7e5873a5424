//! Clock-driven execution engine.
//!
//! Each cycle is two half-cycles. On the falling edge the data memory is
//! accessed on behalf of the instruction latched on the previous rising
//! edge: ST writes the accumulator, every other opcode reads the addressed
//! cell into `memory_op` (even when the value goes unused). On the rising
//! edge the pointer advances (or jumps), the next instruction is fetched,
//! and the retiring instruction's ALU effect commits. Memory access thus
//! lags fetch by half a cycle, which is why the two phases cannot be fused.

use crate::cpu::{InstrMem, DataMem, Registers, LoadError};
use crate::cpu::decode::{Instr, Opcode};
use serde::{Serialize, Deserialize};

/// The processor core: registers, both memories, and the output port.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// Register file.
    pub regs: Registers,
    /// Instruction memory (read-only during execution).
    pub imem: InstrMem,
    /// Data memory.
    pub dmem: DataMem,
    /// Output port: latched only when ST with operand 0 retires.
    pub out_port: u8,
    /// Current clock level, for the edge-detecting driver interface.
    clock: bool,
    /// Completed cycles (rising edges seen).
    pub cycles: u64,
}

impl Cpu {
    /// Create a powered-on core: zeroed memories, `ip` at 0xFF, clock high.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            imem: InstrMem::new(),
            dmem: DataMem::new(),
            out_port: 0,
            clock: true,
            cycles: 0,
        }
    }

    /// Reset to the power-on state. Instruction memory is cleared too, so
    /// a program must be reloaded afterwards.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.imem.clear();
        self.dmem.clear();
        self.out_port = 0;
        self.clock = true;
        self.cycles = 0;
    }

    /// Load a program into instruction memory, starting at address 0.
    ///
    /// Must be called before the first clock transition; the core never
    /// re-reads the program source afterwards.
    pub fn load_program(&mut self, program: &[Instr]) -> Result<(), LoadError> {
        self.imem.load(program)
    }

    /// The data address the latched instruction will access: operand plus
    /// memory-index register, wrapping at 8 bits.
    pub fn data_addr(&self) -> u8 {
        self.regs.ir.operand.wrapping_add(self.regs.mem_index)
    }

    /// Drive the clock to `level`. A changed level triggers the matching
    /// half-cycle; a repeated level is a no-op.
    pub fn set_clock(&mut self, level: bool) {
        if level == self.clock {
            return;
        }
        self.clock = level;
        if level {
            self.rising_edge();
        } else {
            self.falling_edge();
        }
    }

    /// The current clock level.
    pub fn clock(&self) -> bool {
        self.clock
    }

    /// Run one full cycle: falling edge, then rising edge.
    pub fn step(&mut self) {
        self.set_clock(false);
        self.set_clock(true);
    }

    /// Run a fixed number of full cycles (the reference-harness driver).
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.step();
        }
    }

    /// Falling edge: the memory phase for the already-latched instruction.
    /// Exactly one memory action per cycle; ST never reads, everything
    /// else always reads.
    fn falling_edge(&mut self) {
        let addr = self.data_addr();
        if self.regs.ir.op == Opcode::St {
            self.dmem.write(addr, self.regs.acc);
        } else {
            self.regs.memory_op = self.dmem.read(addr);
        }
    }

    /// Rising edge: pointer update, fetch, index update, ALU commit.
    ///
    /// All next-values are computed from a pre-edge snapshot and committed
    /// together; nothing here may observe another sub-step's output.
    fn rising_edge(&mut self) {
        let ir = self.regs.ir;
        let acc = self.regs.acc;
        let memory_op = self.regs.memory_op;

        // Jump is taken only when the retiring instruction is JMP and the
        // accumulator is negative (bit 7 set) at this edge.
        let ip_next = if ir.op == Opcode::Jmp && acc & 0x80 != 0 {
            ir.operand
        } else {
            self.regs.ip.wrapping_add(1)
        };

        // Fetch and pointer update happen together; there is no fetch lag.
        self.regs.ip = ip_next;
        self.regs.ir = self.imem.fetch(ip_next);

        // The index decays unless the retiring instruction refreshes it.
        self.regs.mem_index = if ir.op == Opcode::Idx { memory_op } else { 0 };

        self.regs.acc = match ir.op {
            Opcode::Add => acc.wrapping_add(memory_op),
            Opcode::Sub => acc.wrapping_sub(memory_op),
            Opcode::Ldi => ir.operand,
            Opcode::And => acc & memory_op,
            Opcode::St | Opcode::Jmp | Opcode::Idx | Opcode::Nop => acc,
        };

        // ST with operand 0 doubles as the output instruction.
        if ir.op == Opcode::St && ir.operand == 0 {
            self.out_port = self.regs.acc;
        }

        self.cycles += 1;
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .field("out_port", &self.out_port)
            .finish()
    }
}


#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    fn any_instr() -> impl Strategy<Value = Instr> {
        (0u8..8, any::<u8>()).prop_map(|(op, operand)| Instr::new(Opcode::from_bits(op), operand))
    }

    /// Drive a two-instruction program `LDI a; <op> 1` with dmem[1] = m and
    /// return the final accumulator.
    fn alu_result(op: Opcode, a: u8, m: u8) -> u8 {
        let mut cpu = Cpu::new();
        cpu.load_program(&[Instr::new(Opcode::Ldi, a), Instr::new(op, 1)])
            .unwrap();
        cpu.dmem.write(1, m);
        cpu.run(3);
        cpu.regs.acc
    }

    proptest! {
        #[test]
        fn add_is_wrapping(a: u8, m: u8) {
            prop_assert_eq!(alu_result(Opcode::Add, a, m), a.wrapping_add(m));
        }

        #[test]
        fn sub_is_wrapping(a: u8, m: u8) {
            prop_assert_eq!(alu_result(Opcode::Sub, a, m), a.wrapping_sub(m));
        }

        #[test]
        fn and_is_bitwise(a: u8, m: u8) {
            prop_assert_eq!(alu_result(Opcode::And, a, m), a & m);
        }

        #[test]
        fn jmp_taken_iff_sign_bit(a: u8, target: u8) {
            let mut cpu = Cpu::new();
            cpu.load_program(&[
                Instr::new(Opcode::Ldi, a),
                Instr::new(Opcode::Jmp, target),
            ]).unwrap();
            cpu.run(3);
            let expected = if a & 0x80 != 0 { target } else { 2 };
            prop_assert_eq!(cpu.regs.ip, expected);
        }

        #[test]
        fn identical_runs_are_identical(
            program in proptest::collection::vec(any_instr(), 1..32),
            cycles in 0u64..200,
        ) {
            let mut a = Cpu::new();
            let mut b = Cpu::new();
            a.load_program(&program).unwrap();
            b.load_program(&program).unwrap();
            a.run(cycles);
            b.run(cycles);
            prop_assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            );
        }
    }
}
