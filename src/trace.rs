//! Waveform tracing.
//!
//! A minimal VCD (Value Change Dump) writer that samples the core's
//! externally meaningful signals each half-cycle. The output opens in any
//! waveform viewer (GTKWave and friends), mirroring what the hardware
//! test harness for this machine dumped.

use crate::cpu::Cpu;
use std::io::{self, Write};

/// One sample of every traced signal.
#[derive(Clone, Copy, PartialEq, Eq)]
struct Sample {
    clk: bool,
    ip: u8,
    ir: u16,
    acc: u8,
    mem_index: u8,
    memory_op: u8,
    out_port: u8,
}

impl Sample {
    fn capture(cpu: &Cpu) -> Self {
        Self {
            clk: cpu.clock(),
            ip: cpu.regs.ip,
            ir: cpu.regs.ir.encode(),
            acc: cpu.regs.acc,
            mem_index: cpu.regs.mem_index,
            memory_op: cpu.regs.memory_op,
            out_port: cpu.out_port,
        }
    }
}

/// Streams core state changes to a VCD file.
pub struct VcdTracer<W: Write> {
    out: W,
    last: Option<Sample>,
}

impl<W: Write> VcdTracer<W> {
    /// Write the VCD header and return the tracer.
    pub fn new(mut out: W) -> io::Result<Self> {
        writeln!(out, "$timescale 1ns $end")?;
        writeln!(out, "$scope module harv8 $end")?;
        writeln!(out, "$var wire 1 c clk $end")?;
        writeln!(out, "$var wire 8 i ip $end")?;
        writeln!(out, "$var wire 11 r ir $end")?;
        writeln!(out, "$var wire 8 a acc $end")?;
        writeln!(out, "$var wire 8 x mem_index $end")?;
        writeln!(out, "$var wire 8 m memory_op $end")?;
        writeln!(out, "$var wire 8 o out_port $end")?;
        writeln!(out, "$upscope $end")?;
        writeln!(out, "$enddefinitions $end")?;
        Ok(Self { out, last: None })
    }

    /// Record the core's signals at the given timestamp. Only changed
    /// signals are emitted, per the VCD convention.
    pub fn sample(&mut self, time: u64, cpu: &Cpu) -> io::Result<()> {
        let now = Sample::capture(cpu);
        let prev = self.last;

        if prev == Some(now) {
            return Ok(());
        }

        writeln!(self.out, "#{}", time)?;
        let changed = |get: fn(&Sample) -> u16| prev.map_or(true, |p| get(&p) != get(&now));

        if changed(|s| s.clk as u16) {
            writeln!(self.out, "{}c", if now.clk { 1 } else { 0 })?;
        }
        if changed(|s| s.ip as u16) {
            writeln!(self.out, "b{:08b} i", now.ip)?;
        }
        if changed(|s| s.ir) {
            writeln!(self.out, "b{:011b} r", now.ir)?;
        }
        if changed(|s| s.acc as u16) {
            writeln!(self.out, "b{:08b} a", now.acc)?;
        }
        if changed(|s| s.mem_index as u16) {
            writeln!(self.out, "b{:08b} x", now.mem_index)?;
        }
        if changed(|s| s.memory_op as u16) {
            writeln!(self.out, "b{:08b} m", now.memory_op)?;
        }
        if changed(|s| s.out_port as u16) {
            writeln!(self.out, "b{:08b} o", now.out_port)?;
        }

        self.last = Some(now);
        Ok(())
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Run a program for `cycles` full cycles, tracing every half-cycle.
pub fn trace_run<W: Write>(cpu: &mut Cpu, cycles: u64, out: W) -> io::Result<W> {
    let mut tracer = VcdTracer::new(out)?;
    let mut time = 0;
    tracer.sample(time, cpu)?;
    for _ in 0..cycles {
        cpu.set_clock(false);
        time += 1;
        tracer.sample(time, cpu)?;
        cpu.set_clock(true);
        time += 1;
        tracer.sample(time, cpu)?;
    }
    tracer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::{Instr, Opcode};

    #[test]
    fn test_vcd_header_and_samples() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[Instr::new(Opcode::Ldi, 10), Instr::new(Opcode::St, 0)])
            .unwrap();

        let out = trace_run(&mut cpu, 3, Vec::new()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("$enddefinitions $end"));
        assert!(text.contains("$var wire 11 r ir $end"));
        // Initial sample at time 0, then per-edge timestamps
        assert!(text.contains("#0"));
        assert!(text.contains("#1"));
        // The LDI must show up on acc at some point
        assert!(text.contains("b00001010 a"));
    }

    #[test]
    fn test_unchanged_signals_not_reemitted() {
        let mut cpu = Cpu::new();
        let mut tracer = VcdTracer::new(Vec::new()).unwrap();
        tracer.sample(0, &cpu).unwrap();
        cpu.step(); // NOP retires, acc stays 0
        tracer.sample(1, &cpu).unwrap();

        let text = String::from_utf8(tracer.finish().unwrap()).unwrap();
        let acc_lines = text.lines().filter(|l| l.ends_with(" a")).count();
        assert_eq!(acc_lines, 1);
    }
}
