//! Simple assembler for the 8-instruction set.
//!
//! Syntax:
//! ```text
//! ; Comment
//! LOOP:           ; Define a label
//!     LDI 10      ; Load immediate 10
//!     ST 0        ; Store to data address 0 (also drives the output port)
//!     SUB 1
//!     JMP LOOP    ; Taken when the accumulator is negative
//! ```
//!
//! Operands are decimal, `0x` hex, `0b` binary, or a label. An omitted
//! operand assembles as 0.

use crate::cpu::decode::{Instr, Opcode};
use crate::cpu::memory::MEMORY_SIZE;
use std::collections::HashMap;
use thiserror::Error;

/// Assemble source text to a list of instructions.
pub fn assemble(source: &str) -> Result<Vec<Instr>, AssemblerError> {
    let mut asm = Assembler::new();
    asm.assemble(source)
}

/// The assembler state.
struct Assembler {
    /// Symbol table (label -> instruction address).
    symbols: HashMap<String, u8>,
    /// Unresolved label operands: (output index, label, source line).
    pending: Vec<(usize, String, usize)>,
    /// Output instructions.
    output: Vec<Instr>,
}

impl Assembler {
    fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            pending: Vec::new(),
            output: Vec::new(),
        }
    }

    fn assemble(&mut self, source: &str) -> Result<Vec<Instr>, AssemblerError> {
        // Pass 1: collect labels and generate code
        for (line_num, line) in source.lines().enumerate() {
            self.process_line(line, line_num + 1)?;
        }

        // Pass 2: resolve forward references
        self.resolve_references()?;

        Ok(self.output.clone())
    }

    fn process_line(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let line = line.trim();

        if line.is_empty() || line.starts_with(';') {
            return Ok(());
        }

        // Remove inline comments
        let line = match line.find(';') {
            Some(idx) => line[..idx].trim(),
            None => line,
        };

        if line.is_empty() {
            return Ok(());
        }

        // Check for label definition
        if let Some(colon_idx) = line.find(':') {
            let label = line[..colon_idx].trim().to_uppercase();
            if !label.is_empty() {
                let addr = self.current_addr(line_num)?;
                if self.symbols.insert(label.clone(), addr).is_some() {
                    return Err(AssemblerError::DuplicateLabel { line: line_num, label });
                }
            }

            let rest = line[colon_idx + 1..].trim();
            if !rest.is_empty() {
                return self.process_instruction(rest, line_num);
            }
            return Ok(());
        }

        self.process_instruction(line, line_num)
    }

    fn process_instruction(&mut self, line: &str, line_num: usize) -> Result<(), AssemblerError> {
        let mut parts = line.split_whitespace();
        let mnemonic = match parts.next() {
            Some(m) => m.to_uppercase(),
            None => return Ok(()),
        };
        let operand_text = parts.next();
        if let Some(extra) = parts.next() {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("unexpected token `{}`", extra),
            });
        }

        let op = match mnemonic.as_str() {
            "ADD" => Opcode::Add,
            "SUB" => Opcode::Sub,
            "LDI" => Opcode::Ldi,
            "ST" => Opcode::St,
            "JMP" => Opcode::Jmp,
            "IDX" => Opcode::Idx,
            "AND" => Opcode::And,
            "NOP" => Opcode::Nop,
            _ => {
                return Err(AssemblerError::UnknownMnemonic {
                    line: line_num,
                    mnemonic,
                })
            }
        };

        let operand = match operand_text {
            Some(text) => self.parse_operand(text, line_num)?,
            None => 0,
        };

        self.emit(Instr::new(op, operand), line_num)
    }

    /// Parse an operand: a numeric literal, or a label reference resolved
    /// in pass 2 (emitted as 0 for now).
    fn parse_operand(&mut self, text: &str, line_num: usize) -> Result<u8, AssemblerError> {
        let text = text.trim();

        let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(u32::from_str_radix(hex, 16).map_err(|_| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid hex literal `{}`", text),
            })?)
        } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
            Some(u32::from_str_radix(bin, 2).map_err(|_| AssemblerError::SyntaxError {
                line: line_num,
                message: format!("invalid binary literal `{}`", text),
            })?)
        } else {
            text.parse::<u32>().ok()
        };

        if let Some(value) = parsed {
            if value > 0xFF {
                return Err(AssemblerError::ValueOutOfRange { line: line_num, value });
            }
            return Ok(value as u8);
        }

        // A label reference: record for pass 2
        self.pending
            .push((self.output.len(), text.to_uppercase(), line_num));
        Ok(0)
    }

    fn emit(&mut self, instr: Instr, line_num: usize) -> Result<(), AssemblerError> {
        if self.output.len() >= MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge { line: line_num });
        }
        self.output.push(instr);
        Ok(())
    }

    fn current_addr(&self, line_num: usize) -> Result<u8, AssemblerError> {
        if self.output.len() >= MEMORY_SIZE {
            return Err(AssemblerError::ProgramTooLarge { line: line_num });
        }
        Ok(self.output.len() as u8)
    }

    fn resolve_references(&mut self) -> Result<(), AssemblerError> {
        for (out_idx, label, line_num) in &self.pending {
            let addr = self
                .symbols
                .get(label)
                .ok_or_else(|| AssemblerError::UndefinedLabel {
                    line: *line_num,
                    label: label.clone(),
                })?;
            self.output[*out_idx].operand = *addr;
        }
        Ok(())
    }
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("undefined label on line {line}: {label}")]
    UndefinedLabel { line: usize, label: String },

    #[error("duplicate label on line {line}: {label}")]
    DuplicateLabel { line: usize, label: String },

    #[error("operand out of range on line {line}: {value} (max 255)")]
    ValueOutOfRange { line: usize, value: u32 },

    #[error("program exceeds 256 instructions at line {line}")]
    ProgramTooLarge { line: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_simple() {
        let source = r#"
            ; The reference program head
            LDI 10
            ST 0
            ADD 0
            ADD 5
            ST 0
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 5);
        assert_eq!(result[0], Instr::new(Opcode::Ldi, 10));
        assert_eq!(result[1], Instr::new(Opcode::St, 0));
        assert_eq!(result[3], Instr::new(Opcode::Add, 5));
    }

    #[test]
    fn test_assemble_with_labels() {
        let source = r#"
        START:
            LDI 1
            JMP END
            NOP
        END:
            JMP START
        "#;

        let result = assemble(source).unwrap();
        assert_eq!(result.len(), 4);
        assert_eq!(result[1], Instr::new(Opcode::Jmp, 3));
        assert_eq!(result[3], Instr::new(Opcode::Jmp, 0));
    }

    #[test]
    fn test_assemble_literals() {
        let result = assemble("LDI 0xFF\nAND 0b1010\nST 20").unwrap();
        assert_eq!(result[0].operand, 255);
        assert_eq!(result[1].operand, 0b1010);
        assert_eq!(result[2].operand, 20);
    }

    #[test]
    fn test_omitted_operand_is_zero() {
        let result = assemble("NOP\nST").unwrap();
        assert_eq!(result[0], Instr::new(Opcode::Nop, 0));
        assert_eq!(result[1], Instr::new(Opcode::St, 0));
    }

    #[test]
    fn test_operand_out_of_range() {
        assert!(matches!(
            assemble("LDI 256"),
            Err(AssemblerError::ValueOutOfRange { value: 256, .. })
        ));
    }

    #[test]
    fn test_unknown_mnemonic() {
        assert!(matches!(
            assemble("MUL 3"),
            Err(AssemblerError::UnknownMnemonic { .. })
        ));
    }

    #[test]
    fn test_undefined_label() {
        assert!(matches!(
            assemble("JMP NOWHERE"),
            Err(AssemblerError::UndefinedLabel { .. })
        ));
    }

    #[test]
    fn test_too_many_instructions() {
        let source = "NOP\n".repeat(257);
        assert!(matches!(
            assemble(&source),
            Err(AssemblerError::ProgramTooLarge { .. })
        ));
    }
}
