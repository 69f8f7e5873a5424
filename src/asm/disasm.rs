//! Disassembler: converts encoded instructions back to readable assembly.

use crate::cpu::decode::{decode, Instr, Opcode};

/// Disassemble a single encoded word to text.
pub fn disassemble_word(word: u16) -> String {
    match decode(word) {
        Ok(instr) => disassemble_instruction(instr),
        Err(_) => format!("??? ; {:#06x}", word),
    }
}

/// Format a decoded instruction as assembly text.
pub fn disassemble_instruction(instr: Instr) -> String {
    match instr.op {
        // NOP carries no meaningful operand
        Opcode::Nop if instr.operand == 0 => "NOP".to_string(),
        _ => format!("{} {}", instr.op.mnemonic(), instr.operand),
    }
}

/// Disassemble a program listing, one instruction per line with addresses.
pub fn disassemble(program: &[Instr]) -> String {
    let mut output = String::new();
    for (addr, instr) in program.iter().enumerate() {
        output.push_str(&format!(
            "{:03}: {:<8} ; {:011b}\n",
            addr,
            disassemble_instruction(*instr),
            instr.encode()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_instruction() {
        assert_eq!(
            disassemble_instruction(Instr::new(Opcode::Ldi, 10)),
            "LDI 10"
        );
        assert_eq!(disassemble_instruction(Instr::new(Opcode::Nop, 0)), "NOP");
        assert_eq!(
            disassemble_instruction(Instr::new(Opcode::Jmp, 254)),
            "JMP 254"
        );
    }

    #[test]
    fn test_disassemble_invalid_word() {
        let text = disassemble_word(0x0900);
        assert!(text.starts_with("???"));
    }

    #[test]
    fn test_disassemble_listing() {
        let program = [Instr::new(Opcode::Ldi, 10), Instr::new(Opcode::St, 0)];
        let listing = disassemble(&program);
        assert!(listing.contains("000: LDI 10"));
        assert!(listing.contains("001: ST 0"));
    }
}
