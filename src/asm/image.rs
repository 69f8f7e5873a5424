//! ROM image file format for assembled programs.
//!
//! A `.rom` file is plain text:
//! - One 11-bit instruction word per line, written as 3 opcode bits, an
//!   underscore, and 8 operand bits (e.g. `010_00001010` for `LDI 10`)
//! - Lines starting with `;` are comments
//! - Blank lines are ignored

use crate::cpu::decode::{decode, Instr};
use crate::cpu::memory::MEMORY_SIZE;
use crate::asm::disasm::disassemble_instruction;
use std::path::Path;
use std::io::{BufRead, BufReader, Write};
use thiserror::Error;

/// A loaded ROM image.
#[derive(Debug, Clone)]
pub struct RomImage {
    /// The program instructions.
    pub instructions: Vec<Instr>,
    /// Original source lines (for listings and diagnostics).
    pub source_lines: Vec<String>,
}

impl RomImage {
    /// Create an empty image.
    pub fn new() -> Self {
        Self {
            instructions: Vec::new(),
            source_lines: Vec::new(),
        }
    }

    /// Build an image from assembled instructions.
    pub fn from_instructions(instructions: &[Instr]) -> Self {
        Self {
            instructions: instructions.to_vec(),
            source_lines: instructions
                .iter()
                .map(|i| disassemble_instruction(*i))
                .collect(),
        }
    }

    /// Add an instruction with its source line.
    pub fn push(&mut self, instr: Instr, source: &str) {
        self.instructions.push(instr);
        self.source_lines.push(source.to_string());
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl Default for RomImage {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a ROM image from disk.
///
/// Rejects malformed words (wrong bit count) and programs longer than 256
/// instructions; a bad image never reaches the core.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<RomImage, ImageError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ImageError::Io(e.to_string()))?;
    let reader = BufReader::new(file);

    let mut image = RomImage::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| ImageError::Io(e.to_string()))?;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        // The word is everything before any trailing comment; underscores
        // are formatting only.
        let word_text = match trimmed.find(';') {
            Some(idx) => trimmed[..idx].trim(),
            None => trimmed,
        };
        let bits: String = word_text.chars().filter(|c| *c != '_').collect();

        if bits.len() != 11 || !bits.chars().all(|c| c == '0' || c == '1') {
            return Err(ImageError::Parse {
                line: line_num + 1,
                message: format!("expected 11 binary digits, found `{}`", word_text),
            });
        }

        // Infallible for 11 parsed digits, but kept on the Result path
        let word = u16::from_str_radix(&bits, 2).map_err(|e| ImageError::Parse {
            line: line_num + 1,
            message: e.to_string(),
        })?;
        let instr = decode(word).map_err(|e| ImageError::Parse {
            line: line_num + 1,
            message: e.to_string(),
        })?;

        if image.len() >= MEMORY_SIZE {
            return Err(ImageError::TooManyWords { capacity: MEMORY_SIZE });
        }
        image.push(instr, trimmed);
    }

    Ok(image)
}

/// Save a ROM image to disk.
pub fn save_rom<P: AsRef<Path>>(path: P, image: &RomImage) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::Io(e.to_string()))?;

    writeln!(file, "; harv8 ROM image").map_err(|e| ImageError::Io(e.to_string()))?;
    writeln!(file, "; {} instructions", image.len()).map_err(|e| ImageError::Io(e.to_string()))?;
    writeln!(file).map_err(|e| ImageError::Io(e.to_string()))?;

    for (addr, instr) in image.instructions.iter().enumerate() {
        let word = instr.encode();
        writeln!(
            file,
            "{:03b}_{:08b} ; {:03}: {}",
            word >> 8,
            word & 0xFF,
            addr,
            disassemble_instruction(*instr)
        )
        .map_err(|e| ImageError::Io(e.to_string()))?;
    }

    Ok(())
}

/// Errors that can occur during ROM image operations.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("image exceeds instruction memory capacity {capacity}")]
    TooManyWords { capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::decode::Opcode;

    #[test]
    fn test_image_from_instructions() {
        let program = [Instr::new(Opcode::Ldi, 10), Instr::new(Opcode::St, 0)];
        let image = RomImage::from_instructions(&program);
        assert_eq!(image.len(), 2);
        assert_eq!(image.source_lines[0], "LDI 10");
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = std::env::temp_dir();
        let path = dir.join("harv8_image_roundtrip.rom");

        let program = [
            Instr::new(Opcode::Ldi, 10),
            Instr::new(Opcode::St, 0),
            Instr::new(Opcode::Jmp, 0xFE),
        ];
        let image = RomImage::from_instructions(&program);
        save_rom(&path, &image).unwrap();

        let loaded = load_rom(&path).unwrap();
        assert_eq!(loaded.instructions, program.to_vec());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_malformed_words() {
        let dir = std::env::temp_dir();
        let path = dir.join("harv8_image_malformed.rom");
        std::fs::write(&path, "010_0000101\n").unwrap(); // 10 bits

        let err = load_rom(&path).unwrap_err();
        assert!(matches!(err, ImageError::Parse { line: 1, .. }));

        std::fs::remove_file(&path).ok();
    }
}
