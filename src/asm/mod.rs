//! Assembly tooling: text assembler, disassembler, and the `.rom` image
//! file format.

pub mod assembler;
pub mod disasm;
pub mod image;

pub use assembler::{assemble, AssemblerError};
pub use disasm::{disassemble, disassemble_instruction};
pub use image::{RomImage, ImageError, load_rom, save_rom};
