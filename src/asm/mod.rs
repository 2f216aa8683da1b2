//! Assembler and disassembler for RISC-AR5 programs.
//!
//! This module provides:
//! - An assembler (text → instruction words) driven by an immutable mnemonic table
//! - A disassembler (instruction words → readable text)
//! - Loading and saving of machine-code files

pub mod isa;
pub mod modes;
pub mod assembler;
pub mod disasm;
pub mod hexfile;

pub use isa::{InstructionEntry, InstructionSet};
pub use modes::EncodeError;
pub use assembler::{assemble, Assembler, AssemblerError};
pub use disasm::{disassemble, disassemble_instruction};
pub use hexfile::{load_hex, parse_hex, save_hex, HexFile, HexFileError, FILE_INSTRUCTION_LIMIT};
