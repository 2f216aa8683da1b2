//! # RISC-AR5 Emulator
//!
//! An emulator and assembler for the RISC-AR5, an 8-bit teaching processor
//! with 16-bit instruction words.
//!
//! The machine has 256 bytes of memory, eight general purpose registers, an
//! accumulator and a 4-bit status register. Programs are loaded either from
//! assembly text or from machine-code files of hexadecimal words, and talk
//! to the outside world through two memory-mapped character channels.

pub mod bits;
pub mod cpu;
pub mod asm;

// Re-export commonly used types
pub use cpu::{CpuState, Instruction, Memory, MemoryError, Processor, Registers};
pub use asm::{assemble, disassemble, load_hex, save_hex, AssemblerError, HexFile, InstructionSet};
