//! CPU emulation for the RISC-AR5.
//!
//! This module implements the complete RISC-AR5 architecture:
//! - 256 eight-bit memory cells, big-endian
//! - 8 general purpose registers (R0-R7), accumulator, IR, PC and a 4-bit status register
//! - 20-instruction set with 16-bit instruction words and four addressing modes
//! - memory-mapped input (2 cells) and output (4 cells) channels

pub mod memory;
pub mod registers;
pub mod decode;
pub mod alu;
pub mod io;
pub mod execute;

pub use memory::{Memory, MemoryError};
pub use registers::{Flag, Register, Registers, StatusRegister};
pub use decode::{AddressingMode, Instruction, Opcode};
pub use io::IoChannel;
pub use execute::{CpuState, Processor};

/// Width of the accumulator, PC and general purpose registers.
pub const REGISTER_WIDTH: u32 = 8;

/// Width of an instruction word and of the instruction register.
pub const IR_SIZE: u32 = 16;

/// Number of general purpose registers.
pub const NUMBER_OF_GPR: usize = 8;

/// Number of memory cells.
pub const MEMORY_SIZE: usize = 256;

/// Width of a memory cell.
pub const MEMORY_CELL_SIZE: u32 = 8;

/// Bytes the PC moves per fetched instruction.
pub const PC_INCREMENT: i32 = 2;

/// Width of the opcode field at the top of an instruction word.
pub const OPCODE_SIZE: u32 = 5;

/// First memory cell mirrored from the input channel.
pub const INPUT_ADDR: usize = 250;

/// Characters held by the input channel.
pub const INPUT_SIZE: usize = 2;

/// First memory cell mirrored into the output channel.
///
/// Output cells are read as unsigned bytes and shown as the Latin-1
/// character with that code: `0x41` is `'A'`, `-1` (`0xFF`) is `'ÿ'`.
pub const OUTPUT_ADDR: usize = 252;

/// Characters held by the output channel.
pub const OUTPUT_SIZE: usize = 4;
