//! Disassembler for RISC-AR5 programs.
//!
//! Converts instruction words back to assembler syntax.

use crate::cpu::{AddressingMode, Instruction, PC_INCREMENT};

/// Disassemble a single instruction to text.
///
/// Words with an undefined opcode render as `???`.
pub fn disassemble_instruction(instr: &Instruction) -> String {
    let Some(op) = instr.op() else {
        return "???".to_string();
    };

    match op.mode() {
        AddressingMode::Implicit => op.mnemonic().to_string(),
        AddressingMode::RegisterDirect => format!("{} {}", op, instr.register_index()),
        AddressingMode::Direct | AddressingMode::Immediate => {
            format!("{} {}", op, instr.constant())
        }
    }
}

/// Disassemble a program as a listing of `address: word  text` lines.
pub fn disassemble(instructions: &[Instruction]) -> String {
    let mut output = String::new();
    output.push_str("; RISC-AR5 disassembly\n");
    output.push_str("; ---------------------\n");

    for (i, instr) in instructions.iter().enumerate() {
        let addr = i * PC_INCREMENT as usize;
        let line = disassemble_instruction(instr);
        output.push_str(&format!("{:03}: {}  {}\n", addr, instr.to_hex(), line));
    }

    output
}
