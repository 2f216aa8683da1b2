//! Assembler for RISC-AR5 programs.
//!
//! One instruction per line: a mnemonic followed by up to two decimal
//! operands. Mnemonics are case-insensitive and blank lines are rejected.
//! Assembly ends at the first `stop`; later lines are ignored.
//!
//! ```text
//! ldi 20
//! star 1
//! LDA -6
//! addc 1
//! stop
//! ```

use crate::asm::isa::InstructionSet;
use crate::asm::modes::EncodeError;
use crate::bits;
use crate::cpu::Instruction;
use thiserror::Error;
use tracing::{debug, info};

/// Assemble source code with the standard instruction set.
pub fn assemble(source: &str) -> Result<Vec<Instruction>, AssemblerError> {
    let isa = InstructionSet::new();
    Assembler::new(&isa).assemble(source)
}

/// Translates assembly text into instruction words.
pub struct Assembler<'a> {
    isa: &'a InstructionSet,
}

impl<'a> Assembler<'a> {
    pub fn new(isa: &'a InstructionSet) -> Self {
        Self { isa }
    }

    /// Assemble `source`, stopping after the first STOP instruction.
    ///
    /// Any error aborts the whole run; no partial program is returned.
    pub fn assemble(&self, source: &str) -> Result<Vec<Instruction>, AssemblerError> {
        let mut output = Vec::new();

        for (line_num, line) in source.lines().enumerate() {
            let instr = self.assemble_line(line, line_num + 1)?;
            let halt = instr.is_halt();
            output.push(instr);

            if halt {
                debug!(line = line_num + 1, "stop instruction ends assembly");
                break;
            }
        }

        info!(instructions = output.len(), "assembled program");
        Ok(output)
    }

    /// Assemble a single line. `line_num` is only used for error reporting.
    pub fn assemble_line(&self, line: &str, line_num: usize) -> Result<Instruction, AssemblerError> {
        let line = line.trim();
        let parts: Vec<&str> = line.split_whitespace().collect();

        if !is_well_formed(&parts) {
            return Err(AssemblerError::SyntaxError {
                line: line_num,
                message: format!("expected `mnemonic [operand] [operand]`, found `{}`", line),
            });
        }

        let entry = self.isa.get(parts[0]).ok_or_else(|| AssemblerError::UnknownMnemonic {
            line: line_num,
            mnemonic: parts[0].to_string(),
        })?;

        let word = entry
            .mode
            .encode(entry.opcode, &parts[1..])
            .map_err(|source| AssemblerError::Encoding { line: line_num, source })?;

        let hex = bits::to_hex(word, 4);
        let instr = Instruction::from_hex(&hex);
        if !instr.is_valid() {
            return Err(AssemblerError::InvalidEncoding { line: line_num, word: hex });
        }

        debug!(line = line_num, mnemonic = entry.mnemonic, word = %hex, "encoded");
        Ok(instr)
    }
}

/// `mnemonic (ws [-]digits){0,2}`
fn is_well_formed(parts: &[&str]) -> bool {
    let Some((mnemonic, operands)) = parts.split_first() else {
        return false;
    };

    mnemonic.chars().all(|c| c.is_ascii_alphabetic())
        && operands.len() <= 2
        && operands.iter().all(|op| is_decimal(op))
}

fn is_decimal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Errors that can occur during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblerError {
    #[error("syntax error on line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("unknown mnemonic on line {line}: {mnemonic}")]
    UnknownMnemonic { line: usize, mnemonic: String },

    #[error("cannot encode line {line}: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: EncodeError,
    },

    #[error("invalid assembled instruction {word} on line {line}")]
    InvalidEncoding { line: usize, word: String },
}

impl AssemblerError {
    /// 1-based line the error was found on.
    pub fn line(&self) -> usize {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::UnknownMnemonic { line, .. }
            | AssemblerError::Encoding { line, .. }
            | AssemblerError::InvalidEncoding { line, .. } => *line,
        }
    }
}
