//! Per-addressing-mode instruction encoders.
//!
//! Each mode turns an opcode plus its textual operands into a raw 16-bit
//! word. Only the first operand is ever used; implicit instructions ignore
//! theirs.

use crate::bits::{self, BitsError};
use crate::cpu::{AddressingMode, Opcode, IR_SIZE, NUMBER_OF_GPR, OPCODE_SIZE};
use thiserror::Error;

const BYTE_MASK: i32 = 0xFF;
const CONSTANT_WIDTH: u32 = 8;

impl AddressingMode {
    /// Encode `opcode` with `operands` into an instruction word.
    pub fn encode(self, opcode: Opcode, operands: &[&str]) -> Result<i32, EncodeError> {
        let op = shift_opcode(opcode);

        match self {
            AddressingMode::Implicit => Ok(op),
            AddressingMode::RegisterDirect => {
                let reg = parse_operand(opcode, operands)?;
                if !(0..NUMBER_OF_GPR as i64).contains(&reg) {
                    return Err(EncodeError::InvalidRegister(reg));
                }
                Ok(op | (reg as i32) << 8)
            }
            AddressingMode::Direct | AddressingMode::Immediate => {
                let constant = parse_operand(opcode, operands)?;
                bits::check_fits(constant, CONSTANT_WIDTH)?;
                Ok(op | (constant as i32 & BYTE_MASK))
            }
        }
    }
}

#[inline]
fn shift_opcode(opcode: Opcode) -> i32 {
    i32::from(opcode.code()) << (IR_SIZE - OPCODE_SIZE)
}

fn parse_operand(opcode: Opcode, operands: &[&str]) -> Result<i64, EncodeError> {
    let text = operands
        .first()
        .ok_or(EncodeError::MissingOperand(opcode))?;
    text.parse::<i64>()
        .map_err(|_| EncodeError::InvalidOperand(text.to_string()))
}

/// Errors produced while encoding a single instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("{0} requires an operand")]
    MissingOperand(Opcode),

    #[error("invalid register R{0}, expected 0-7")]
    InvalidRegister(i64),

    #[error(transparent)]
    OperandOutOfRange(#[from] BitsError),

    #[error("invalid operand: {0}")]
    InvalidOperand(String),
}
