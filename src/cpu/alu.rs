//! Arithmetic/logic unit and flag rules.
//!
//! Every operation is a pure function of the accumulator, its operand and
//! (for ADDC/RLC/RRC) the incoming carry. It returns an [`Outcome`]: the new
//! 8-bit accumulator value plus the flag update that operation prescribes.
//! Flags an operation leaves alone are `None`.

use crate::bits;
use crate::cpu::{Flag, StatusRegister, REGISTER_WIDTH};

/// Result of one ALU operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// New accumulator value, in `-128..=127`.
    pub result: i32,
    pub zero: bool,
    pub negative: bool,
    pub carry: Option<bool>,
    pub overflow: Option<bool>,
}

impl Outcome {
    /// Write this outcome's flags into `sr`.
    pub fn apply(&self, sr: &mut StatusRegister) {
        sr.set_flag(Flag::Zero, self.zero);
        sr.set_flag(Flag::Negative, self.negative);
        if let Some(carry) = self.carry {
            sr.set_flag(Flag::Carry, carry);
        }
        if let Some(overflow) = self.overflow {
            sr.set_flag(Flag::Overflow, overflow);
        }
    }

    /// Z and N from `result`, with C and V forced clear.
    fn cleared(result: i32) -> Self {
        Self::with(result, Some(false), Some(false))
    }

    fn with(result: i32, carry: Option<bool>, overflow: Option<bool>) -> Self {
        let result = to_byte(result);
        Self {
            result,
            zero: result == 0,
            negative: is_negative(result),
            carry,
            overflow,
        }
    }
}

/// Reinterpret the low 8 bits of `value` as a signed byte.
#[inline]
pub fn to_byte(value: i32) -> i32 {
    value as i8 as i32
}

#[inline]
fn is_negative(value: i32) -> bool {
    bits::msb(value, REGISTER_WIDTH) == 1
}

/// Two operands of equal sign producing a result of the other sign.
fn signed_overflow(acc: i32, op: i32, result: i32) -> bool {
    let (a, o, r) = (is_negative(acc), is_negative(op), is_negative(result));
    a == o && r != a
}

/// AND: A := A and op
pub fn and(acc: i32, op: i32) -> Outcome {
    Outcome::cleared(acc & op)
}

/// OR: A := A or op
pub fn or(acc: i32, op: i32) -> Outcome {
    Outcome::cleared(acc | op)
}

/// ADDC: A := A + op + C
///
/// C is the ninth bit of the unsigned sum; V is set when two operands of the
/// same sign produce a result of the other sign.
pub fn addc(acc: i32, op: i32, carry_in: bool) -> Outcome {
    let c = i32::from(carry_in);
    let result = to_byte(acc + op + c);

    let unsigned_sum = bits::unsigned_bits(acc, 0, 7, 8) + bits::unsigned_bits(op, 0, 7, 8) + c as u32;
    let carry = bits::msb(unsigned_sum as i32, 9) == 1;

    Outcome::with(result, Some(carry), Some(signed_overflow(acc, op, result)))
}

/// SUB: A := A - op
///
/// C is a borrow (`acc < op`, signed). V uses the same operand-sign rule as
/// ADDC, applied to `acc` and `op`.
pub fn sub(acc: i32, op: i32) -> Outcome {
    let result = to_byte(acc - op);
    Outcome::with(result, Some(acc < op), Some(signed_overflow(acc, op, result)))
}

/// MUL: A := A[3..0] * op[3..0]
///
/// Unsigned 4x4-bit product; the 8-bit result is read back as signed.
pub fn mul(acc: i32, op: i32) -> Outcome {
    Outcome::cleared((acc & 0x0F) * (op & 0x0F))
}

/// NOT: A := one's complement of A
pub fn not(acc: i32) -> Outcome {
    Outcome::cleared(!acc)
}

/// NEG: A := two's complement of A
pub fn neg(acc: i32) -> Outcome {
    Outcome::cleared((!acc).wrapping_add(1))
}

/// RLC: A := A[6..0] C, C := A[7]
pub fn rlc(acc: i32, carry_in: bool) -> Outcome {
    let result = ((acc << 1) + i32::from(carry_in)) & 0xFF;
    let carry = bits::msb(acc, REGISTER_WIDTH) == 1;
    Outcome::with(result, Some(carry), Some(false))
}

/// RRC: A := C A[7..1], C := A[0]
pub fn rrc(acc: i32, carry_in: bool) -> Outcome {
    let value = bits::unsigned_bits(acc, 0, 7, REGISTER_WIDTH) as i32;
    let result = ((value >> 1) + (i32::from(carry_in) << 7)) & 0xFF;
    let carry = bits::lsb(value) == 1;
    Outcome::with(result, Some(carry), Some(false))
}

/// LDAR / LDAA / LDAI: A := value
///
/// Z and N describe the loaded value; C and V are untouched.
pub fn load(value: i32) -> Outcome {
    Outcome::with(value, None, None)
}
