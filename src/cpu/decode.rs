//! Instruction decoder for the RISC-AR5.
//!
//! An instruction is a 16-bit word. Counting bits from the most significant
//! end, bits 0-4 hold the opcode and the remaining bits depend on the
//! addressing mode:
//!
//! ```text
//!  0    4 5  7 8      15
//! +------+----+--------+
//! |opcode|reg |constant|
//! +------+----+--------+
//! ```
//!
//! Only 20 of the 32 possible opcodes are defined.

use crate::bits;
use crate::cpu::{IR_SIZE, OPCODE_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the bits after the opcode are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressingMode {
    /// No operand.
    Implicit,
    /// Register index in bits 5-7.
    RegisterDirect,
    /// Memory address in bits 8-15.
    Direct,
    /// Constant in bits 8-15.
    Immediate,
}

/// The RISC-AR5 instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    // ==================== Arithmetic / logic ====================

    /// A := A and Rn
    And = 0,
    /// A := A or Rn
    Or = 1,
    /// A := A + Rn + C
    Addc = 3,
    /// A := A - Rn
    Sub = 4,
    /// A := A[3..0] * Rn[3..0]
    Mul = 5,
    /// A := -A
    Neg = 6,
    /// A := not A
    Not = 7,
    /// Rotate A left through carry
    Rlc = 8,
    /// Rotate A right through carry
    Rrc = 9,

    // ==================== Load / store ====================

    /// A := Rn
    Ldar = 10,
    /// Rn := A
    Star = 11,
    /// A := [addr]
    Ldaa = 12,
    /// [addr] := A
    Staa = 13,
    /// A := constant
    Ldai = 14,

    // ==================== Program flow ====================

    /// PC := R7 if Z
    Brz = 16,
    /// PC := R7 if C
    Brc = 17,
    /// PC := R7 if N
    Brn = 18,
    /// PC := R7 if V
    Bro = 19,
    Nop = 24,
    /// Halt the processor
    Stop = 31,
}

impl Opcode {
    /// Every defined opcode, in numeric order.
    pub const ALL: [Opcode; 20] = [
        Opcode::And,
        Opcode::Or,
        Opcode::Addc,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Neg,
        Opcode::Not,
        Opcode::Rlc,
        Opcode::Rrc,
        Opcode::Ldar,
        Opcode::Star,
        Opcode::Ldaa,
        Opcode::Staa,
        Opcode::Ldai,
        Opcode::Brz,
        Opcode::Brc,
        Opcode::Brn,
        Opcode::Bro,
        Opcode::Nop,
        Opcode::Stop,
    ];

    /// The opcode with numeric value `value`, if it is defined.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u8 == value)
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Addressing mode used by this opcode.
    pub const fn mode(self) -> AddressingMode {
        match self {
            Opcode::Neg
            | Opcode::Not
            | Opcode::Rlc
            | Opcode::Rrc
            | Opcode::Brz
            | Opcode::Brc
            | Opcode::Brn
            | Opcode::Bro
            | Opcode::Nop
            | Opcode::Stop => AddressingMode::Implicit,
            Opcode::And
            | Opcode::Or
            | Opcode::Addc
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Ldar
            | Opcode::Star => AddressingMode::RegisterDirect,
            Opcode::Ldaa | Opcode::Staa => AddressingMode::Direct,
            Opcode::Ldai => AddressingMode::Immediate,
        }
    }

    /// Assembly mnemonic, lowercase.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::And => "and",
            Opcode::Or => "or",
            Opcode::Addc => "addc",
            Opcode::Sub => "sub",
            Opcode::Mul => "mul",
            Opcode::Neg => "neg",
            Opcode::Not => "not",
            Opcode::Rlc => "rlc",
            Opcode::Rrc => "rrc",
            Opcode::Ldar => "ldar",
            Opcode::Star => "star",
            Opcode::Ldaa => "lda",
            Opcode::Staa => "sta",
            Opcode::Ldai => "ldi",
            Opcode::Brz => "brz",
            Opcode::Brc => "brc",
            Opcode::Brn => "brn",
            Opcode::Bro => "bro",
            Opcode::Nop => "nop",
            Opcode::Stop => "stop",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Whether `opcode` is one of the 20 defined opcodes:
/// `0, 1, 3..=14, 16..=19, 24, 31`.
pub fn is_legal_opcode(opcode: u32) -> bool {
    u8::try_from(opcode).ok().and_then(Opcode::from_u8).is_some()
}

/// A decoded view over one raw instruction word.
///
/// Construction never fails: a word with an undefined opcode, or text that is
/// not a hexadecimal number, simply yields an instruction whose
/// [`is_valid`](Instruction::is_valid) is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    word: i32,
    valid: bool,
    halt: bool,
    /// Text the instruction was built from (hex line or decimal word).
    source: String,
}

impl Instruction {
    const RADIX: u32 = 16;

    /// Decode a raw word. Only its low 16 bits are significant.
    pub fn new(word: i32) -> Self {
        Self::decode(word, word.to_string())
    }

    /// Decode a hexadecimal word such as `"7014"`.
    pub fn from_hex(text: &str) -> Self {
        match i32::from_str_radix(text, Self::RADIX) {
            Ok(word) => Self::decode(word, text.to_owned()),
            Err(_) => Self {
                word: 0,
                valid: false,
                halt: false,
                source: text.to_owned(),
            },
        }
    }

    fn decode(word: i32, source: String) -> Self {
        let valid = is_legal_opcode(Self::opcode_of(word));
        Self {
            word,
            valid,
            halt: valid && Self::opcode_of(word) == u32::from(Opcode::Stop.code()),
            source,
        }
    }

    #[inline]
    fn opcode_of(word: i32) -> u32 {
        bits::unsigned_bits(word, 0, OPCODE_SIZE - 1, IR_SIZE)
    }

    /// The raw 5-bit opcode field.
    pub fn opcode(&self) -> u8 {
        Self::opcode_of(self.word) as u8
    }

    /// The decoded opcode, if defined.
    pub fn op(&self) -> Option<Opcode> {
        Opcode::from_u8(self.opcode())
    }

    pub fn word(&self) -> i32 {
        self.word
    }

    /// Signed value of bits `start..=end` of the 16-bit word.
    pub fn operand(&self, start: u32, end: u32) -> i32 {
        bits::signed_bits(self.word, start, end, IR_SIZE)
    }

    /// Register index held in bits 5-7.
    pub fn register_index(&self) -> usize {
        bits::unsigned_bits(self.word, 5, 7, IR_SIZE) as usize
    }

    /// Signed 8-bit constant held in bits 8-15.
    pub fn constant(&self) -> i32 {
        self.operand(8, 15)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True only for a valid STOP instruction.
    pub fn is_halt(&self) -> bool {
        self.halt
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The word as four uppercase hex digits.
    pub fn to_hex(&self) -> String {
        bits::to_hex(self.word, 4)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ILLEGAL: [u32; 12] = [2, 15, 20, 21, 22, 23, 25, 26, 27, 28, 29, 30];

    #[test]
    fn test_legal_opcode_table() {
        for op in Opcode::ALL {
            assert!(is_legal_opcode(u32::from(op.code())), "{} should be legal", op);
        }
        for code in ILLEGAL {
            assert!(!is_legal_opcode(code), "{} should be illegal", code);
        }
        assert!(!is_legal_opcode(32));
        assert_eq!(Opcode::ALL.len() + ILLEGAL.len(), 32);
    }

    #[test]
    fn test_validity_follows_opcode() {
        for code in 0u32..32 {
            // Put junk in the operand bits; only the opcode decides validity.
            let word = ((code << 11) | 0x5A5) as i32;
            let instr = Instruction::new(word);
            assert_eq!(instr.opcode() as u32, code);
            assert_eq!(instr.is_valid(), is_legal_opcode(code));
            assert_eq!(instr.is_halt(), code == 31);
        }
    }

    #[test]
    fn test_decode_operands() {
        // LDI -20
        let instr = Instruction::from_hex("70EC");
        assert!(instr.is_valid());
        assert_eq!(instr.op(), Some(Opcode::Ldai));
        assert_eq!(instr.constant(), -20);
        assert_eq!(instr.operand(8, 15), -20);

        // ADDC R5
        let instr = Instruction::new(0x1D00);
        assert_eq!(instr.op(), Some(Opcode::Addc));
        assert_eq!(instr.register_index(), 5);
    }

    #[test]
    fn test_malformed_hex_is_invalid() {
        let instr = Instruction::from_hex("*12G4");
        assert!(!instr.is_valid());
        assert!(!instr.is_halt());
        assert_eq!(instr.source(), "*12G4");

        let instr = Instruction::from_hex("");
        assert!(!instr.is_valid());
    }

    #[test]
    fn test_stop_from_hex() {
        let instr = Instruction::from_hex("f800");
        assert!(instr.is_valid());
        assert!(instr.is_halt());
        assert_eq!(instr.to_hex(), "F800");
        assert_eq!(instr.to_string(), "F800");
    }

    #[test]
    fn test_negative_word_uses_low_bits() {
        let instr = Instruction::new(-2048); // 0xF800 sign-extended
        assert!(instr.is_halt());
        assert_eq!(instr.to_hex(), "F800");
    }

    #[test]
    fn test_modes() {
        assert_eq!(Opcode::Stop.mode(), AddressingMode::Implicit);
        assert_eq!(Opcode::Star.mode(), AddressingMode::RegisterDirect);
        assert_eq!(Opcode::Staa.mode(), AddressingMode::Direct);
        assert_eq!(Opcode::Ldai.mode(), AddressingMode::Immediate);
        assert_eq!(Opcode::from_u8(24), Some(Opcode::Nop));
        assert_eq!(Opcode::from_u8(2), None);
    }
}
