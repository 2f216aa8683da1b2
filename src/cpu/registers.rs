//! RISC-AR5 CPU registers.
//!
//! The RISC-AR5 has 12 registers:
//! - R0-R7: 8-bit general purpose registers (R7 doubles as the branch target)
//! - ACC: 8-bit accumulator (implicit operand of every ALU instruction)
//! - IR: 16-bit instruction register
//! - PC: 8-bit program counter
//! - SR: 4-bit status register holding the Z, C, N and V flags

use crate::bits;
use crate::cpu::{IR_SIZE, MEMORY_SIZE, NUMBER_OF_GPR, PC_INCREMENT, REGISTER_WIDTH};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the general purpose register names.
pub const GPR_PREFIX: &str = "R";
pub const ACC: &str = "ACC";
pub const IR: &str = "IR";
pub const PC: &str = "PC";
pub const SR: &str = "SR";

/// A named register holding a signed value of at most `width` bits.
///
/// Stored values must satisfy [`bits::fits`], which admits
/// `[-2^(width-1), 2^width)`. Anything else means the emulator itself
/// produced a bad value, so [`Register::set`] panics rather than returning
/// an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    name: String,
    width: u32,
    data: i32,
}

impl Register {
    /// Create a zeroed register.
    ///
    /// # Panics
    /// Panics if `width` is not in `1..=32`.
    pub fn new(name: impl Into<String>, width: u32) -> Self {
        Self::with_value(name, 0, width)
    }

    /// Create a register holding `data`.
    ///
    /// # Panics
    /// Panics if `width` is not in `1..=32` or `data` does not fit.
    pub fn with_value(name: impl Into<String>, data: i32, width: u32) -> Self {
        assert!(
            (1..=bits::HOST_BITS).contains(&width),
            "register width {} is not in 1..=32",
            width
        );
        let mut register = Self {
            name: name.into(),
            width,
            data: 0,
        };
        register.set(data);
        register
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn get(&self) -> i32 {
        self.data
    }

    /// Store `data`.
    ///
    /// # Panics
    /// Panics if `data` is outside `[-2^(width-1), 2^width)`.
    #[inline]
    pub fn set(&mut self, data: i32) {
        assert!(
            bits::fits(i64::from(data), self.width),
            "value {} doesn't fit in the {}-bit register {}",
            data, self.width, self.name
        );
        self.data = data;
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={} ({})",
            self.name,
            bits::to_twos_complement_string(self.data, self.width),
            self.data
        )
    }
}

/// Condition flags, with their bit index inside the status register
/// (counted from the least significant bit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    Zero,
    Carry,
    Negative,
    Overflow,
}

impl Flag {
    pub const ALL: [Flag; 4] = [Flag::Zero, Flag::Carry, Flag::Negative, Flag::Overflow];

    pub const fn index(self) -> u32 {
        match self {
            Flag::Zero => 3,
            Flag::Carry => 2,
            Flag::Negative => 1,
            Flag::Overflow => 0,
        }
    }

    pub const fn letter(self) -> char {
        match self {
            Flag::Zero => 'Z',
            Flag::Carry => 'C',
            Flag::Negative => 'N',
            Flag::Overflow => 'V',
        }
    }
}

/// The 4-bit status register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRegister {
    reg: Register,
}

impl StatusRegister {
    pub const WIDTH: u32 = 4;

    /// Create a status register with every flag clear.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            reg: Register::new(name, Self::WIDTH),
        }
    }

    /// The flag as a 0/1 bit.
    pub fn flag_bit(&self, flag: Flag) -> u32 {
        let index = Self::WIDTH - flag.index() - 1;
        bits::unsigned_bits(self.reg.get(), index, index, Self::WIDTH)
    }

    #[inline]
    pub fn is_set(&self, flag: Flag) -> bool {
        self.flag_bit(flag) == 1
    }

    pub fn set_flag(&mut self, flag: Flag, set: bool) {
        let mask = 1 << flag.index();
        let flags = self.reg.get();
        self.reg.set(if set { flags | mask } else { flags & !mask });
    }

    pub fn clear_all(&mut self) {
        self.reg.set(0);
    }

    /// All four flags packed as `ZCNV`.
    pub fn bits(&self) -> i32 {
        self.reg.get()
    }

    pub fn as_register(&self) -> &Register {
        &self.reg
    }
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new(SR)
    }
}

/// Set flags by letter, clear ones as `-`: `Z-N-`.
impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for flag in Flag::ALL {
            let c = if self.is_set(flag) { flag.letter() } else { '-' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// The RISC-AR5 register file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// R0-R7
    pub gpr: [Register; NUMBER_OF_GPR],

    /// ACC: accumulator
    pub acc: Register,

    /// IR: raw word of the instruction being executed
    pub ir: Register,

    /// PC: address of the next instruction
    pub pc: Register,

    /// SR: Z, C, N and V flags
    pub sr: StatusRegister,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub fn new() -> Self {
        Self {
            gpr: std::array::from_fn(|i| Register::new(format!("{}{}", GPR_PREFIX, i), REGISTER_WIDTH)),
            acc: Register::new(ACC, REGISTER_WIDTH),
            ir: Register::new(IR, IR_SIZE),
            pc: Register::new(PC, REGISTER_WIDTH),
            sr: StatusRegister::new(SR),
        }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Look a register up by name (`R0`..`R7`, `ACC`, `IR`, `PC`, `SR`).
    pub fn by_name(&self, name: &str) -> Option<&Register> {
        match name {
            ACC => Some(&self.acc),
            IR => Some(&self.ir),
            PC => Some(&self.pc),
            SR => Some(self.sr.as_register()),
            _ => self.gpr.iter().find(|r| r.name() == name),
        }
    }

    /// Every register: R0-R7, then ACC, IR, PC and SR.
    pub fn iter(&self) -> impl Iterator<Item = &Register> {
        self.gpr
            .iter()
            .chain([&self.acc, &self.ir, &self.pc, self.sr.as_register()])
    }

    /// Advance the PC past one instruction, wrapping inside memory.
    /// Returns the old value.
    pub fn advance_pc(&mut self) -> i32 {
        let old = self.pc.get();
        self.pc.set((old + PC_INCREMENT).rem_euclid(MEMORY_SIZE as i32));
        old
    }

    /// Set the PC to an absolute address.
    pub fn jump(&mut self, addr: usize) {
        self.pc.set(addr as i32);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_accepts_asymmetric_range() {
        let mut reg = Register::new("T", 8);
        reg.set(-128);
        assert_eq!(reg.get(), -128);
        reg.set(255);
        assert_eq!(reg.get(), 255);
    }

    #[test]
    #[should_panic(expected = "doesn't fit")]
    fn test_register_overflow_panics() {
        let mut reg = Register::new("T", 8);
        reg.set(256);
    }

    #[test]
    #[should_panic(expected = "doesn't fit")]
    fn test_register_underflow_panics() {
        Register::with_value("T", -129, 8);
    }

    #[test]
    fn test_flags_set_and_clear() {
        let mut sr = StatusRegister::default();
        sr.set_flag(Flag::Zero, true);
        sr.set_flag(Flag::Overflow, true);
        assert!(sr.is_set(Flag::Zero));
        assert!(!sr.is_set(Flag::Carry));
        assert!(sr.is_set(Flag::Overflow));
        assert_eq!(sr.bits(), 0b1001);
        assert_eq!(sr.to_string(), "Z--V");

        sr.set_flag(Flag::Zero, false);
        assert_eq!(sr.flag_bit(Flag::Zero), 0);
        assert_eq!(sr.bits(), 0b0001);

        sr.set_flag(Flag::Carry, true);
        sr.set_flag(Flag::Negative, true);
        sr.clear_all();
        assert_eq!(sr.bits(), 0);
    }

    #[test]
    fn test_lookup_by_name() {
        let mut regs = Registers::new();
        regs.gpr[3].set(-5);
        regs.acc.set(7);

        assert_eq!(regs.by_name("R3").unwrap().get(), -5);
        assert_eq!(regs.by_name("ACC").unwrap().get(), 7);
        assert_eq!(regs.by_name("SR").unwrap().width(), 4);
        assert_eq!(regs.by_name("IR").unwrap().width(), 16);
        assert!(regs.by_name("R8").is_none());
        assert_eq!(regs.iter().count(), 12);
    }

    #[test]
    fn test_advance_pc_wraps() {
        let mut regs = Registers::new();
        regs.pc.set(10);

        let old = regs.advance_pc();
        assert_eq!(old, 10);
        assert_eq!(regs.pc.get(), 12);

        regs.pc.set(254);
        regs.advance_pc();
        assert_eq!(regs.pc.get(), 0);
    }
}
