//! Two's-complement bit-field primitives.
//!
//! Everything in the machine is an `i32` viewed through a narrower window:
//! - [`field`] - extraction of signed/unsigned bit ranges and width checks
//! - [`format`] - binary and hexadecimal renderings of those windows
//!
//! Bit indices count from the most significant bit of the window, so bit 0
//! of a 16-bit instruction word is its top bit.

pub mod field;
pub mod format;

pub use field::{check_fits, fits, lsb, msb, signed_bits, unsigned_bits, BitsError, HOST_BITS};
pub use format::{sign_extend_or_trim, to_hex, to_twos_complement_string};
