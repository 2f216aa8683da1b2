//! Bit-range extraction over a fixed-width two's-complement window.

use thiserror::Error;

/// Width of the host integer every window is carved out of.
pub const HOST_BITS: u32 = 32;

/// Panics unless `0 <= start <= end < width <= 32`.
#[inline]
fn check_range(start: u32, end: u32, width: u32) {
    assert!(
        width <= HOST_BITS && start <= end && end < width,
        "bit range {}..={} is out of bounds for a {}-bit value",
        start, end, width
    );
}

/// Unsigned value of bits `start..=end` of the `width`-bit view of `value`.
///
/// Index 0 is the most significant bit of the window. Only the low `width`
/// bits of `value` take part in the extraction.
///
/// ```
/// use riscar5::bits::unsigned_bits;
/// // 0b1100 seen as 4 bits: the top two bits are 0b11.
/// assert_eq!(unsigned_bits(12, 0, 1, 4), 3);
/// ```
///
/// # Panics
/// Panics if the range is not inside the window or `width > 32`.
pub fn unsigned_bits(value: i32, start: u32, end: u32, width: u32) -> u32 {
    check_range(start, end, width);
    let offset = HOST_BITS - width;
    let (start, end) = (start + offset, end + offset);
    let number = ((value as u32) << start) >> start;
    number >> (HOST_BITS - end - 1)
}

/// Signed value of bits `start..=end` of the `width`-bit view of `value`.
///
/// Bit `start` is treated as the sign bit of the extracted field.
///
/// # Panics
/// Panics if the range is not inside the window or `width > 32`.
pub fn signed_bits(value: i32, start: u32, end: u32, width: u32) -> i32 {
    check_range(start, end, width);
    let offset = HOST_BITS - width;
    let (start, end) = (start + offset, end + offset);
    let number = (value << start) >> start;
    number >> (HOST_BITS - end - 1)
}

/// Whether `value` lies in `[-2^(width-1), 2^width)`.
///
/// The positive side admits one more bit than a true two's-complement range,
/// so an 8-bit check accepts both `-128` and `255`. Register writes and
/// assembler constants both rely on this exact boundary.
///
/// # Panics
/// Panics if `width` is not in `1..=32`.
pub fn fits(value: i64, width: u32) -> bool {
    assert!(
        (1..=HOST_BITS).contains(&width),
        "width {} is outside 1..={}",
        width, HOST_BITS
    );
    value >= -(1i64 << (width - 1)) && value < (1i64 << width)
}

/// [`fits`] as a `Result`, for callers validating user input.
pub fn check_fits(value: i64, width: u32) -> Result<(), BitsError> {
    if fits(value, width) {
        Ok(())
    } else {
        Err(BitsError::DoesNotFit { value, width })
    }
}

/// Most significant bit of the `width`-bit view of `value`.
#[inline]
pub fn msb(value: i32, width: u32) -> u32 {
    unsigned_bits(value, 0, 0, width)
}

/// Least significant bit of the low byte of `value`.
#[inline]
pub fn lsb(value: i32) -> u32 {
    unsigned_bits(value, 7, 7, 8)
}

/// Errors raised when a user-supplied value does not fit its field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitsError {
    #[error("the number {value} doesn't fit in {width} bits")]
    DoesNotFit { value: i64, width: u32 },
}
