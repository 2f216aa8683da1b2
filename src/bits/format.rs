//! Text renderings of fixed-width values.

use super::field::HOST_BITS;

/// The `width`-bit two's-complement representation of `value`, MSB first.
///
/// ```
/// use riscar5::bits::to_twos_complement_string;
/// assert_eq!(to_twos_complement_string(5, 4), "0101");
/// assert_eq!(to_twos_complement_string(-2, 8), "11111110");
/// ```
///
/// # Panics
/// Panics if `width` is not in `1..=32`.
pub fn to_twos_complement_string(value: i32, width: u32) -> String {
    assert!(
        (1..=HOST_BITS).contains(&width),
        "width {} is outside 1..={}",
        width, HOST_BITS
    );
    let bits = format!("{:b}", value as u32);
    sign_extend_or_trim(&bits, width as usize, value >= 0)
}

/// Uppercase hexadecimal of `value` masked to `digits * 4` bits.
///
/// # Panics
/// Panics if `digits` is not in `1..=8`.
pub fn to_hex(value: i32, digits: u32) -> String {
    assert!((1..=8).contains(&digits), "cannot render {} hex digits", digits);
    let mask = (1u64 << (digits * 4)) - 1;
    let masked = u64::from(value as u32) & mask;
    format!("{:0width$X}", masked, width = digits as usize)
}

/// Pads a binary string to `width` with its sign bit, or keeps its low
/// `width` digits when it is already longer.
pub fn sign_extend_or_trim(bits: &str, width: usize, positive: bool) -> String {
    if bits.len() > width {
        return bits[bits.len() - width..].to_owned();
    }
    let fill = if positive { '0' } else { '1' };
    let mut out = String::with_capacity(width);
    out.extend(std::iter::repeat(fill).take(width - bits.len()));
    out.push_str(bits);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twos_complement_string() {
        assert_eq!(to_twos_complement_string(0, 8), "00000000");
        assert_eq!(to_twos_complement_string(-1, 4), "1111");
        assert_eq!(to_twos_complement_string(-128, 8), "10000000");
        // Positive values wider than the window keep their low bits.
        assert_eq!(to_twos_complement_string(0x1FF, 8), "11111111");
        assert_eq!(to_twos_complement_string(5, 6), "000101");
        assert_eq!(to_twos_complement_string(-1, 32), "1".repeat(32));
    }

    #[test]
    fn test_hex_masks_to_digits() {
        assert_eq!(to_hex(0x7014, 4), "7014");
        assert_eq!(to_hex(-1, 4), "FFFF");
        assert_eq!(to_hex(-1, 2), "FF");
        assert_eq!(to_hex(10, 2), "0A");
        assert_eq!(to_hex(0x12345, 4), "2345");
        assert_eq!(to_hex(-1, 8), "FFFFFFFF");
    }

    #[test]
    fn test_sign_extend_or_trim() {
        assert_eq!(sign_extend_or_trim("101", 6, false), "111101");
        assert_eq!(sign_extend_or_trim("101", 6, true), "000101");
        assert_eq!(sign_extend_or_trim("110101", 4, true), "0101");
    }
}
