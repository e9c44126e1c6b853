//! Fixed-point multiply helpers for step timing
//!
//! The step-rate calculations multiply a small fraction by a timer value
//! and keep only the high half of the product. Both helpers round to
//! nearest on the first discarded bit.

/// `(a * b) >> 8`, rounded
///
/// `a` is an 8-bit fraction of 256, so the result is `b` scaled by
/// `a / 256`.
#[inline]
pub const fn mul_u16x8_h16(a: u8, b: u16) -> u16 {
    ((a as u32 * b as u32 + 0x80) >> 8) as u16
}

/// Bits 24..40 of `a * b`, rounded
///
/// `a` is a 24-bit value; its upper byte is ignored. Only the low 16 bits
/// of `(a * b) >> 24` are returned, matching a 16-bit destination
/// register.
#[inline]
pub const fn mul_u24x32_h16(a: u32, b: u32) -> u16 {
    let product = (a & 0x00FF_FFFF) as u64 * b as u64;
    ((product + (1 << 23)) >> 24) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u16x8_scales_by_fraction() {
        assert_eq!(mul_u16x8_h16(0, 0xFFFF), 0);
        assert_eq!(mul_u16x8_h16(128, 1000), 500);
        assert_eq!(mul_u16x8_h16(255, 0xFFFF), 0xFEFF);
        assert_eq!(mul_u16x8_h16(64, 4000), 1000);
    }

    #[test]
    fn test_u16x8_rounds_to_nearest() {
        // 3 * 43 = 129 -> 0.504
        assert_eq!(mul_u16x8_h16(3, 43), 1);
        // 3 * 42 = 126 -> 0.492
        assert_eq!(mul_u16x8_h16(3, 42), 0);
    }

    #[test]
    fn test_u24x32_high_half() {
        assert_eq!(mul_u24x32_h16(1 << 16, 1 << 8), 1);
        assert_eq!(mul_u24x32_h16(0x00FF_FFFF, 0x0100_0000), 0xFFFF);
        assert_eq!(mul_u24x32_h16(0x0080_0000, 2000), 1000);
        // Rounds on bit 23
        assert_eq!(mul_u24x32_h16(0x0080_0000, 1), 1);
        assert_eq!(mul_u24x32_h16(0x007F_FFFF, 1), 0);
    }

    #[test]
    fn test_u24x32_ignores_top_byte_and_truncates() {
        assert_eq!(mul_u24x32_h16(0xFF00_1000, 0x0010_0000), mul_u24x32_h16(0x1000, 0x0010_0000));
        // 2^23 * 2^26 >> 24 = 2^25, low 16 bits are zero
        assert_eq!(mul_u24x32_h16(0x0080_0000, 1 << 26), 0);
    }
}
