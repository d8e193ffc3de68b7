//! 36-bit word arithmetic primitives.
//!
//! Words live in the low 36 bits of a `u64`. Bit 0 (the DEC numbering,
//! leftmost) is the sign; bits 1-35 carry the magnitude in two's
//! complement. Every store back into architectural state masks with
//! [`FMASK`]; intermediate values may carry garbage above bit 36 and rely
//! on the final mask, exactly as the hardware data paths did.

/// All 36 bits of a word.
pub const FMASK: u64 = 0o777_777_777_777;

/// The sign bit (DEC bit 0).
pub const SMASK: u64 = 0o400_000_000_000;

/// Magnitude bits 1-35.
pub const CMASK: u64 = 0o377_777_777_777;

/// Left half word (bits 0-17).
pub const LMASK: u64 = 0o777_777_000_000;

/// Right half word (bits 18-35).
pub const RMASK: u64 = 0o000_000_777_777;

/// Sign bit of an 18-bit half word.
pub const LSIGN: u64 = 0o000_000_400_000;

/// Carry out of bit 0 (bit 36 of an unmasked sum).
pub const C1: u64 = 0o1_000_000_000_000;

/// Floating-point mantissa, bits 9-35.
pub const MMASK: u64 = 0o000_777_777_777;

/// Floating-point exponent field, bits 1-8.
pub const EXPO: u64 = 0o377_000_000_000;

/// DEC bit 8: one above the leading mantissa bit.
pub const BIT8: u64 = 0o001_000_000_000;

/// DEC bit 9: the leading bit of a normalised mantissa.
pub const BIT9: u64 = 0o000_400_000_000;

/// Byte-pointer position field cleared (bits 6-35 kept).
pub const PMASK: u64 = 0o007_777_777_777;

/// One's complement within 36 bits.
#[must_use]
pub const fn cm(x: u64) -> u64 {
    FMASK ^ x
}

/// Two's complement negation within 36 bits (unmasked; bit 36 is the
/// carry out of the sign, which callers test through [`C1`]).
#[must_use]
pub const fn negate(x: u64) -> u64 {
    cm(x).wrapping_add(1)
}

/// Exchange the two 18-bit halves.
#[must_use]
pub const fn swap_halves(x: u64) -> u64 {
    ((x & RMASK) << 18) | ((x >> 18) & RMASK)
}

/// Smear the sign across the exponent field, turning a floating operand
/// into a 36-bit two's-complement integer with a 27-bit magnitude.
#[must_use]
pub const fn smear_sign(x: u64) -> u64 {
    if x & SMASK != 0 { x | EXPO } else { x & MMASK }
}

/// Recover the true exponent of a floating operand. A negative float is
/// the two's complement of the whole word, so its exponent field reads
/// back complemented.
#[must_use]
pub const fn get_expo(x: u64) -> i32 {
    let e = ((x >> 27) & 0o377) as i32;
    if x & SMASK != 0 { e ^ 0o377 } else { e }
}

/// Number of leading zero bits in a 36-bit word; 36 for zero.
#[must_use]
pub const fn nlzero(w: u64) -> u32 {
    if w == 0 { 36 } else { (w & FMASK).leading_zeros() - 28 }
}

/// Left shift that saturates to zero once every word bit is gone, instead
/// of hitting the host's shift-amount limit.
#[must_use]
pub const fn shl36(x: u64, count: u32) -> u64 {
    if count > 63 { 0 } else { x << count }
}

/// Right shift with the same guard.
#[must_use]
pub const fn shr36(x: u64, count: u32) -> u64 {
    if count > 63 { 0 } else { x >> count }
}

/// True when an arithmetic left shift by `count` loses magnitude bits
/// that differ from the sign fill, i.e. the shift overflows.
#[must_use]
pub fn ash_overflows(value: u64, fill: u64, count: u32) -> bool {
    if count > 35 {
        // Every magnitude bit leaves the word.
        return (value ^ fill) & CMASK != 0;
    }
    let keep = u128::from(CMASK);
    (u128::from(fill) << count) & !keep != (u128::from(value) << count) & !keep
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_law() {
        for &x in &[0u64, 1, 0o17, RMASK, CMASK, SMASK, FMASK, 0o123456765432] {
            assert_eq!(negate(x).wrapping_add(x) & FMASK, 0, "x = {x:o}");
        }
    }

    #[test]
    fn negate_minus_max_is_itself() {
        assert_eq!(negate(SMASK) & FMASK, SMASK);
    }

    #[test]
    fn swap_is_involution() {
        let w = 0o123456_765432;
        assert_eq!(swap_halves(w), 0o765432_123456);
        assert_eq!(swap_halves(swap_halves(w)), w);
    }

    #[test]
    fn leading_zeros() {
        assert_eq!(nlzero(0), 36);
        assert_eq!(nlzero(1), 35);
        assert_eq!(nlzero(SMASK), 0);
        assert_eq!(nlzero(0o000_400_000_000), 9);
    }

    #[test]
    fn exponent_of_negative_float() {
        // -1.0: two's complement of 201400000000
        let one = 0o201_400_000_000u64;
        let minus_one = negate(one) & FMASK;
        assert_eq!(get_expo(one), 0o201);
        assert_eq!(get_expo(minus_one), 0o201);
    }

    #[test]
    fn ash_overflow_detection() {
        // Shifting a 1 out of the magnitude overflows.
        assert!(ash_overflows(0o200_000_000_000, 0, 1));
        assert!(!ash_overflows(1, 0, 34));
        assert!(ash_overflows(1, 0, 35));
        // Negative value: fill is all ones, shifting out ones is fine.
        assert!(!ash_overflows(CMASK, FMASK, 3));
        // A full-range count drops everything.
        assert!(ash_overflows(2, 0, 200));
        assert!(!ash_overflows(0, 0, 200));
    }

    #[test]
    fn guarded_shifts() {
        assert_eq!(shl36(1, 70), 0);
        assert_eq!(shr36(FMASK, 100), 0);
        assert_eq!(shl36(1, 35), SMASK);
    }
}
