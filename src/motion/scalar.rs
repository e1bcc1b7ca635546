//! Fixed-point scalar for ramp timing.
//!
//! A 16-bit normalized mantissa with a binary exponent. Multiplication is a
//! single 16×16 multiply; the reciprocal is one 32/16 integer division. This
//! is accurate to about 1 part in 2^15, which is plenty for step intervals and
//! keeps floating point out of the ramp path.

use core::cmp::Ordering;
use core::ops::Mul;

/// Approximate non-negative number `mantissa * 2^(exponent - 15)`.
///
/// The mantissa is normalized to `0x8000..=0xFFFF`; zero is stored as a zero
/// mantissa. Values saturate at the top of the exponent range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FixedScalar {
    mantissa: u16,
    exponent: i8,
}

impl FixedScalar {
    /// Zero.
    pub const ZERO: Self = Self {
        mantissa: 0,
        exponent: 0,
    };

    /// One.
    pub const ONE: Self = Self {
        mantissa: 0x8000,
        exponent: 0,
    };

    /// Largest representable value.
    pub const MAX: Self = Self {
        mantissa: 0xffff,
        exponent: i8::MAX,
    };

    /// Build from `raw * 2^(exponent - 15)`, rounding to nearest.
    fn normalize(raw: u64, exponent: i16) -> Self {
        if raw == 0 {
            return Self::ZERO;
        }
        let msb = 63 - raw.leading_zeros() as i16;
        let (mut mantissa, mut exponent) = if msb > 15 {
            let shift = msb - 15;
            let rounded = (raw + (1u64 << (shift - 1))) >> shift;
            (rounded, exponent + shift)
        } else {
            let shift = 15 - msb;
            (raw << shift, exponent - shift)
        };
        // rounding can carry into bit 16
        if mantissa > 0xffff {
            mantissa >>= 1;
            exponent += 1;
        }
        if exponent > i16::from(i8::MAX) {
            return Self::MAX;
        }
        if exponent < i16::from(i8::MIN) {
            return Self::ZERO;
        }
        Self {
            mantissa: mantissa as u16,
            exponent: exponent as i8,
        }
    }

    /// Convert an integer.
    pub fn from_u32(value: u32) -> Self {
        Self::normalize(u64::from(value), 15)
    }

    /// Convert a 64-bit integer.
    pub fn from_u64(value: u64) -> Self {
        if value >> 48 == 0 {
            return Self::normalize(value, 15);
        }
        // keep headroom for rounding inside normalize
        let shift = 48 - value.leading_zeros() as i16;
        Self::normalize(value >> shift, 15 + shift)
    }

    /// `numerator / denominator`, computed as a multiply by the reciprocal.
    pub fn from_ratio(numerator: u32, denominator: u32) -> Self {
        Self::from_u32(numerator) * Self::from_u32(denominator).recip()
    }

    /// True for zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self.mantissa == 0
    }

    /// Product.
    #[inline]
    pub fn mul(self, rhs: Self) -> Self {
        if self.is_zero() || rhs.is_zero() {
            return Self::ZERO;
        }
        let product = u64::from(self.mantissa) * u64::from(rhs.mantissa);
        // product * 2^(e1 + e2 - 30)
        Self::normalize(
            product,
            i16::from(self.exponent) + i16::from(rhs.exponent) - 15,
        )
    }

    /// Approximate `1 / self`. The reciprocal of zero saturates to [`MAX`].
    ///
    /// [`MAX`]: Self::MAX
    #[inline]
    pub fn recip(self) -> Self {
        if self.is_zero() {
            return Self::MAX;
        }
        let m = u32::from(self.mantissa);
        let q = ((1u32 << 31) + m / 2) / m;
        // 1 / (m * 2^(e - 15)) = q * 2^(-16 - e)
        Self::normalize(u64::from(q), -1 - i16::from(self.exponent))
    }

    /// Approximate square root.
    pub fn sqrt(self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        // value = (m << 16) * 2^k with k = e - 31; make k even
        let k = i16::from(self.exponent) - 31;
        let (radicand, half_k) = if k % 2 == 0 {
            (u32::from(self.mantissa) << 16, k / 2)
        } else {
            (u32::from(self.mantissa) << 15, (k + 1) / 2)
        };
        Self::normalize(u64::from(isqrt(radicand)), half_k + 15)
    }

    /// Truncate to an integer tick count, saturating at `u32::MAX`.
    pub fn to_u32(self) -> u32 {
        let e = i16::from(self.exponent);
        let m = u64::from(self.mantissa);
        if e >= 15 {
            let shift = e - 15;
            if shift > 16 {
                return u32::MAX;
            }
            (m << shift).min(u64::from(u32::MAX)) as u32
        } else {
            let shift = 15 - e;
            if shift > 16 {
                return 0;
            }
            (m >> shift) as u32
        }
    }
}

impl Mul for FixedScalar {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        FixedScalar::mul(self, rhs)
    }
}

impl Ord for FixedScalar {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.is_zero(), other.is_zero()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self
                .exponent
                .cmp(&other.exponent)
                .then(self.mantissa.cmp(&other.mantissa)),
        }
    }
}

impl PartialOrd for FixedScalar {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Integer square root, rounded to nearest.
fn isqrt(x0: u32) -> u32 {
    let mut x = x0;
    let mut result = 0u32;
    let mut bit = 1u32 << 30;
    while bit > x {
        bit >>= 2;
    }
    while bit != 0 {
        if x >= result + bit {
            x -= result + bit;
            result = (result >> 1) + bit;
        } else {
            result >>= 1;
        }
        bit >>= 2;
    }
    if result < x {
        result + 1
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: u32, expected: u32) -> bool {
        let tolerance = (expected / 8192).max(1);
        actual.abs_diff(expected) <= tolerance
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(15), 4);
        assert_eq!(isqrt(1 << 30), 1 << 15);
        assert_eq!(isqrt(u32::MAX), 65536);
    }

    #[test]
    fn test_integer_conversion() {
        assert_eq!(FixedScalar::from_u32(0).to_u32(), 0);
        assert_eq!(FixedScalar::from_u32(1).to_u32(), 1);
        assert_eq!(FixedScalar::from_u32(50_000).to_u32(), 50_000);
        assert!(close(FixedScalar::from_u32(16_000_000).to_u32(), 16_000_000));
        assert_eq!(FixedScalar::MAX.to_u32(), u32::MAX);
    }

    #[test]
    fn test_from_u64() {
        let k = FixedScalar::from_u64(128_000_000_000);
        let scaled = k * FixedScalar::from_u32(1000).recip() * FixedScalar::from_u32(1000).recip();
        assert!(close(scaled.to_u32(), 128_000));
    }

    #[test]
    fn test_mul_and_recip() {
        let a = FixedScalar::from_u32(3000);
        let b = FixedScalar::from_u32(7);
        assert!(close((a * b).to_u32(), 21_000));

        let third = FixedScalar::from_u32(3).recip();
        assert!(close((FixedScalar::from_u32(90_000) * third).to_u32(), 30_000));

        assert_eq!(FixedScalar::ZERO.recip(), FixedScalar::MAX);
        assert!((a * FixedScalar::ZERO).is_zero());
    }

    #[test]
    fn test_ratio() {
        let r = FixedScalar::from_ratio(3, 5);
        assert!(close((FixedScalar::from_u32(483_706) * r).to_u32(), 290_224));
    }

    #[test]
    fn test_sqrt() {
        assert!(close(FixedScalar::from_u32(32768).sqrt().to_u32(), 181));
        assert!(close(FixedScalar::from_u32(1_000_000).sqrt().to_u32(), 1000));
        let k = FixedScalar::from_u64(128_000_000_000);
        assert!(close(k.sqrt().to_u32(), 357_771));
    }

    #[test]
    fn test_ordering() {
        let small = FixedScalar::from_u32(10);
        let large = FixedScalar::from_u32(10_000);
        assert!(small < large);
        assert!(FixedScalar::ZERO < small);
        assert_eq!(small.cmp(&FixedScalar::from_u32(10)), Ordering::Equal);
    }
}
