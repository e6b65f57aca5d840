//! # Fixed-Point Scalar
//!
//! Value type of the fixed-point field store.
//!
//! Signed 32-bit with 12 fractional bits (Q19.12): the precision handheld
//! targets without an FPU use for positions, velocities and angles.
//!
//! - Deterministic: same calculation = same result on all hardware
//! - One machine word per value, `Pod` so a whole row can be zeroed

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use bytemuck::{Pod, Zeroable};

/// Number of fractional bits.
pub const FRACTION_BITS: u32 = 12;

/// The raw value of 1.0.
const ONE_RAW: i32 = 1 << FRACTION_BITS;

/// Fixed-point number, Q19.12.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Pod, Zeroable)]
#[repr(transparent)]
pub struct Fixed(i32);

impl Fixed {
    /// Zero value.
    pub const ZERO: Self = Self(0);

    /// One unit.
    pub const ONE: Self = Self(ONE_RAW);

    /// Creates from a whole number.
    #[inline]
    #[must_use]
    pub const fn from_int(whole: i32) -> Self {
        Self(whole << FRACTION_BITS)
    }

    /// Creates from the raw Q19.12 representation.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Creates `numerator / denominator` without going through floats.
    ///
    /// # Panics
    ///
    /// Panics if `denominator` is zero.
    #[inline]
    #[must_use]
    pub const fn from_ratio(numerator: i32, denominator: i32) -> Self {
        Self((((numerator as i64) << FRACTION_BITS) / denominator as i64) as i32)
    }

    /// Creates from a float, truncating extra precision.
    #[inline]
    #[must_use]
    pub fn from_f32(value: f32) -> Self {
        Self((value * ONE_RAW as f32) as i32)
    }

    /// Returns the raw Q19.12 representation.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Returns the integer part, truncated toward zero.
    #[inline]
    #[must_use]
    pub const fn to_int(self) -> i32 {
        self.0 / ONE_RAW
    }

    /// Converts to a float (for presentation only).
    #[inline]
    #[must_use]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / ONE_RAW as f32
    }

    /// Absolute value.
    #[inline]
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }
}

impl Add for Fixed {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Fixed {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Neg for Fixed {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self(((i64::from(self.0) * i64::from(rhs.0)) >> FRACTION_BITS) as i32)
    }
}

impl Mul<i32> for Fixed {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: i32) -> Self {
        Self(self.0.wrapping_mul(rhs))
    }
}

impl Div for Fixed {
    type Output = Self;

    /// # Panics
    ///
    /// Panics on division by zero.
    #[inline]
    fn div(self, rhs: Self) -> Self {
        Self(((i64::from(self.0) << FRACTION_BITS) / i64::from(rhs.0)) as i32)
    }
}

impl From<i32> for Fixed {
    fn from(whole: i32) -> Self {
        Self::from_int(whole)
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f32())
    }
}

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_numbers() {
        assert_eq!(Fixed::from_int(3).to_int(), 3);
        assert_eq!(Fixed::from_int(-3).to_int(), -3);
        assert_eq!(Fixed::from_int(2) + Fixed::from_int(5), Fixed::from_int(7));
    }

    #[test]
    fn test_fractional_arithmetic() {
        let half = Fixed::from_ratio(1, 2);
        assert_eq!(half.raw(), ONE_RAW / 2);
        assert_eq!(half * Fixed::from_int(6), Fixed::from_int(3));
        assert_eq!(Fixed::from_int(3) / Fixed::from_int(2), Fixed::from_ratio(3, 2));
        assert_eq!(-half + Fixed::ONE, half);
    }

    #[test]
    fn test_truncation_toward_zero() {
        assert_eq!(Fixed::from_ratio(-3, 2).to_int(), -1);
        assert_eq!(Fixed::from_ratio(3, 2).to_int(), 1);
    }

    #[test]
    fn test_float_conversion() {
        assert_eq!(Fixed::from_f32(0.5), Fixed::from_ratio(1, 2));
        assert!((Fixed::from_ratio(1, 4).to_f32() - 0.25).abs() < f32::EPSILON);
    }
}
