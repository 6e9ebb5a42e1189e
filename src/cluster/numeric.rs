/* ************************************************************************ **
** This file is part of virial, and is licensed under EITHER the MIT        **
** license or the Apache 2.0 license, at your option.                       **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

//! Numeric backends for the subset recurrences.
//!
//! The recurrences are written once against [`ClusterScalar`]. A backend may need
//! shared state (the working precision of a decimal), which travels alongside the
//! values as a `Context`.

use crate::{ConfigurationError, NumericalAnomaly};

use bigdecimal::BigDecimal;
use num_traits::{FromPrimitive, ToPrimitive, Zero, One};
use std::fmt;

pub trait ClusterScalar: Clone + PartialEq + fmt::Debug + Send + 'static {
    type Context: Clone + fmt::Debug + Send + Sync + 'static;

    /// Name used in error messages.
    const BACKEND: &'static str;

    fn zero(ctx: &Self::Context) -> Self;
    fn one(ctx: &Self::Context) -> Self;

    /// Converts a bond (or anything else computed in double precision).
    fn from_f64(x: f64, ctx: &Self::Context) -> Result<Self, ConfigurationError>;
    fn from_int(k: i64, ctx: &Self::Context) -> Self;

    fn add(&self, rhs: &Self, ctx: &Self::Context) -> Result<Self, NumericalAnomaly>;
    fn sub(&self, rhs: &Self, ctx: &Self::Context) -> Result<Self, NumericalAnomaly>;
    fn mul(&self, rhs: &Self, ctx: &Self::Context) -> Result<Self, NumericalAnomaly>;

    fn is_zero(&self) -> bool;
    fn to_f64(&self) -> f64;
}

//--------------------------------------------------------------------------------------

impl ClusterScalar for f64 {
    type Context = ();
    const BACKEND: &'static str = "double";

    #[inline(always)] fn zero(_: &()) -> f64 { 0.0 }
    #[inline(always)] fn one(_: &()) -> f64 { 1.0 }
    #[inline(always)] fn from_f64(x: f64, _: &()) -> Result<f64, ConfigurationError> { Ok(x) }
    #[inline(always)] fn from_int(k: i64, _: &()) -> f64 { k as f64 }

    // Non-finite values are caught once the final value is known.
    #[inline(always)] fn add(&self, rhs: &f64, _: &()) -> Result<f64, NumericalAnomaly> { Ok(self + rhs) }
    #[inline(always)] fn sub(&self, rhs: &f64, _: &()) -> Result<f64, NumericalAnomaly> { Ok(self - rhs) }
    #[inline(always)] fn mul(&self, rhs: &f64, _: &()) -> Result<f64, NumericalAnomaly> { Ok(self * rhs) }

    #[inline(always)] fn is_zero(&self) -> bool { *self == 0.0 }
    #[inline(always)] fn to_f64(&self) -> f64 { *self }
}

//--------------------------------------------------------------------------------------

/// Exact integer arithmetic, for bonds that only take the values `-1`, `0` and `1`
/// (and e-bonds `0` and `1`).
impl ClusterScalar for i64 {
    type Context = ();
    const BACKEND: &'static str = "exact";

    #[inline(always)] fn zero(_: &()) -> i64 { 0 }
    #[inline(always)] fn one(_: &()) -> i64 { 1 }

    fn from_f64(x: f64, _: &()) -> Result<i64, ConfigurationError> {
        // 2^53: every integer below this is exact in an f64
        const LIMIT: f64 = 9007199254740992.0;
        match x.fract() == 0.0 && x.abs() < LIMIT {
            true => Ok(x as i64),
            false => Err(ConfigurationError::Unrepresentable { value: x, backend: Self::BACKEND }),
        }
    }

    #[inline(always)] fn from_int(k: i64, _: &()) -> i64 { k }

    #[inline]
    fn add(&self, rhs: &i64, _: &()) -> Result<i64, NumericalAnomaly> {
        self.checked_add(*rhs).ok_or(NumericalAnomaly::Overflow { backend: Self::BACKEND })
    }

    #[inline]
    fn sub(&self, rhs: &i64, _: &()) -> Result<i64, NumericalAnomaly> {
        self.checked_sub(*rhs).ok_or(NumericalAnomaly::Overflow { backend: Self::BACKEND })
    }

    #[inline]
    fn mul(&self, rhs: &i64, _: &()) -> Result<i64, NumericalAnomaly> {
        self.checked_mul(*rhs).ok_or(NumericalAnomaly::Overflow { backend: Self::BACKEND })
    }

    #[inline(always)] fn is_zero(&self) -> bool { *self == 0 }
    #[inline(always)] fn to_f64(&self) -> f64 { *self as f64 }
}

//--------------------------------------------------------------------------------------

/// Decimal arithmetic with a fixed number of significant digits.
#[derive(Debug, Clone, PartialEq)]
pub struct Decimal(BigDecimal);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecimalContext {
    digits: u64,
}

/// Largest working precision accepted.
pub const MAX_DECIMAL_DIGITS: u32 = 300;

impl DecimalContext {
    pub fn new(digits: u32) -> Result<Self, ConfigurationError> {
        match digits {
            1..=MAX_DECIMAL_DIGITS => Ok(DecimalContext { digits: u64::from(digits) }),
            _ => Err(ConfigurationError::InvalidParameter { what: "decimal digits", value: f64::from(digits) }),
        }
    }

    pub fn digits(&self) -> u32 { self.digits as u32 }

    #[inline]
    fn round(&self, x: BigDecimal) -> Decimal { Decimal(x.with_prec(self.digits)) }
}

impl Decimal {
    pub fn as_big_decimal(&self) -> &BigDecimal { &self.0 }
}

impl ClusterScalar for Decimal {
    type Context = DecimalContext;
    const BACKEND: &'static str = "decimal";

    fn zero(_: &DecimalContext) -> Decimal { Decimal(BigDecimal::zero()) }
    fn one(_: &DecimalContext) -> Decimal { Decimal(BigDecimal::one()) }

    fn from_f64(x: f64, ctx: &DecimalContext) -> Result<Decimal, ConfigurationError> {
        BigDecimal::from_f64(x)
            .map(|d| ctx.round(d))
            .ok_or(ConfigurationError::Unrepresentable { value: x, backend: Self::BACKEND })
    }

    fn from_int(k: i64, _: &DecimalContext) -> Decimal { Decimal(BigDecimal::from(k)) }

    fn add(&self, rhs: &Decimal, ctx: &DecimalContext) -> Result<Decimal, NumericalAnomaly> {
        Ok(ctx.round(&self.0 + &rhs.0))
    }

    fn sub(&self, rhs: &Decimal, ctx: &DecimalContext) -> Result<Decimal, NumericalAnomaly> {
        Ok(ctx.round(&self.0 - &rhs.0))
    }

    fn mul(&self, rhs: &Decimal, ctx: &DecimalContext) -> Result<Decimal, NumericalAnomaly> {
        Ok(ctx.round(&self.0 * &rhs.0))
    }

    fn is_zero(&self) -> bool { self.0.is_zero() }

    fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or(::std::f64::NAN)
    }
}

/// How a Wheatley evaluator does its arithmetic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Precision {
    Double,
    /// Arbitrary precision with this many significant digits.
    Decimal { digits: u32 },
    /// Double precision, redone in decimal arithmetic when the result is suspiciously
    /// small compared to `tolerance`.
    Adaptive { tolerance: f64 },
    /// 64-bit integers; only for bonds that are exactly integers.
    Exact,
}

impl Precision {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        match *self {
            Precision::Double | Precision::Exact => Ok(()),
            Precision::Decimal { digits } => DecimalContext::new(digits).map(|_| ()),
            Precision::Adaptive { tolerance } => adaptive_digits(tolerance).map(|_| ()),
        }
    }
}

/// Working precision of the fallback for a given tolerance: three times the number
/// of decimal digits the tolerance resolves.
pub fn adaptive_digits(tolerance: f64) -> Result<u32, ConfigurationError> {
    if !(tolerance > 0.0 && tolerance < 1.0) {
        return Err(ConfigurationError::InvalidParameter { what: "tolerance", value: tolerance });
    }
    let digits = 3.0 * (-tolerance.log10()).floor();
    match digits >= 1.0 && digits <= f64::from(MAX_DECIMAL_DIGITS) {
        true => Ok(digits as u32),
        false => Err(ConfigurationError::InvalidParameter { what: "tolerance", value: tolerance }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_rejects_fractions() {
        assert_eq!(<i64 as ClusterScalar>::from_f64(-1.0, &()), Ok(-1));
        assert_eq!(<i64 as ClusterScalar>::from_f64(0.0, &()), Ok(0));
        assert!(<i64 as ClusterScalar>::from_f64(0.5, &()).is_err());
        assert!(<i64 as ClusterScalar>::from_f64(::std::f64::NAN, &()).is_err());
    }

    #[test]
    fn exact_overflow_is_reported() {
        let big = i64::max_value();
        assert_eq!(big.add(&1, &()), Err(NumericalAnomaly::Overflow { backend: "exact" }));
        assert_eq!(big.mul(&2, &()), Err(NumericalAnomaly::Overflow { backend: "exact" }));
        assert_eq!(3i64.sub(&5, &()), Ok(-2));
    }

    #[test]
    fn decimal_keeps_small_differences() {
        let ctx = DecimalContext::new(40).unwrap();
        let big = Decimal::from_f64(1e20, &ctx).unwrap();
        let one = Decimal::one(&ctx);
        let diff = big.add(&one, &ctx).unwrap().sub(&big, &ctx).unwrap();
        assert_eq!(diff.to_f64(), 1.0);

        // the same thing in double precision loses the one
        assert_eq!((1e20 + 1.0) - 1e20, 0.0);
    }

    #[test]
    fn decimal_rounds_to_digits() {
        let ctx = DecimalContext::new(5).unwrap();
        let third = Decimal::from_int(1, &ctx).mul(&Decimal::from_f64(1.0 / 3.0, &ctx).unwrap(), &ctx).unwrap();
        assert_close!(rel=1e-4, third.to_f64(), 1.0 / 3.0);
        assert!(third.as_big_decimal().digits() <= 5);
        assert!(DecimalContext::new(0).is_err());
        assert!(Decimal::from_f64(::std::f64::INFINITY, &ctx).is_err());
    }

    #[test]
    fn adaptive_digit_rule() {
        assert_eq!(adaptive_digits(3e-12), Ok(33));
        assert_eq!(adaptive_digits(5e-7), Ok(18));
        assert!(adaptive_digits(0.0).is_err());
        assert!(adaptive_digits(2.0).is_err());
        assert!(Precision::Adaptive { tolerance: 1e-200 }.validate().is_err());
        assert!(Precision::Decimal { digits: 50 }.validate().is_ok());
    }
}
