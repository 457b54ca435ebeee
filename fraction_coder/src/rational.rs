// fraction_coder/src/rational.rs

//! Exact arbitrary-precision rational numbers.
//!
//! Every value is kept in lowest terms with a strictly positive denominator,
//! so structural equality is value equality. All arithmetic is exact.

use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div, Mul, Sub};

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

/// Number of leading bits kept when converting a big integer to `f64`.
const F64_MANTISSA_BITS: u64 = 53;

/// An exact fraction `numer / denom` in lowest terms, `denom > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fraction {
    numer: BigInt,
    denom: BigInt,
}

impl Fraction {
    /// Builds a reduced fraction. Returns `None` when `denom` is zero.
    pub fn new(numer: BigInt, denom: BigInt) -> Option<Self> {
        if denom.is_zero() {
            return None;
        }
        Some(Self::reduced(numer, denom))
    }

    /// Convenience constructor for small operands.
    pub fn ratio(numer: u64, denom: u64) -> Option<Self> {
        Self::new(BigInt::from(numer), BigInt::from(denom))
    }

    pub fn zero() -> Self {
        Fraction {
            numer: BigInt::zero(),
            denom: BigInt::one(),
        }
    }

    pub fn one() -> Self {
        Fraction {
            numer: BigInt::one(),
            denom: BigInt::one(),
        }
    }

    /// `2^exp`, for negative exponents `1 / 2^-exp`.
    pub fn pow2(exp: i64) -> Self {
        let shift = exp.unsigned_abs();
        let power = BigInt::one() << shift;
        if exp >= 0 {
            Fraction {
                numer: power,
                denom: BigInt::one(),
            }
        } else {
            Fraction {
                numer: BigInt::one(),
                denom: power,
            }
        }
    }

    /// The dyadic fraction `numer / 2^exp`, reduced.
    pub fn dyadic(numer: BigUint, exp: u64) -> Self {
        Self::reduced(
            BigInt::from_biguint(Sign::Plus, numer),
            BigInt::one() << exp,
        )
    }

    fn reduced(numer: BigInt, denom: BigInt) -> Self {
        let (numer, denom) = if denom.is_negative() {
            (-numer, -denom)
        } else {
            (numer, denom)
        };
        // Dyadic denominators reduce by shifting out common factors of two.
        if let (Some(numer_zeros), Some(denom_zeros)) =
            (numer.trailing_zeros(), denom.trailing_zeros())
        {
            if denom_zeros + 1 == denom.bits() {
                let shift = numer_zeros.min(denom_zeros);
                return Fraction {
                    numer: numer >> shift,
                    denom: denom >> shift,
                };
            }
        }
        let divisor = numer.gcd(&denom);
        if divisor.is_one() || divisor.is_zero() {
            return Fraction { numer, denom };
        }
        Fraction {
            numer: numer / &divisor,
            denom: denom / &divisor,
        }
    }

    pub fn numer(&self) -> &BigInt {
        &self.numer
    }

    pub fn denom(&self) -> &BigInt {
        &self.denom
    }

    pub fn is_zero(&self) -> bool {
        self.numer.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.numer.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.numer.is_negative()
    }

    /// Largest integer not greater than the value.
    pub fn floor(&self) -> BigInt {
        self.numer.div_floor(&self.denom)
    }

    /// `floor(log2(self))` computed exactly, or `None` for non-positive values.
    pub fn floor_log2(&self) -> Option<i64> {
        if !self.is_positive() {
            return None;
        }
        let estimate = self.numer.bits() as i64 - self.denom.bits() as i64;
        // The true value is either `estimate` or `estimate - 1`.
        let reaches_estimate = if estimate >= 0 {
            self.numer >= (&self.denom << estimate as u64)
        } else {
            (&self.numer << estimate.unsigned_abs()) >= self.denom
        };
        Some(if reaches_estimate {
            estimate
        } else {
            estimate - 1
        })
    }

    /// Approximate base-2 logarithm. Returns `NEG_INFINITY` for zero and
    /// `NAN` for negative values.
    pub fn log2(&self) -> f64 {
        if self.is_zero() {
            return f64::NEG_INFINITY;
        }
        if self.is_negative() {
            return f64::NAN;
        }
        let (numer, numer_shift) = leading_bits(&self.numer);
        let (denom, denom_shift) = leading_bits(&self.denom);
        numer.log2() - denom.log2() + numer_shift as f64 - denom_shift as f64
    }

    /// Exponent `k` such that the denominator equals `2^k`, when it is a power of two.
    pub fn denom_log2(&self) -> Option<u64> {
        let bits = self.denom.bits();
        let below = &self.denom - 1u32;
        if (&self.denom & &below).is_zero() {
            Some(bits - 1)
        } else {
            None
        }
    }

    /// `floor(self * 2^bits)`.
    pub fn scaled_floor(&self, bits: u64) -> BigInt {
        (&self.numer << bits).div_floor(&self.denom)
    }

    /// Division that reports a zero divisor instead of panicking.
    pub fn checked_div(&self, rhs: &Fraction) -> Option<Fraction> {
        if rhs.is_zero() {
            return None;
        }
        Some(Self::reduced(
            &self.numer * &rhs.denom,
            &self.denom * &rhs.numer,
        ))
    }
}

/// Returns the value's leading bits as `f64` together with the number of
/// low bits that were shifted away.
fn leading_bits(value: &BigInt) -> (f64, u64) {
    let shift = value.bits().saturating_sub(F64_MANTISSA_BITS);
    let head = (value >> shift).to_f64().unwrap_or(f64::NAN);
    (head, shift)
}

impl From<u64> for Fraction {
    fn from(value: u64) -> Self {
        Fraction {
            numer: BigInt::from(value),
            denom: BigInt::one(),
        }
    }
}

impl From<BigInt> for Fraction {
    fn from(value: BigInt) -> Self {
        Fraction {
            numer: value,
            denom: BigInt::one(),
        }
    }
}

impl<'a> Add<&'a Fraction> for &'a Fraction {
    type Output = Fraction;

    fn add(self, rhs: &'a Fraction) -> Fraction {
        if self.denom == rhs.denom {
            return Fraction::reduced(&self.numer + &rhs.numer, self.denom.clone());
        }
        Fraction::reduced(
            &self.numer * &rhs.denom + &rhs.numer * &self.denom,
            &self.denom * &rhs.denom,
        )
    }
}

impl<'a> Sub<&'a Fraction> for &'a Fraction {
    type Output = Fraction;

    fn sub(self, rhs: &'a Fraction) -> Fraction {
        if self.denom == rhs.denom {
            return Fraction::reduced(&self.numer - &rhs.numer, self.denom.clone());
        }
        Fraction::reduced(
            &self.numer * &rhs.denom - &rhs.numer * &self.denom,
            &self.denom * &rhs.denom,
        )
    }
}

impl<'a> Mul<&'a Fraction> for &'a Fraction {
    type Output = Fraction;

    fn mul(self, rhs: &'a Fraction) -> Fraction {
        Fraction::reduced(&self.numer * &rhs.numer, &self.denom * &rhs.denom)
    }
}

/// # Panics
///
/// Panics on division by zero, like the primitive integer types.
/// Use [`Fraction::checked_div`] on untrusted operands.
impl<'a> Div<&'a Fraction> for &'a Fraction {
    type Output = Fraction;

    fn div(self, rhs: &'a Fraction) -> Fraction {
        match self.checked_div(rhs) {
            Some(quotient) => quotient,
            None => panic!("attempt to divide a fraction by zero"),
        }
    }
}

macro_rules! forward_owned_binop {
    ($($imp:ident $method:ident),*) => {$(
        impl $imp<Fraction> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: Fraction) -> Fraction {
                (&self).$method(&rhs)
            }
        }

        impl<'a> $imp<&'a Fraction> for Fraction {
            type Output = Fraction;

            fn $method(self, rhs: &'a Fraction) -> Fraction {
                (&self).$method(rhs)
            }
        }
    )*};
}

forward_owned_binop!(Add add, Sub sub, Mul mul, Div div);

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.denom == other.denom {
            return self.numer.cmp(&other.numer);
        }
        (&self.numer * &other.denom).cmp(&(&other.numer * &self.denom))
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<'a> Sum<&'a Fraction> for Fraction {
    fn sum<I: Iterator<Item = &'a Fraction>>(iter: I) -> Self {
        iter.fold(Fraction::zero(), |acc, value| &acc + value)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denom.is_one() {
            write!(f, "{}", self.numer)
        } else {
            write!(f, "{}/{}", self.numer, self.denom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frac(numer: u64, denom: u64) -> Fraction {
        Fraction::ratio(numer, denom).unwrap()
    }

    #[test]
    fn test_new_reduces_and_normalizes_sign() {
        let value = Fraction::new(BigInt::from(6), BigInt::from(-8)).unwrap();
        assert_eq!(value.numer(), &BigInt::from(-3));
        assert_eq!(value.denom(), &BigInt::from(4));
        assert_eq!(frac(0, 7), Fraction::zero());
    }

    #[test]
    fn test_zero_denominator_rejected() {
        assert!(Fraction::ratio(1, 0).is_none());
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = frac(1, 3);
        let b = frac(1, 6);
        assert_eq!(&a + &b, frac(1, 2));
        assert_eq!(&a - &b, frac(1, 6));
        assert_eq!(&a * &b, frac(1, 18));
        assert_eq!(&a / &b, Fraction::from(2));
        assert!((&b - &a).is_negative());
    }

    #[test]
    fn test_checked_div_by_zero() {
        assert!(frac(1, 2).checked_div(&Fraction::zero()).is_none());
    }

    #[test]
    fn test_ordering() {
        assert!(frac(1, 3) < frac(1, 2));
        assert!(frac(3, 4) > frac(2, 3));
        assert_eq!(frac(2, 4).cmp(&frac(1, 2)), Ordering::Equal);
    }

    #[test]
    fn test_floor() {
        assert_eq!(frac(7, 2).floor(), BigInt::from(3));
        assert_eq!(frac(1, 2).floor(), BigInt::zero());
        let negative = Fraction::new(BigInt::from(-1), BigInt::from(2)).unwrap();
        assert_eq!(negative.floor(), BigInt::from(-1));
    }

    #[test]
    fn test_floor_log2() {
        assert_eq!(Fraction::one().floor_log2(), Some(0));
        assert_eq!(frac(3, 4).floor_log2(), Some(-1));
        assert_eq!(frac(1, 4).floor_log2(), Some(-2));
        assert_eq!(frac(1, 3).floor_log2(), Some(-2));
        assert_eq!(frac(5, 1).floor_log2(), Some(2));
        assert_eq!(Fraction::zero().floor_log2(), None);
    }

    #[test]
    fn test_floor_log2_huge_denominator() {
        let tiny = Fraction::pow2(-5000);
        assert_eq!(tiny.floor_log2(), Some(-5000));
        assert!((tiny.log2() + 5000.0).abs() < 1e-9);
    }

    #[test]
    fn test_pow2_and_dyadic() {
        assert_eq!(Fraction::pow2(3), Fraction::from(8));
        assert_eq!(Fraction::pow2(-3), frac(1, 8));
        assert_eq!(Fraction::dyadic(BigUint::from(6u32), 4), frac(3, 8));
        assert_eq!(frac(3, 8).denom_log2(), Some(3));
        assert_eq!(frac(1, 3).denom_log2(), None);
        assert_eq!(Fraction::zero().denom_log2(), Some(0));
    }

    #[test]
    fn test_scaled_floor() {
        assert_eq!(frac(3, 4).scaled_floor(8), BigInt::from(192));
        assert_eq!(frac(1, 3).scaled_floor(8), BigInt::from(85));
    }

    #[test]
    fn test_sum() {
        let parts = [frac(1, 2), frac(1, 4), frac(1, 4)];
        assert_eq!(parts.iter().sum::<Fraction>(), Fraction::one());
    }

    #[test]
    fn test_display() {
        assert_eq!(frac(3, 4).to_string(), "3/4");
        assert_eq!(Fraction::from(5).to_string(), "5");
    }

    proptest! {
        #[test]
        fn test_floor_log2_matches_float(numer in 1u64..1_000_000, denom in 1u64..1_000_000) {
            let value = frac(numer, denom);
            let exact = value.floor_log2().unwrap();
            let float = (numer as f64 / denom as f64).log2();
            // Skip values whose float logarithm sits on an integer boundary.
            prop_assume!((float - float.round()).abs() > 1e-9);
            prop_assert_eq!(exact, float.floor() as i64);
        }

        #[test]
        fn test_add_then_sub_is_identity(a in 0u64..10_000, b in 1u64..10_000, c in 0u64..10_000, d in 1u64..10_000) {
            let x = frac(a, b);
            let y = frac(c, d);
            prop_assert_eq!(&(&x + &y) - &y, x);
        }
    }
}
