use num::{BigInt, Integer, One, Signed, ToPrimitive, Zero};
use rust_decimal::Decimal;
use std::{
    cmp::Ordering,
    fmt,
    ops::{Mul, Sub},
};

/// Largest number of fractional digits a `Decimal` can carry.
const MAX_DECIMAL_SCALE: u32 = 28;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RatioError {
    #[error("Ratio denominator must not be zero")]
    ZeroDenominator,
}

/// An exact fraction of two arbitrary-precision integers.
///
/// Ratios are always kept reduced with a strictly positive denominator, so the sign
/// lives in the numerator and two equal values always have the same representation.
#[derive(Clone, Eq, Hash)]
pub struct Ratio {
    numerator: BigInt,
    denominator: BigInt,
}

impl Ratio {
    pub fn new<N, D>(numerator: N, denominator: D) -> Result<Self, RatioError>
    where
        N: Into<BigInt>,
        D: Into<BigInt>,
    {
        let denominator = denominator.into();
        if denominator.is_zero() {
            return Err(RatioError::ZeroDenominator);
        }
        Ok(Ratio::reduce(numerator.into(), denominator))
    }

    pub fn zero() -> Self {
        Ratio {
            numerator: BigInt::zero(),
            denominator: BigInt::one(),
        }
    }

    pub fn one() -> Self {
        Ratio {
            numerator: BigInt::one(),
            denominator: BigInt::one(),
        }
    }

    /// Exact conversion: a decimal is `mantissa / 10^scale`.
    pub fn from_decimal(value: Decimal) -> Self {
        Ratio::reduce(
            bigint_from_i128(value.mantissa()),
            pow10(value.scale() as usize),
        )
    }

    fn reduce(mut numerator: BigInt, mut denominator: BigInt) -> Self {
        if denominator.is_negative() {
            numerator = -numerator;
            denominator = -denominator;
        }
        let gcd = numerator.gcd(&denominator);
        if !gcd.is_zero() && !gcd.is_one() {
            numerator = numerator / &gcd;
            denominator = denominator / &gcd;
        }
        Ratio {
            numerator,
            denominator,
        }
    }

    #[inline]
    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    #[inline]
    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.numerator.is_positive()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    /// Returns `None` for zero, which has no reciprocal.
    pub fn reciprocal(&self) -> Option<Ratio> {
        if self.is_zero() {
            None
        } else {
            Some(Ratio::reduce(
                self.denominator.clone(),
                self.numerator.clone(),
            ))
        }
    }

    /// Multiply by `10^exponent`.
    pub fn shift(&self, exponent: i32) -> Ratio {
        let factor = pow10(exponent.abs() as usize);
        if exponent >= 0 {
            Ratio::reduce(&self.numerator * factor, self.denominator.clone())
        } else {
            Ratio::reduce(self.numerator.clone(), &self.denominator * factor)
        }
    }

    pub fn floor(&self) -> BigInt {
        self.numerator.div_floor(&self.denominator)
    }

    pub fn ceil(&self) -> BigInt {
        -((-&self.numerator).div_floor(&self.denominator))
    }

    /// `floor(amount × self)`, clamped to the `u64` range.
    pub fn multiply_floor(&self, amount: u64) -> u64 {
        clamp_to_u64(&(self * &Ratio::from(amount)).floor())
    }

    /// Converts to the closest `Decimal` carrying as many fractional digits as fit
    /// (rounding half away from zero). Returns `None` if the integer part is too
    /// large for a `Decimal`.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let max_mantissa: BigInt = (BigInt::one() << 96) - BigInt::one();
        let magnitude = self.numerator.abs();
        let two = BigInt::from(2u8);
        let twice_denominator = &self.denominator * &two;
        for scale in (0..=MAX_DECIMAL_SCALE).rev() {
            let scaled = &magnitude * pow10(scale as usize) * &two + &self.denominator;
            let mantissa = scaled / &twice_denominator;
            if mantissa <= max_mantissa {
                let low = (&mantissa % (BigInt::one() << 64)).to_u64()?;
                let high = (&mantissa >> 64).to_u64()?;
                let decimal = Decimal::from_parts(
                    low as u32,
                    (low >> 32) as u32,
                    high as u32,
                    self.numerator.is_negative(),
                    scale,
                );
                return Some(decimal.normalize());
            }
        }
        None
    }
}

impl From<u64> for Ratio {
    fn from(value: u64) -> Self {
        Ratio {
            numerator: BigInt::from(value),
            denominator: BigInt::one(),
        }
    }
}

impl From<Decimal> for Ratio {
    fn from(value: Decimal) -> Self {
        Ratio::from_decimal(value)
    }
}

impl<'a, 'b> Mul<&'b Ratio> for &'a Ratio {
    type Output = Ratio;

    fn mul(self, other: &'b Ratio) -> Ratio {
        Ratio::reduce(
            &self.numerator * &other.numerator,
            &self.denominator * &other.denominator,
        )
    }
}

impl<'a, 'b> Sub<&'b Ratio> for &'a Ratio {
    type Output = Ratio;

    fn sub(self, other: &'b Ratio) -> Ratio {
        Ratio::reduce(
            &self.numerator * &other.denominator - &other.numerator * &self.denominator,
            &self.denominator * &other.denominator,
        )
    }
}

impl PartialEq for Ratio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        // Denominators are positive, so cross-multiplying preserves the order
        (&self.numerator * &other.denominator).cmp(&(&other.numerator * &self.denominator))
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.to_decimal() {
            Some(decimal) => write!(f, "{}", decimal),
            None => write!(f, "{}/{}", self.numerator, self.denominator),
        }
    }
}

impl fmt::Debug for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Ratio({}/{})", self.numerator, self.denominator)
    }
}

fn pow10(exponent: usize) -> BigInt {
    num::pow(BigInt::from(10u8), exponent)
}

fn bigint_from_i128(value: i128) -> BigInt {
    let magnitude = value.unsigned_abs();
    let combined =
        (BigInt::from((magnitude >> 64) as u64) << 64) + BigInt::from(magnitude as u64);
    if value < 0 {
        -combined
    } else {
        combined
    }
}

fn clamp_to_u64(value: &BigInt) -> u64 {
    if value.is_negative() {
        0
    } else {
        value.to_u64().unwrap_or(u64::max_value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_zero_denominator() {
        assert_eq!(Ratio::new(1, 0).unwrap_err(), RatioError::ZeroDenominator);
    }

    #[test]
    fn reduces_and_normalizes_sign() {
        let ratio = Ratio::new(-10, -4).unwrap();
        assert_eq!(ratio.numerator(), &BigInt::from(5));
        assert_eq!(ratio.denominator(), &BigInt::from(2));
        assert!(ratio.is_positive());
        assert!(!Ratio::new(3, -4).unwrap().is_positive());
    }

    #[test]
    fn compares_by_value() {
        assert_eq!(Ratio::new(2, 4).unwrap(), Ratio::new(1, 2).unwrap());
        assert!(Ratio::new(98, 100).unwrap() < Ratio::from_decimal(dec!(0.99)));
        assert!(Ratio::new(-1, 3).unwrap() < Ratio::zero());
        assert!(Ratio::one() > Ratio::zero());
    }

    #[test]
    fn converts_from_and_to_decimal() {
        let ratio = Ratio::from_decimal(dec!(0.8928571428571428));
        assert_eq!(ratio.to_decimal().unwrap(), dec!(0.8928571428571428));
        assert_eq!(Ratio::new(1, 3).unwrap().to_decimal().unwrap().round_dp(6), dec!(0.333333));
        assert_eq!(Ratio::new(-5, 2).unwrap().to_decimal().unwrap(), dec!(-2.5));
        assert_eq!(Ratio::new(98, 100).unwrap().to_string(), "0.98");
    }

    #[test]
    fn floors_and_ceils() {
        let ratio = Ratio::new(7, 2).unwrap();
        assert_eq!(ratio.floor(), BigInt::from(3));
        assert_eq!(ratio.ceil(), BigInt::from(4));
        let negative = Ratio::new(-7, 2).unwrap();
        assert_eq!(negative.floor(), BigInt::from(-4));
        assert_eq!(negative.ceil(), BigInt::from(-3));
        assert_eq!(Ratio::new(4, 2).unwrap().ceil(), BigInt::from(2));
    }

    #[test]
    fn multiplies_amounts() {
        let rate = Ratio::new(1, 4).unwrap();
        assert_eq!(rate.multiply_floor(10), 2);
        assert_eq!(
            Ratio::new(3, 1).unwrap().multiply_floor(u64::max_value()),
            u64::max_value()
        );
    }

    #[test]
    fn shifts_by_powers_of_ten() {
        assert_eq!(Ratio::one().shift(-2), Ratio::new(1, 100).unwrap());
        assert_eq!(Ratio::from(250).shift(3), Ratio::from(250_000));
    }

    #[test]
    fn reciprocal_of_zero_is_none() {
        assert!(Ratio::zero().reciprocal().is_none());
        assert_eq!(
            Ratio::new(2, 3).unwrap().reciprocal().unwrap(),
            Ratio::new(3, 2).unwrap()
        );
    }
}
