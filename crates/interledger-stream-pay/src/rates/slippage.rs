use rust_decimal::Decimal;
use std::fmt;

/// A percentage, where `Percentage::of(Decimal::ONE)` is 1%.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Percentage(Decimal);

impl Percentage {
    pub const fn of(percent: Decimal) -> Self {
        Percentage(percent)
    }

    /// `0.01` becomes 1%.
    pub fn from_fraction(fraction: Decimal) -> Self {
        Percentage(fraction * Decimal::new(100, 0))
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn as_fraction(&self) -> Decimal {
        self.0 / Decimal::new(100, 0)
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SlippageError {
    #[error("Slippage must be a percentage between 0% and 100% (inclusive)")]
    OutOfRange(Percentage),
}

/// The tolerated degradation from the external exchange rate, between 0% and 100%.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Slippage(Percentage);

impl Slippage {
    pub const NONE: Slippage = Slippage(Percentage(Decimal::ZERO));
    pub const ONE_PERCENT: Slippage = Slippage(Percentage(Decimal::ONE));

    pub fn new(percentage: Percentage) -> Result<Self, SlippageError> {
        let value = percentage.value();
        if value < Decimal::ZERO || value > Decimal::new(100, 0) {
            Err(SlippageError::OutOfRange(percentage))
        } else {
            Ok(Slippage(percentage))
        }
    }

    #[inline]
    pub fn value(&self) -> Percentage {
        self.0
    }
}

impl Default for Slippage {
    fn default() -> Self {
        Slippage::ONE_PERCENT
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn accepts_zero_through_one_hundred_percent() {
        for percent in &[dec!(0), dec!(0.5), dec!(1), dec!(50), dec!(99.999), dec!(100)] {
            let slippage = Slippage::new(Percentage::of(*percent)).unwrap();
            assert_eq!(slippage.value().value(), *percent);
        }
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        for percent in &[dec!(-0.0001), dec!(-1), dec!(100.0001), dec!(1000)] {
            let err = Slippage::new(Percentage::of(*percent)).unwrap_err();
            assert_eq!(
                err.to_string(),
                "Slippage must be a percentage between 0% and 100% (inclusive)"
            );
        }
    }

    #[test]
    fn constants() {
        assert_eq!(Slippage::NONE.value().as_fraction(), dec!(0));
        assert_eq!(Slippage::ONE_PERCENT.value().as_fraction(), dec!(0.01));
        assert_eq!(Slippage::default(), Slippage::ONE_PERCENT);
        assert_eq!(Percentage::from_fraction(dec!(0.015)).value(), dec!(1.5));
        assert_eq!(Slippage::ONE_PERCENT.to_string(), "1%");
    }
}
