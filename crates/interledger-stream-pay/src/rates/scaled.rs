use super::{Ratio, Slippage};
use crate::connection::AccountDetails;
use rust_decimal::Decimal;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("Source account has no denomination")]
    UnknownSourceAsset,
    #[error("Destination account has no denomination")]
    UnknownDestinationAsset,
    #[error("Exchange rate must be positive, got: {0}")]
    NonPositiveRate(Decimal),
    #[error("Exchange rate {0} cannot be represented after scaling")]
    Overflow(String),
}

/// Converts a rate between two pairs of ledger units: `rate × 10^(first_scale − second_scale)`.
pub fn shift_rate_for_normalization(rate: &Ratio, first_scale: u8, second_scale: u8) -> Ratio {
    rate.shift(i32::from(first_scale) - i32::from(second_scale))
}

/// Turns a market rate between two assets (in whole units) into a rate between
/// source and destination ledger units, with slippage bounds applied.
///
/// One source ledger unit is `10^-source_scale` of the asset and one destination
/// ledger unit is `10^-destination_scale`, so the market rate is shifted by
/// `destination_scale − source_scale`.
pub fn determine_scaled_external_rate(
    source_account: &AccountDetails,
    destination_account: &AccountDetails,
    external_rate: Decimal,
    slippage: Slippage,
) -> Result<ScaledExchangeRate, RateError> {
    let source = source_account
        .denomination()
        .ok_or(RateError::UnknownSourceAsset)?;
    let destination = destination_account
        .denomination()
        .ok_or(RateError::UnknownDestinationAsset)?;
    if external_rate <= Decimal::ZERO {
        return Err(RateError::NonPositiveRate(external_rate));
    }

    let shifted = shift_rate_for_normalization(
        &Ratio::from_decimal(external_rate),
        destination.asset_scale(),
        source.asset_scale(),
    );
    let value = shifted
        .to_decimal()
        .ok_or_else(|| RateError::Overflow(shifted.to_string()))?;
    ScaledExchangeRate::new(value, source.asset_scale(), slippage)
}

/// An exchange rate expressed in ledger units, together with the range that the
/// slippage tolerance allows around it.
#[derive(Clone, Debug, PartialEq)]
pub struct ScaledExchangeRate {
    input_scale: u8,
    value: Decimal,
    slippage: Slippage,
    lower_bound: Decimal,
    upper_bound: Decimal,
    reciprocal: Decimal,
}

impl ScaledExchangeRate {
    pub fn new(value: Decimal, input_scale: u8, slippage: Slippage) -> Result<Self, RateError> {
        if value <= Decimal::ZERO {
            return Err(RateError::NonPositiveRate(value));
        }
        let fraction = slippage.value().as_fraction();
        let overflow = || RateError::Overflow(value.to_string());
        let lower_bound = value
            .checked_mul(Decimal::ONE - fraction)
            .ok_or_else(overflow)?;
        let upper_bound = value
            .checked_mul(Decimal::ONE + fraction)
            .ok_or_else(overflow)?;
        let reciprocal = Decimal::ONE.checked_div(value).ok_or_else(overflow)?;
        Ok(ScaledExchangeRate {
            input_scale,
            value,
            slippage,
            lower_bound,
            upper_bound,
            reciprocal,
        })
    }

    #[inline]
    pub fn input_scale(&self) -> u8 {
        self.input_scale
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.value
    }

    #[inline]
    pub fn slippage(&self) -> Slippage {
        self.slippage
    }

    #[inline]
    pub fn lower_bound(&self) -> Decimal {
        self.lower_bound
    }

    #[inline]
    pub fn upper_bound(&self) -> Decimal {
        self.upper_bound
    }

    #[inline]
    pub fn reciprocal(&self) -> Decimal {
        self.reciprocal
    }
}
