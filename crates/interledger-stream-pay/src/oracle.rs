use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ExchangeRateError {
    #[error("No exchange rate for asset: {0}")]
    MissingRate(String),
    #[error("Exchange rate for asset {0} must be positive")]
    InvalidRate(String),
}

/// External source of market exchange rates.
pub trait ExchangeRateProvider: Send + Sync {
    /// How many units of `destination_asset` one unit of `source_asset` buys.
    fn get_exchange_rate(
        &self,
        source_asset: &str,
        destination_asset: &str,
    ) -> Result<Decimal, ExchangeRateError>;
}

/// Keeps one rate per asset code, each relative to a shared base asset
/// (how many units of the asset one unit of the base buys).
#[derive(Clone, Default)]
pub struct InMemoryExchangeRateProvider {
    rates: Arc<RwLock<HashMap<String, Decimal>>>,
}

impl InMemoryExchangeRateProvider {
    pub fn new(rates: HashMap<String, Decimal>) -> Self {
        InMemoryExchangeRateProvider {
            rates: Arc::new(RwLock::new(rates)),
        }
    }

    /// Replace all rates at once.
    pub fn set_exchange_rates(&self, rates: HashMap<String, Decimal>) {
        *self.rates.write() = rates;
    }

    fn get_rate(&self, asset_code: &str) -> Result<Decimal, ExchangeRateError> {
        match self.rates.read().get(asset_code) {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            Some(_) => Err(ExchangeRateError::InvalidRate(asset_code.to_string())),
            None => Err(ExchangeRateError::MissingRate(asset_code.to_string())),
        }
    }
}

impl ExchangeRateProvider for InMemoryExchangeRateProvider {
    fn get_exchange_rate(
        &self,
        source_asset: &str,
        destination_asset: &str,
    ) -> Result<Decimal, ExchangeRateError> {
        if source_asset == destination_asset {
            return Ok(Decimal::ONE);
        }
        let source_rate = self.get_rate(source_asset)?;
        let destination_rate = self.get_rate(destination_asset)?;
        destination_rate
            .checked_div(source_rate)
            .ok_or_else(|| ExchangeRateError::InvalidRate(source_asset.to_string()))
    }
}
