mod ratio;
mod scaled;
mod slippage;

pub use ratio::{Ratio, RatioError};
pub use scaled::{
    determine_scaled_external_rate, shift_rate_for_normalization, RateError, ScaledExchangeRate,
};
pub use slippage::{Percentage, Slippage, SlippageError};
