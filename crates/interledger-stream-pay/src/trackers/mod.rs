mod amount;
mod asset_details;
mod exchange_rate;
mod max_packet;
mod pacing;
mod shared_state;

pub use amount::{AmountTracker, InMemoryAmountTracker};
pub use asset_details::{AssetDetailsTracker, InMemoryAssetDetailsTracker};
pub use exchange_rate::{ExchangeRateTracker, InMemoryExchangeRateTracker};
pub use max_packet::{InMemoryMaxPacketAmountTracker, MaxPacketAmount, MaxPacketAmountTracker};
pub use pacing::{InMemoryPacingTracker, PacingTracker};
pub use shared_state::PaymentSharedStateTracker;
