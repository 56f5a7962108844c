use super::{
    AmountTracker, AssetDetailsTracker, ExchangeRateTracker, InMemoryAmountTracker,
    InMemoryAssetDetailsTracker, InMemoryExchangeRateTracker, InMemoryMaxPacketAmountTracker,
    InMemoryPacingTracker, MaxPacketAmountTracker, PacingTracker,
};
use crate::config::StreamPayerConfig;
use crate::connection::{AccountDetails, StreamConnection};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Everything learned about one connection, shared by the prober and the
/// send loop for as long as the quote and payment attempt live.
pub struct PaymentSharedStateTracker {
    connection: StreamConnection,
    asset_details: Box<dyn AssetDetailsTracker>,
    exchange_rate: Box<dyn ExchangeRateTracker>,
    max_packet_amount: Box<dyn MaxPacketAmountTracker>,
    pacing: Box<dyn PacingTracker>,
    amount: Box<dyn AmountTracker>,
    next_sequence: AtomicU64,
    receiver_reached: AtomicBool,
}

impl PaymentSharedStateTracker {
    pub fn new(connection: StreamConnection, config: &StreamPayerConfig) -> Self {
        let asset_details = InMemoryAssetDetailsTracker::new(
            connection.source_account().clone(),
            AccountDetails::new(connection.destination_address().clone(), None),
        );
        PaymentSharedStateTracker::with_trackers(
            connection,
            Box::new(asset_details),
            Box::new(InMemoryExchangeRateTracker::new()),
            Box::new(InMemoryMaxPacketAmountTracker::new()),
            Box::new(InMemoryPacingTracker::new(config)),
            Box::new(InMemoryAmountTracker::new()),
        )
    }

    /// Use other tracker implementations than the in-memory ones.
    pub fn with_trackers(
        connection: StreamConnection,
        asset_details: Box<dyn AssetDetailsTracker>,
        exchange_rate: Box<dyn ExchangeRateTracker>,
        max_packet_amount: Box<dyn MaxPacketAmountTracker>,
        pacing: Box<dyn PacingTracker>,
        amount: Box<dyn AmountTracker>,
    ) -> Self {
        PaymentSharedStateTracker {
            connection,
            asset_details,
            exchange_rate,
            max_packet_amount,
            pacing,
            amount,
            next_sequence: AtomicU64::new(1),
            receiver_reached: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn connection(&self) -> &StreamConnection {
        &self.connection
    }

    #[inline]
    pub fn asset_details(&self) -> &dyn AssetDetailsTracker {
        self.asset_details.as_ref()
    }

    #[inline]
    pub fn exchange_rate(&self) -> &dyn ExchangeRateTracker {
        self.exchange_rate.as_ref()
    }

    #[inline]
    pub fn max_packet_amount(&self) -> &dyn MaxPacketAmountTracker {
        self.max_packet_amount.as_ref()
    }

    #[inline]
    pub fn pacing(&self) -> &dyn PacingTracker {
        self.pacing.as_ref()
    }

    #[inline]
    pub fn amount(&self) -> &dyn AmountTracker {
        self.amount.as_ref()
    }

    /// Sequence numbers start at 1 and are never reused on a connection.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of sequences handed out so far.
    pub fn sequences_used(&self) -> u64 {
        self.next_sequence.load(Ordering::SeqCst) - 1
    }

    /// Our address and asset details are sent until the receiver has replied once.
    pub fn should_send_connection_details(&self) -> bool {
        !self.receiver_reached.load(Ordering::SeqCst)
    }

    pub fn set_receiver_reached(&self) {
        self.receiver_reached.store(true, Ordering::SeqCst);
    }
}
