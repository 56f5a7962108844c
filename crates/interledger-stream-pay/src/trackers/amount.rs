use crate::rates::Ratio;
use parking_lot::RwLock;

/// Payment target and progress, in ledger units.
pub trait AmountTracker: Send + Sync {
    fn set_payment_target(
        &self,
        max_source_amount: u64,
        min_delivery_amount: u64,
        min_exchange_rate: Ratio,
    );

    fn max_source_amount(&self) -> u64;

    fn min_delivery_amount(&self) -> u64;

    fn min_exchange_rate(&self) -> Ratio;

    /// Source amount neither sent nor in flight.
    fn remaining_source_amount(&self) -> u64;

    /// Hold `source_amount` for a packet that is about to be sent.
    fn reserve(&self, source_amount: u64);

    fn on_fulfill(&self, source_amount: u64, destination_amount: u64);

    fn on_reject(&self, source_amount: u64);

    /// Remember what the receiver said it can take on the stream.
    fn set_receive_max(&self, receive_max: u64, total_received: u64);

    fn receive_max(&self) -> Option<(u64, u64)>;

    fn amount_sent(&self) -> u64;

    fn amount_in_flight(&self) -> u64;

    fn amount_delivered(&self) -> u64;

    fn fulfilled_packets(&self) -> u64;

    fn rejected_packets(&self) -> u64;
}

pub struct InMemoryAmountTracker {
    state: RwLock<Amounts>,
}

struct Amounts {
    max_source_amount: u64,
    min_delivery_amount: u64,
    min_exchange_rate: Ratio,
    sent: u64,
    in_flight: u64,
    delivered: u64,
    receive_max: Option<(u64, u64)>,
    fulfilled_packets: u64,
    rejected_packets: u64,
}

impl Default for InMemoryAmountTracker {
    fn default() -> Self {
        InMemoryAmountTracker {
            state: RwLock::new(Amounts {
                max_source_amount: 0,
                min_delivery_amount: 0,
                min_exchange_rate: Ratio::zero(),
                sent: 0,
                in_flight: 0,
                delivered: 0,
                receive_max: None,
                fulfilled_packets: 0,
                rejected_packets: 0,
            }),
        }
    }
}

impl InMemoryAmountTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AmountTracker for InMemoryAmountTracker {
    fn set_payment_target(
        &self,
        max_source_amount: u64,
        min_delivery_amount: u64,
        min_exchange_rate: Ratio,
    ) {
        let mut state = self.state.write();
        state.max_source_amount = max_source_amount;
        state.min_delivery_amount = min_delivery_amount;
        state.min_exchange_rate = min_exchange_rate;
    }

    fn max_source_amount(&self) -> u64 {
        self.state.read().max_source_amount
    }

    fn min_delivery_amount(&self) -> u64 {
        self.state.read().min_delivery_amount
    }

    fn min_exchange_rate(&self) -> Ratio {
        self.state.read().min_exchange_rate.clone()
    }

    fn remaining_source_amount(&self) -> u64 {
        let state = self.state.read();
        state
            .max_source_amount
            .saturating_sub(state.sent)
            .saturating_sub(state.in_flight)
    }

    fn reserve(&self, source_amount: u64) {
        let mut state = self.state.write();
        state.in_flight = state.in_flight.saturating_add(source_amount);
    }

    fn on_fulfill(&self, source_amount: u64, destination_amount: u64) {
        let mut state = self.state.write();
        state.in_flight = state.in_flight.saturating_sub(source_amount);
        state.sent = state.sent.saturating_add(source_amount);
        state.delivered = state.delivered.saturating_add(destination_amount);
        state.fulfilled_packets += 1;
    }

    fn on_reject(&self, source_amount: u64) {
        let mut state = self.state.write();
        state.in_flight = state.in_flight.saturating_sub(source_amount);
        state.rejected_packets += 1;
    }

    fn set_receive_max(&self, receive_max: u64, total_received: u64) {
        self.state.write().receive_max = Some((receive_max, total_received));
    }

    fn receive_max(&self) -> Option<(u64, u64)> {
        self.state.read().receive_max
    }

    fn amount_sent(&self) -> u64 {
        self.state.read().sent
    }

    fn amount_in_flight(&self) -> u64 {
        self.state.read().in_flight
    }

    fn amount_delivered(&self) -> u64 {
        self.state.read().delivered
    }

    fn fulfilled_packets(&self) -> u64 {
        self.state.read().fulfilled_packets
    }

    fn rejected_packets(&self) -> u64 {
        self.state.read().rejected_packets
    }
}
