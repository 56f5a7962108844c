use interledger_packet::MaxPacketAmountDetails;
use parking_lot::RwLock;
use std::fmt;
use tracing::{debug, warn};

/// The most a single packet can carry over the path, in source units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxPacketAmount {
    /// Derived exactly from an F08 reject, or confirmed by a delivered packet
    PreciseMax(u64),
    /// An upper bound that may be higher than the real limit
    ImpreciseMax(u64),
    /// No packet has been rejected for being too large
    UnknownMax,
}

impl MaxPacketAmount {
    pub fn value(self) -> Option<u64> {
        match self {
            MaxPacketAmount::PreciseMax(amount) | MaxPacketAmount::ImpreciseMax(amount) => {
                Some(amount)
            }
            MaxPacketAmount::UnknownMax => None,
        }
    }

    pub fn is_precise(self) -> bool {
        match self {
            MaxPacketAmount::PreciseMax(_) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MaxPacketAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MaxPacketAmount::PreciseMax(amount) => write!(f, "precise max of {}", amount),
            MaxPacketAmount::ImpreciseMax(amount) => write!(f, "imprecise max of {}", amount),
            MaxPacketAmount::UnknownMax => f.write_str("unknown max"),
        }
    }
}

pub trait MaxPacketAmountTracker: Send + Sync {
    fn max_packet_amount(&self) -> MaxPacketAmount;

    /// Handle an F08 reject for a packet of `source_amount`. The details are
    /// `None` if the connector did not attach any readable ones.
    fn reduce_max_packet_amount(
        &self,
        source_amount: u64,
        details: Option<MaxPacketAmountDetails>,
    ) -> MaxPacketAmount;

    /// A packet of `source_amount` made it to the receiver.
    fn adjust_path_capacity(&self, source_amount: u64);

    fn verified_path_capacity(&self) -> u64;

    /// Largest packet worth sending next. Unbounded when nothing is known.
    fn next_max_packet_amount(&self) -> u64 {
        self.max_packet_amount()
            .value()
            .unwrap_or_else(u64::max_value)
    }

    /// Whether more probing could still change the max packet amount.
    fn is_stable(&self) -> bool {
        match self.max_packet_amount() {
            MaxPacketAmount::PreciseMax(_) => true,
            MaxPacketAmount::ImpreciseMax(_) => false,
            MaxPacketAmount::UnknownMax => self.verified_path_capacity() > 0,
        }
    }
}

pub struct InMemoryMaxPacketAmountTracker {
    state: RwLock<PathCapacity>,
}

struct PathCapacity {
    max_packet_amount: MaxPacketAmount,
    verified_capacity: u64,
}

impl Default for InMemoryMaxPacketAmountTracker {
    fn default() -> Self {
        InMemoryMaxPacketAmountTracker {
            state: RwLock::new(PathCapacity {
                max_packet_amount: MaxPacketAmount::UnknownMax,
                verified_capacity: 0,
            }),
        }
    }
}

impl InMemoryMaxPacketAmountTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

fn max_from_details(
    source_amount: u64,
    details: Option<MaxPacketAmountDetails>,
) -> MaxPacketAmount {
    match details {
        Some(details)
            if details.amount_received() > 0 && details.max_amount() < details.amount_received() =>
        {
            let scaled = u128::from(source_amount) * u128::from(details.max_amount());
            let received = u128::from(details.amount_received());
            let max = (scaled / received) as u64;
            if scaled % received == 0 {
                MaxPacketAmount::PreciseMax(max)
            } else {
                MaxPacketAmount::ImpreciseMax(max)
            }
        }
        Some(details) => {
            warn!(
                "F08 reject has inconsistent details: received {}, maximum {}",
                details.amount_received(),
                details.max_amount()
            );
            MaxPacketAmount::ImpreciseMax(source_amount.saturating_sub(1))
        }
        None => MaxPacketAmount::ImpreciseMax(source_amount.saturating_sub(1)),
    }
}

impl MaxPacketAmountTracker for InMemoryMaxPacketAmountTracker {
    fn max_packet_amount(&self) -> MaxPacketAmount {
        self.state.read().max_packet_amount
    }

    fn reduce_max_packet_amount(
        &self,
        source_amount: u64,
        details: Option<MaxPacketAmountDetails>,
    ) -> MaxPacketAmount {
        let candidate = max_from_details(source_amount, details);
        let mut state = self.state.write();
        let should_update = match (state.max_packet_amount, candidate) {
            (MaxPacketAmount::UnknownMax, _) => true,
            (MaxPacketAmount::ImpreciseMax(old), MaxPacketAmount::PreciseMax(new)) => new <= old,
            (MaxPacketAmount::ImpreciseMax(old), MaxPacketAmount::ImpreciseMax(new)) => new < old,
            (MaxPacketAmount::PreciseMax(old), MaxPacketAmount::PreciseMax(new)) => new < old,
            _ => false,
        };
        if should_update {
            debug!(
                "Max packet amount changed from {} to {}",
                state.max_packet_amount, candidate
            );
            state.max_packet_amount = candidate;
            if let Some(max) = candidate.value() {
                if state.verified_capacity > max {
                    warn!(
                        "Path capacity dropped below the verified amount of {}",
                        state.verified_capacity
                    );
                    state.verified_capacity = max;
                }
            }
            // A packet of exactly the new max already got through
            if let MaxPacketAmount::ImpreciseMax(max) = candidate {
                if state.verified_capacity >= max && max > 0 {
                    state.max_packet_amount = MaxPacketAmount::PreciseMax(max);
                }
            }
        }
        state.max_packet_amount
    }

    fn adjust_path_capacity(&self, source_amount: u64) {
        let mut state = self.state.write();
        if source_amount <= state.verified_capacity {
            return;
        }
        state.verified_capacity = source_amount;
        if let MaxPacketAmount::ImpreciseMax(max) = state.max_packet_amount {
            if source_amount >= max {
                debug!("Verified path capacity reached the max packet amount of {}", max);
                state.max_packet_amount = MaxPacketAmount::PreciseMax(max);
            }
        }
    }

    fn verified_path_capacity(&self) -> u64 {
        self.state.read().verified_capacity
    }
}
