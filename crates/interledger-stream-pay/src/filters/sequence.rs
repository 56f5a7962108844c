use super::StreamPacketFilter;
use crate::error::SendState;
use crate::request::StreamRequest;
use crate::trackers::PaymentSharedStateTracker;
use std::sync::Arc;
use tracing::warn;

/// AES-256-GCM with random nonces is only safe for about 2^32 messages per key.
/// The receiver encrypts a reply for every packet, so stop well short of that.
const MAX_PACKETS_PER_CONNECTION: u64 = 1 << 31;

/// Gives every packet the next sequence number on the connection.
pub struct SequenceFilter {
    state: Arc<PaymentSharedStateTracker>,
}

impl SequenceFilter {
    pub fn new(state: Arc<PaymentSharedStateTracker>) -> Self {
        SequenceFilter { state }
    }
}

impl StreamPacketFilter for SequenceFilter {
    fn next_state(&self, request: &mut StreamRequest) -> SendState {
        let sequence = self.state.sequences_used() + 1;
        if sequence > MAX_PACKETS_PER_CONNECTION {
            warn!("Sent {} packets on one connection, ending payment", sequence - 1);
            return SendState::MaxSafeEncryptionLimit;
        }
        request.sequence = sequence;
        SendState::Ready
    }

    fn on_send(&self, request: &StreamRequest) {
        let sequence = self.state.next_sequence();
        debug_assert_eq!(sequence, request.sequence);
    }
}
