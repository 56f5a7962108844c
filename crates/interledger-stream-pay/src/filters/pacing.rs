use super::StreamPacketFilter;
use crate::error::SendState;
use crate::request::{StreamReply, StreamRequest};
use crate::trackers::PaymentSharedStateTracker;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Holds packets back while the pacing tracker says to wait, and reports
/// round trip times back to it.
pub struct PacingFilter {
    state: Arc<PaymentSharedStateTracker>,
    sent_at: Mutex<HashMap<u64, Instant>>,
}

impl PacingFilter {
    pub fn new(state: Arc<PaymentSharedStateTracker>) -> Self {
        PacingFilter {
            state,
            sent_at: Mutex::new(HashMap::new()),
        }
    }
}

impl StreamPacketFilter for PacingFilter {
    fn next_state(&self, _request: &mut StreamRequest) -> SendState {
        match self.state.pacing().next_packet_delay() {
            Some(_) => SendState::Wait,
            None => SendState::Ready,
        }
    }

    fn on_send(&self, request: &StreamRequest) {
        self.state.pacing().on_packet_sent();
        self.sent_at.lock().insert(request.sequence, Instant::now());
    }

    fn on_reply(&self, request: &StreamRequest, reply: &StreamReply) {
        let round_trip_time = match self.sent_at.lock().remove(&request.sequence) {
            Some(sent_at) => sent_at.elapsed(),
            None => return,
        };
        match reply {
            StreamReply::Fulfill(_) => self.state.pacing().on_packet_fulfilled(round_trip_time),
            StreamReply::Reject(reject) => self
                .state
                .pacing()
                .on_packet_rejected(reject.code, round_trip_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::{fulfill, reject, shared_state};
    use interledger_packet::ErrorCode;

    #[test]
    fn waits_between_packets_and_tracks_replies() {
        let state = shared_state();
        let filter = PacingFilter::new(state.clone());
        let mut request = StreamRequest {
            sequence: 1,
            ..StreamRequest::default()
        };
        assert_eq!(filter.next_state(&mut request), SendState::Ready);
        filter.on_send(&request);
        assert_eq!(state.pacing().packets_in_flight(), 1);
        // 40 packets per second by default
        assert_eq!(filter.next_state(&mut request), SendState::Wait);

        let rate = state.pacing().packets_per_second();
        filter.on_reply(&request, &fulfill(1));
        assert_eq!(state.pacing().packets_in_flight(), 0);
        assert!(state.pacing().packets_per_second() > rate);

        request.sequence = 2;
        filter.on_send(&request);
        filter.on_reply(&request, &reject(ErrorCode::T05_RATE_LIMITED, None));
        assert!(state.pacing().packets_per_second() < rate);
    }
}
