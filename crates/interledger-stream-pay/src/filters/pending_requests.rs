use super::StreamPacketFilter;
use crate::request::{StreamReply, StreamRequest};
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::warn;

/// Packets that were sent but have not been answered yet, by sequence.
///
/// A reply is matched against its packet before any filter acts on it, so a
/// reply to a packet that is not in flight, or a second reply to the same
/// packet, never moves the amounts or the rate.
#[derive(Default)]
pub struct PendingRequestsFilter {
    pending: Mutex<HashMap<u64, StreamRequest>>,
}

impl PendingRequestsFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StreamPacketFilter for PendingRequestsFilter {
    fn on_send(&self, request: &StreamRequest) {
        if let Some(previous) = self.pending.lock().insert(request.sequence, request.clone()) {
            warn!(
                "Sequence {} was reused while a packet of {} was still in flight",
                previous.sequence, previous.source_amount
            );
        }
    }

    fn is_reply_expected(&self, request: &StreamRequest) -> bool {
        match self.pending.lock().get(&request.sequence) {
            Some(sent) => sent == request,
            None => {
                warn!("Got a reply for packet {} which is not in flight", request.sequence);
                false
            }
        }
    }

    fn on_reply(&self, request: &StreamRequest, _reply: &StreamReply) {
        self.pending.lock().remove(&request.sequence);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::fulfill;

    #[test]
    fn expects_one_reply_per_packet_in_flight() {
        let filter = PendingRequestsFilter::new();
        let first = StreamRequest {
            sequence: 1,
            source_amount: 10,
            ..StreamRequest::default()
        };
        let second = StreamRequest {
            sequence: 2,
            ..first.clone()
        };
        filter.on_send(&first);
        filter.on_send(&second);
        assert!(filter.is_reply_expected(&first));
        assert!(filter.is_reply_expected(&second));

        filter.on_reply(&first, &fulfill(5));
        assert!(!filter.is_reply_expected(&first));
        assert!(filter.is_reply_expected(&second));

        // Never sent, or sent with different contents
        let unknown = StreamRequest {
            sequence: 3,
            ..first.clone()
        };
        assert!(!filter.is_reply_expected(&unknown));
        let altered = StreamRequest {
            source_amount: 11,
            ..second
        };
        assert!(!filter.is_reply_expected(&altered));
    }
}
