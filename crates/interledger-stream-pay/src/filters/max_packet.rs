use super::StreamPacketFilter;
use crate::error::SendState;
use crate::request::{StreamReply, StreamRequest};
use crate::trackers::PaymentSharedStateTracker;
use interledger_packet::{ErrorCode, MaxPacketAmountDetails};
use std::sync::Arc;

pub struct MaxPacketAmountFilter {
    state: Arc<PaymentSharedStateTracker>,
}

impl MaxPacketAmountFilter {
    pub fn new(state: Arc<PaymentSharedStateTracker>) -> Self {
        MaxPacketAmountFilter { state }
    }
}

impl StreamPacketFilter for MaxPacketAmountFilter {
    fn next_state(&self, _request: &mut StreamRequest) -> SendState {
        if self.state.max_packet_amount().next_max_packet_amount() == 0 {
            return SendState::ExchangeRateRoundingError;
        }
        SendState::Ready
    }

    fn on_reply(&self, request: &StreamRequest, reply: &StreamReply) {
        let tracker = self.state.max_packet_amount();
        match reply.reject() {
            Some(reject) if reject.code == ErrorCode::F08_AMOUNT_TOO_LARGE => {
                let details = MaxPacketAmountDetails::from_bytes(&reject.data).ok();
                tracker.reduce_max_packet_amount(request.source_amount, details);
            }
            _ if reply.receiver().is_some() => {
                tracker.adjust_path_capacity(request.source_amount)
            }
            _ => {}
        }
    }
}
