use super::StreamPacketFilter;
use crate::error::SendState;
use crate::request::{StreamReply, StreamRequest};
use crate::trackers::PaymentSharedStateTracker;
use std::sync::Arc;
use tracing::{debug, warn};

/// Sizes each packet and decides when the payment is complete.
pub struct AmountFilter {
    state: Arc<PaymentSharedStateTracker>,
}

impl AmountFilter {
    pub fn new(state: Arc<PaymentSharedStateTracker>) -> Self {
        AmountFilter { state }
    }
}

impl StreamPacketFilter for AmountFilter {
    fn next_state(&self, request: &mut StreamRequest) -> SendState {
        let amounts = self.state.amount();
        let min_delivery_amount = amounts.min_delivery_amount();
        if let Some((receive_max, _)) = amounts.receive_max() {
            if receive_max < min_delivery_amount {
                warn!(
                    "Receiver only accepts up to {}, but {} must be delivered",
                    receive_max, min_delivery_amount
                );
                return SendState::IncompatibleReceiveMax;
            }
        }

        let remaining = amounts.remaining_source_amount();
        if remaining == 0 {
            if amounts.amount_in_flight() > 0 {
                return SendState::Wait;
            }
            let delivered = amounts.amount_delivered();
            if delivered < min_delivery_amount {
                warn!(
                    "Delivered {} but the minimum was {}",
                    delivered, min_delivery_amount
                );
                return SendState::InsufficientExchangeRate;
            }
            debug!(
                "Sent {} and delivered {}, payment complete",
                amounts.amount_sent(),
                delivered
            );
            return SendState::End;
        }

        let source_amount = remaining.min(
            self.state
                .max_packet_amount()
                .next_max_packet_amount(),
        );
        request.source_amount = source_amount;
        request.min_destination_amount = amounts.min_exchange_rate().multiply_floor(source_amount);
        request.is_fulfillable = true;
        SendState::Ready
    }

    fn on_send(&self, request: &StreamRequest) {
        self.state.amount().reserve(request.source_amount);
    }

    fn on_reply(&self, request: &StreamRequest, reply: &StreamReply) {
        if !reply.is_fulfill() {
            self.state.amount().on_reject(request.source_amount);
        }
        if let Some(receiver) = reply.receiver() {
            if let (Some(receive_max), Some(total_received)) =
                (receiver.receive_max, receiver.total_received)
            {
                self.state
                    .amount()
                    .set_receive_max(receive_max, total_received);
            }
        }
    }
}
