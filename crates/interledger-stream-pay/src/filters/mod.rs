//! The send loop asks each filter, in order, whether the next packet may be
//! sent and lets each one shape it. Filters then see every packet that is sent
//! and every reply that comes back.

mod amount;
mod asset_details;
mod exchange_rate;
mod failure;
mod max_packet;
mod pacing;
mod pending_requests;
mod sequence;

pub use amount::AmountFilter;
pub use asset_details::AssetDetailsFilter;
pub use exchange_rate::ExchangeRateFilter;
pub use failure::FailureFilter;
pub use max_packet::MaxPacketAmountFilter;
pub use pacing::PacingFilter;
pub use pending_requests::PendingRequestsFilter;
pub use sequence::SequenceFilter;

use crate::error::{SendState, StreamPayerError};
use crate::request::{StreamReply, StreamRequest};

pub trait StreamPacketFilter: Send + Sync {
    /// Anything other than `SendState::Ready` stops the packet from being sent.
    fn next_state(&self, _request: &mut StreamRequest) -> SendState {
        SendState::Ready
    }

    fn on_send(&self, _request: &StreamRequest) {}

    /// A reply is only passed to `on_reply` if every filter expects it.
    fn is_reply_expected(&self, _request: &StreamRequest) -> bool {
        true
    }

    fn on_reply(&self, _request: &StreamRequest, _reply: &StreamReply) {}

    /// The error behind a terminal state this filter returned, with the
    /// details of the packet that caused it.
    fn failure(&self) -> Option<StreamPayerError> {
        None
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::StreamPayerConfig;
    use crate::request::{ReceiverReply, StreamReject, StreamReply};
    use crate::test_helpers::test_connection;
    use crate::trackers::PaymentSharedStateTracker;
    use interledger_packet::ErrorCode;
    use std::sync::Arc;

    pub fn shared_state() -> Arc<PaymentSharedStateTracker> {
        Arc::new(PaymentSharedStateTracker::new(
            test_connection(),
            &StreamPayerConfig::default(),
        ))
    }

    pub fn fulfill(destination_amount: u64) -> StreamReply {
        StreamReply::Fulfill(Some(ReceiverReply {
            destination_amount,
            ..ReceiverReply::default()
        }))
    }

    pub fn reject(code: ErrorCode, receiver: Option<ReceiverReply>) -> StreamReply {
        StreamReply::Reject(StreamReject {
            code,
            message: String::new(),
            data: Vec::new(),
            receiver,
        })
    }
}
