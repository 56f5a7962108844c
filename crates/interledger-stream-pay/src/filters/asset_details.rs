use super::StreamPacketFilter;
use crate::error::SendState;
use crate::request::{StreamReply, StreamRequest};
use crate::trackers::PaymentSharedStateTracker;
use std::sync::Arc;

/// Shares our details until the receiver replies and watches the receiver's
/// asset details for changes.
pub struct AssetDetailsFilter {
    state: Arc<PaymentSharedStateTracker>,
}

impl AssetDetailsFilter {
    pub fn new(state: Arc<PaymentSharedStateTracker>) -> Self {
        AssetDetailsFilter { state }
    }
}

impl StreamPacketFilter for AssetDetailsFilter {
    fn next_state(&self, request: &mut StreamRequest) -> SendState {
        if self.state.asset_details().has_destination_conflict() {
            return SendState::DestinationAssetConflict;
        }
        request.send_connection_details = self.state.should_send_connection_details();
        SendState::Ready
    }

    fn on_reply(&self, _request: &StreamRequest, reply: &StreamReply) {
        if let Some(receiver) = reply.receiver() {
            self.state.set_receiver_reached();
            if let Some(denomination) = &receiver.asset_details {
                self.state
                    .asset_details()
                    .set_destination_denomination(denomination.clone());
            }
        }
    }
}
