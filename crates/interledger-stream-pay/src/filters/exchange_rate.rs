use super::StreamPacketFilter;
use crate::error::{SendState, StreamPayerError};
use crate::request::{StreamReply, StreamRequest};
use crate::trackers::PaymentSharedStateTracker;
use interledger_packet::ErrorCode;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Keeps the rate bounds current and makes sure the path still pays at least
/// the minimum exchange rate.
pub struct ExchangeRateFilter {
    state: Arc<PaymentSharedStateTracker>,
    failure: Mutex<Option<StreamPayerError>>,
}

impl ExchangeRateFilter {
    pub fn new(state: Arc<PaymentSharedStateTracker>) -> Self {
        ExchangeRateFilter {
            state,
            failure: Mutex::new(None),
        }
    }
}

impl StreamPacketFilter for ExchangeRateFilter {
    fn next_state(&self, _request: &mut StreamRequest) -> SendState {
        let mut failure = self.failure.lock();
        if let Some(err) = failure.as_ref() {
            return err.state();
        }
        let min_exchange_rate = self.state.amount().min_exchange_rate();
        match self.state.exchange_rate().lower_bound_rate() {
            Some(lower_bound) if lower_bound < min_exchange_rate => {
                let err = StreamPayerError::new(
                    SendState::InsufficientExchangeRate,
                    format!(
                        "Exchange rate of {} fell below the minimum of {}",
                        lower_bound, min_exchange_rate
                    ),
                );
                warn!("{}", err);
                *failure = Some(err);
                SendState::InsufficientExchangeRate
            }
            _ => SendState::Ready,
        }
    }

    fn on_reply(&self, request: &StreamRequest, reply: &StreamReply) {
        if let Some(received) = reply.destination_amount() {
            if request.source_amount > 0 {
                self.state
                    .exchange_rate()
                    .update_rate(request.source_amount, received);
            }
        }

        match reply {
            StreamReply::Fulfill(receiver) => {
                // Without a reply the receiver still must have accepted the minimum
                let delivered = receiver
                    .as_ref()
                    .map(|receiver| receiver.destination_amount)
                    .unwrap_or(request.min_destination_amount);
                if delivered < request.min_destination_amount {
                    warn!(
                        "Packet {} delivered {}, less than its minimum of {}",
                        request.sequence, delivered, request.min_destination_amount
                    );
                }
                self.state
                    .amount()
                    .on_fulfill(request.source_amount, delivered);
                debug!(
                    "Packet {} delivered {}, {} delivered in total",
                    request.sequence,
                    delivered,
                    self.state.amount().amount_delivered()
                );
            }
            StreamReply::Reject(reject) if reject.code == ErrorCode::F99_APPLICATION_ERROR => {
                if let Some(receiver) = &reject.receiver {
                    if request.is_fulfillable
                        && receiver.destination_amount < request.min_destination_amount
                    {
                        let err = StreamPayerError::new(
                            SendState::InsufficientExchangeRate,
                            format!(
                                "Packet {} would have delivered {}, less than its minimum of {}",
                                request.sequence,
                                receiver.destination_amount,
                                request.min_destination_amount
                            ),
                        );
                        warn!("{}", err);
                        self.failure.lock().get_or_insert(err);
                    }
                }
            }
            StreamReply::Reject(_) => {}
        }
    }

    fn failure(&self) -> Option<StreamPayerError> {
        self.failure.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::{fulfill, reject, shared_state};
    use crate::rates::Ratio;
    use crate::request::ReceiverReply;

    fn money(source_amount: u64, min_destination_amount: u64) -> StreamRequest {
        StreamRequest {
            sequence: 1,
            source_amount,
            min_destination_amount,
            is_fulfillable: true,
            ..StreamRequest::default()
        }
    }

    #[test]
    fn fulfills_update_rate_and_delivered_amount() {
        let state = shared_state();
        state
            .amount()
            .set_payment_target(1000, 400, Ratio::new(2, 5).unwrap());
        let filter = ExchangeRateFilter::new(state.clone());
        state.amount().reserve(500);
        filter.on_reply(&money(500, 200), &fulfill(250));

        assert_eq!(state.amount().amount_delivered(), 250);
        assert_eq!(state.amount().amount_sent(), 500);
        assert_eq!(
            state.exchange_rate().lower_bound_rate(),
            Some(Ratio::new(1, 2).unwrap())
        );
        assert_eq!(filter.next_state(&mut money(0, 0)), SendState::Ready);
    }

    #[test]
    fn fails_when_probed_rate_is_below_minimum() {
        let state = shared_state();
        state
            .amount()
            .set_payment_target(1000, 600, Ratio::new(3, 5).unwrap());
        state.exchange_rate().update_rate(1000, 500);
        let filter = ExchangeRateFilter::new(state);
        assert_eq!(
            filter.next_state(&mut money(0, 0)),
            SendState::InsufficientExchangeRate
        );
        assert_eq!(
            filter.failure().unwrap().message(),
            "Exchange rate of 0.5 fell below the minimum of 0.6"
        );
    }

    #[test]
    fn fails_when_receiver_gets_less_than_the_minimum() {
        let state = shared_state();
        state
            .amount()
            .set_payment_target(1000, 400, Ratio::new(2, 5).unwrap());
        let filter = ExchangeRateFilter::new(state);
        let short = ReceiverReply {
            destination_amount: 190,
            ..ReceiverReply::default()
        };
        filter.on_reply(
            &money(500, 200),
            &reject(ErrorCode::F99_APPLICATION_ERROR, Some(short)),
        );
        assert_eq!(
            filter.next_state(&mut money(0, 0)),
            SendState::InsufficientExchangeRate
        );
        assert_eq!(
            filter.failure().unwrap().message(),
            "Packet 1 would have delivered 190, less than its minimum of 200"
        );
    }
}
