use crate::config::StreamPayerConfig;
use crate::error::{SendState, StreamPayerError};
use crate::filters::{
    AmountFilter, AssetDetailsFilter, ExchangeRateFilter, FailureFilter, MaxPacketAmountFilter,
    PacingFilter, PendingRequestsFilter, SequenceFilter, StreamPacketFilter,
};
use crate::link::Link;
use crate::request::{send_request, StreamReply, StreamRequest};
use crate::trackers::PaymentSharedStateTracker;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// How long to wait when a filter holds packets back without the pacing
/// tracker asking for a delay.
const DEFAULT_WAIT: Duration = Duration::from_millis(50);

/// Longest a failed payment waits for the receiver to answer the close.
const FAILED_CLOSE_EXPIRY: Duration = Duration::from_millis(500);

type PendingReply<'a> = BoxFuture<'a, (StreamRequest, StreamReply)>;

/// Drives a connection by asking the filter chain for the next packet,
/// sending it, and feeding every reply back through the chain.
pub struct RunLoop {
    link: Arc<dyn Link>,
    state: Arc<PaymentSharedStateTracker>,
    filters: Vec<Box<dyn StreamPacketFilter>>,
    packet_expiry: Duration,
}

impl RunLoop {
    pub fn new(
        link: Arc<dyn Link>,
        state: Arc<PaymentSharedStateTracker>,
        config: &StreamPayerConfig,
    ) -> Self {
        let filters: Vec<Box<dyn StreamPacketFilter>> = vec![
            Box::new(SequenceFilter::new(state.clone())),
            Box::new(FailureFilter::new(config)),
            Box::new(AssetDetailsFilter::new(state.clone())),
            Box::new(MaxPacketAmountFilter::new(state.clone())),
            Box::new(PacingFilter::new(state.clone())),
            Box::new(AmountFilter::new(state.clone())),
            Box::new(ExchangeRateFilter::new(state.clone())),
            Box::new(PendingRequestsFilter::new()),
        ];
        RunLoop::with_filters(link, state, filters, config)
    }

    /// Use a custom chain. Filters are asked in order and the first one that
    /// is not `Ready` decides what happens next.
    pub fn with_filters(
        link: Arc<dyn Link>,
        state: Arc<PaymentSharedStateTracker>,
        filters: Vec<Box<dyn StreamPacketFilter>>,
        config: &StreamPayerConfig,
    ) -> Self {
        RunLoop {
            link,
            state,
            filters,
            packet_expiry: config.packet_expiry(),
        }
    }

    /// Send packets until a filter ends the payment. Packets still in flight
    /// when a filter fails the payment are abandoned.
    pub async fn run(&self) -> Result<(), StreamPayerError> {
        let mut pending: FuturesUnordered<PendingReply<'_>> = FuturesUnordered::new();

        let result = loop {
            while let Some(Some((request, reply))) = pending.next().now_or_never() {
                self.handle_reply(&request, &reply);
            }

            let mut request = StreamRequest::default();
            match self.next_state(&mut request) {
                SendState::Ready => {
                    for filter in &self.filters {
                        filter.on_send(&request);
                    }
                    pending.push(self.send(request));
                }
                SendState::Wait => {
                    let delay = self
                        .state
                        .pacing()
                        .next_packet_delay()
                        .unwrap_or(DEFAULT_WAIT);
                    if pending.is_empty() {
                        tokio::time::delay_for(delay).await;
                    } else if let Ok(Some((request, reply))) =
                        tokio::time::timeout(delay, pending.next()).await
                    {
                        self.handle_reply(&request, &reply);
                    }
                }
                SendState::End => match pending.next().await {
                    Some((request, reply)) => self.handle_reply(&request, &reply),
                    None => break Ok(()),
                },
                failure => break Err(failure),
            }
        };

        // Outstanding packets can no longer change the outcome
        drop(pending);
        match result {
            Ok(()) => {
                self.close_connection(self.packet_expiry).await;
                Ok(())
            }
            Err(state) => {
                let err = self.failure(state);
                error!("Payment failed: {}", err);
                self.close_connection(self.packet_expiry.min(FAILED_CLOSE_EXPIRY))
                    .await;
                Err(err)
            }
        }
    }

    /// The most detailed error a filter recorded for `state`.
    fn failure(&self, state: SendState) -> StreamPayerError {
        self.filters
            .iter()
            .filter_map(|filter| filter.failure())
            .find(|err| err.state() == state)
            .unwrap_or_else(|| StreamPayerError::from(state))
    }

    fn next_state(&self, request: &mut StreamRequest) -> SendState {
        for filter in &self.filters {
            let state = filter.next_state(request);
            if state != SendState::Ready {
                trace!("Send loop state: {:?}", state);
                return state;
            }
        }
        SendState::Ready
    }

    fn send(&self, request: StreamRequest) -> PendingReply<'_> {
        let link = self.link.as_ref();
        let connection = self.state.connection();
        let expiry = self.packet_expiry;
        async move {
            let reply = send_request(link, connection, &request, expiry).await;
            (request, reply)
        }
        .boxed()
    }

    fn handle_reply(&self, request: &StreamRequest, reply: &StreamReply) {
        if !self
            .filters
            .iter()
            .all(|filter| filter.is_reply_expected(request))
        {
            warn!("Dropping reply to packet {}", request.sequence);
            return;
        }
        for filter in &self.filters {
            filter.on_reply(request, reply);
        }
    }

    async fn close_connection(&self, expiry: Duration) {
        let request = StreamRequest {
            sequence: self.state.next_sequence(),
            close_connection: true,
            ..StreamRequest::default()
        };
        let reply = send_request(
            self.link.as_ref(),
            self.state.connection(),
            &request,
            expiry,
        )
        .await;
        debug!(
            "Sent connection close, receiver replied: {}",
            reply.receiver().is_some()
        );
    }
}
