use crate::config::StreamPayerConfig;
use crate::connection::Denomination;
use crate::error::{SendState, StreamPayerError};
use crate::link::Link;
use crate::rates::Ratio;
use crate::request::{send_request, StreamReply, StreamRequest};
use crate::trackers::{MaxPacketAmount, PaymentSharedStateTracker};
use async_trait::async_trait;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use interledger_packet::{ErrorClass, ErrorCode, MaxPacketAmountDetails};
use rust_decimal::prelude::ToPrimitive;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{delay_for, timeout, timeout_at};
use tracing::{debug, debug_span, warn};
use tracing_futures::Instrument;

/// Largest probe amount is `10^MAX_PROBE_EXPONENT` source units.
const MAX_PROBE_EXPONENT: u32 = 12;

/// What probing learned about the path.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeRateProbeOutcome {
    pub source_denomination: Denomination,
    /// `None` if the receiver never shared its asset details
    pub destination_denomination: Option<Denomination>,
    pub max_packet_amount: MaxPacketAmount,
    /// Both bounds are `None` if no probe reached the receiver
    pub lower_bound_rate: Option<Ratio>,
    pub upper_bound_rate: Option<Ratio>,
}

impl ExchangeRateProbeOutcome {
    /// A rate is known once at least one probe reached the receiver.
    pub fn has_rate(&self) -> bool {
        self.lower_bound_rate.is_some() && self.upper_bound_rate.is_some()
    }
}

/// Discovers the exchange rate and max packet amount of a path before any
/// money is sent.
#[async_trait]
pub trait ExchangeRateProber: Send + Sync {
    async fn probe_path(
        &self,
        shared_state: &PaymentSharedStateTracker,
    ) -> Result<ExchangeRateProbeOutcome, StreamPayerError>;
}

/// Sends unfulfillable packets from `10^12` down to `1` source units and
/// narrows in on the max packet amount with a binary search.
pub struct DefaultExchangeRateProber {
    link: Arc<dyn Link>,
    config: StreamPayerConfig,
}

/// An amount waiting to be probed and how many times it was already retried.
type ProbeAmount = (u64, u32);

impl DefaultExchangeRateProber {
    pub fn new(link: Arc<dyn Link>, config: StreamPayerConfig) -> Self {
        DefaultExchangeRateProber { link, config }
    }

    async fn send_probes(&self, state: &PaymentSharedStateTracker) {
        let deadline = tokio::time::Instant::now() + self.config.probe_timeout();
        let mut queue: VecDeque<ProbeAmount> = (0..=MAX_PROBE_EXPONENT)
            .rev()
            .map(|exponent| (10u64.pow(exponent), 0))
            .collect();
        let mut pending = FuturesUnordered::new();
        let mut packets_sent = 0;
        let concurrency = self.config.probe_concurrency.max(1);
        let expiry = self.config.packet_expiry();
        let mut converged = false;

        loop {
            let mut paced = None;
            while !converged
                && pending.len() < concurrency
                && packets_sent < self.config.max_probe_packets
            {
                if let Some(delay) = state.pacing().next_packet_delay() {
                    paced = Some(delay);
                    break;
                }
                let (amount, retries) = match queue.pop_front() {
                    Some(probe) => probe,
                    None => break,
                };
                if !self.is_worth_probing(state, amount, retries) {
                    continue;
                }
                packets_sent += 1;

                let request = StreamRequest {
                    sequence: state.next_sequence(),
                    source_amount: amount,
                    send_connection_details: state.should_send_connection_details(),
                    ..StreamRequest::default()
                };
                let link = self.link.as_ref();
                let connection = state.connection();
                state.pacing().on_packet_sent();
                let sent_at = Instant::now();
                pending.push(
                    async move {
                        let reply = send_request(link, connection, &request, expiry).await;
                        (request, retries, sent_at, reply)
                    }
                    .boxed(),
                );
            }

            let next = match paced {
                Some(delay) if pending.is_empty() => {
                    match timeout_at(deadline, delay_for(delay)).await {
                        Ok(()) => continue,
                        Err(_) => break,
                    }
                }
                Some(delay) => match timeout_at(deadline, timeout(delay, pending.next())).await {
                    Ok(Ok(Some(next))) => next,
                    Ok(_) => continue,
                    Err(_) => break,
                },
                None => match timeout_at(deadline, pending.next()).await {
                    Ok(Some(next)) => next,
                    Ok(None) => return,
                    Err(_) => break,
                },
            };
            let (request, retries, sent_at, reply) = next;
            self.handle_reply(state, &mut queue, &request, retries, sent_at, &reply);

            // Probes already in flight are still used, they may lower the max
            if !converged && self.has_converged(state) {
                debug!("Rate probe converged after {} packets", packets_sent);
                converged = true;
            }
        }

        warn!(
            "Rate probe timed out after {:?} with {} probes unanswered",
            self.config.probe_timeout(),
            pending.len()
        );
        let round_trip_time = state.pacing().average_round_trip_time();
        for _ in 0..pending.len() {
            state
                .pacing()
                .on_packet_rejected(ErrorCode::R00_TRANSFER_TIMED_OUT, round_trip_time);
        }
    }

    fn is_worth_probing(
        &self,
        state: &PaymentSharedStateTracker,
        amount: u64,
        retries: u32,
    ) -> bool {
        let max_packet_amount = state.max_packet_amount();
        if amount == 0 || amount > max_packet_amount.next_max_packet_amount() {
            return false;
        }
        // Smaller amounts than what already got through tell us nothing new
        retries > 0 || amount > max_packet_amount.verified_path_capacity()
    }

    fn handle_reply(
        &self,
        state: &PaymentSharedStateTracker,
        queue: &mut VecDeque<ProbeAmount>,
        request: &StreamRequest,
        retries: u32,
        sent_at: Instant,
        reply: &StreamReply,
    ) {
        let amount = request.source_amount;
        // Probes are never fulfilled, reaching the receiver is their success
        let round_trip_time = sent_at.elapsed();
        match reply.reject() {
            Some(reject) if reply.receiver().is_none() => state
                .pacing()
                .on_packet_rejected(reject.code, round_trip_time),
            _ => state.pacing().on_packet_fulfilled(round_trip_time),
        }

        if let Some(receiver) = reply.receiver() {
            state.set_receiver_reached();
            if let Some(denomination) = &receiver.asset_details {
                state
                    .asset_details()
                    .set_destination_denomination(denomination.clone());
            }
            state
                .exchange_rate()
                .update_rate(amount, receiver.destination_amount);
            state.max_packet_amount().adjust_path_capacity(amount);
            self.queue_binary_search(state, queue);
            return;
        }

        let reject = match reply.reject() {
            Some(reject) => reject,
            None => {
                warn!("Probe of {} was fulfilled without a STREAM reply", amount);
                return;
            }
        };
        if reject.code == ErrorCode::F08_AMOUNT_TOO_LARGE {
            let details = MaxPacketAmountDetails::from_bytes(&reject.data).ok();
            let max_packet_amount = state
                .max_packet_amount()
                .reduce_max_packet_amount(amount, details);
            if let Some(max) = max_packet_amount.value() {
                queue.push_front((max, 0));
            }
            self.queue_binary_search(state, queue);
            return;
        }

        match reject.code.class() {
            ErrorClass::Temporary | ErrorClass::Relative
                if retries < self.config.max_probe_retries =>
            {
                debug!(
                    "Retrying probe of {} after {:?} reject",
                    amount, reject.code
                );
                queue.push_back((amount, retries + 1));
            }
            _ => debug!(
                "Probe of {} was rejected with {:?}: {}",
                amount, reject.code, reject.message
            ),
        }
    }

    /// While the max is imprecise, try halfway between what is known to get
    /// through and the max.
    fn queue_binary_search(
        &self,
        state: &PaymentSharedStateTracker,
        queue: &mut VecDeque<ProbeAmount>,
    ) {
        let tracker = state.max_packet_amount();
        if let MaxPacketAmount::ImpreciseMax(max) = tracker.max_packet_amount() {
            let verified = tracker.verified_path_capacity();
            if max > verified.saturating_add(1) {
                queue.push_front((verified + (max - verified) / 2, 0));
            }
        }
    }

    fn has_converged(&self, state: &PaymentSharedStateTracker) -> bool {
        if !state.max_packet_amount().is_stable() {
            return false;
        }
        let rates = state.exchange_rate();
        let (lower, upper) = match (rates.lower_bound_rate(), rates.upper_bound_rate()) {
            (Some(lower), Some(upper)) => (lower, upper),
            _ => return false,
        };
        let spread = match lower.reciprocal() {
            Some(inverse) => &(&upper - &lower) * &inverse,
            None => return false,
        };
        spread
            .to_decimal()
            .and_then(|spread| spread.to_f64())
            .map(|spread| spread < self.config.rate_convergence_threshold)
            .unwrap_or(false)
    }
}

#[async_trait]
impl ExchangeRateProber for DefaultExchangeRateProber {
    async fn probe_path(
        &self,
        shared_state: &PaymentSharedStateTracker,
    ) -> Result<ExchangeRateProbeOutcome, StreamPayerError> {
        let source_denomination = shared_state
            .asset_details()
            .source_account()
            .denomination()
            .cloned()
            .ok_or_else(|| {
                StreamPayerError::new(
                    SendState::UnknownSourceAsset,
                    "Cannot probe without the source asset details",
                )
            })?;

        let span = debug_span!(
            "probe",
            connection.id = %shared_state.connection().connection_id(),
            destination = %shared_state.connection().destination_address(),
        );
        self.send_probes(shared_state).instrument(span).await;

        let rates = shared_state.exchange_rate();
        let outcome = ExchangeRateProbeOutcome {
            source_denomination,
            destination_denomination: shared_state
                .asset_details()
                .destination_account()
                .denomination()
                .cloned(),
            max_packet_amount: shared_state.max_packet_amount().max_packet_amount(),
            lower_bound_rate: rates.lower_bound_rate(),
            upper_bound_rate: rates.upper_bound_rate(),
        };
        debug!("Rate probe finished: {:?}", outcome);
        Ok(outcome)
    }
}
