use crate::config::StreamPayerConfig;
use crate::connection::{address_scheme, AccountDetails, StreamConnection};
use crate::error::{SendState, StreamPayerError};
use crate::link::Link;
use crate::oracle::ExchangeRateProvider;
use crate::probe::{DefaultExchangeRateProber, ExchangeRateProbeOutcome, ExchangeRateProber};
use crate::rates::{determine_scaled_external_rate, Ratio, Slippage};
use crate::run_loop::RunLoop;
use crate::spsp::SpspClient;
use crate::trackers::{MaxPacketAmount, PaymentSharedStateTracker};
use num::{BigInt, One, ToPrimitive};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, info_span};
use tracing_futures::Instrument;

/// What to pay, to whom, and how much worse than the market rate is acceptable.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentOptions {
    pub sender: AccountDetails,
    /// In whole units of the sender's asset, e.g. `1.5` XRP
    pub amount_to_send: Decimal,
    pub destination_payment_pointer: String,
    pub slippage: Slippage,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EstimatedPaymentOutcome {
    /// In source ledger units
    pub max_source_amount: u64,
    pub estimated_number_of_packets: u64,
    /// In destination ledger units
    pub min_delivery_amount: u64,
}

/// A payment that was checked against the path and the oracle and can be sent
/// with [`StreamPayer::pay`].
pub struct Quote {
    source_account: AccountDetails,
    destination_account: AccountDetails,
    estimated_payment_outcome: EstimatedPaymentOutcome,
    min_exchange_rate: Ratio,
    estimated_exchange_rate: ExchangeRateProbeOutcome,
    payment_options: PaymentOptions,
    shared_state: Arc<PaymentSharedStateTracker>,
}

impl Quote {
    #[inline]
    pub fn source_account(&self) -> &AccountDetails {
        &self.source_account
    }

    #[inline]
    pub fn destination_account(&self) -> &AccountDetails {
        &self.destination_account
    }

    #[inline]
    pub fn estimated_payment_outcome(&self) -> &EstimatedPaymentOutcome {
        &self.estimated_payment_outcome
    }

    /// Least number of destination units each source unit must deliver.
    #[inline]
    pub fn min_exchange_rate(&self) -> &Ratio {
        &self.min_exchange_rate
    }

    #[inline]
    pub fn estimated_exchange_rate(&self) -> &ExchangeRateProbeOutcome {
        &self.estimated_exchange_rate
    }

    #[inline]
    pub fn payment_options(&self) -> &PaymentOptions {
        &self.payment_options
    }
}

impl fmt::Debug for Quote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Quote")
            .field("source_account", &self.source_account)
            .field("destination_account", &self.destination_account)
            .field("estimated_payment_outcome", &self.estimated_payment_outcome)
            .field("min_exchange_rate", &self.min_exchange_rate)
            .field("estimated_exchange_rate", &self.estimated_exchange_rate)
            .field("payment_options", &self.payment_options)
            .finish()
    }
}

/// How a payment went. Failed payments carry one too.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentReceipt {
    /// The quoted source amount, in source ledger units
    pub original_source_amount: u64,
    /// Fulfilled source amount
    pub amount_sent: u64,
    /// Destination units the receiver accepted
    pub amount_delivered: u64,
    pub fulfilled_packets: u64,
    pub rejected_packets: u64,
    pub success: bool,
}

/// Quotes and sends STREAM payments over a [`Link`].
pub struct StreamPayer {
    link: Arc<dyn Link>,
    spsp_client: Arc<dyn SpspClient>,
    oracle: Arc<dyn ExchangeRateProvider>,
    prober: Arc<dyn ExchangeRateProber>,
    config: StreamPayerConfig,
}

impl StreamPayer {
    pub fn new(
        link: Arc<dyn Link>,
        spsp_client: Arc<dyn SpspClient>,
        oracle: Arc<dyn ExchangeRateProvider>,
        config: StreamPayerConfig,
    ) -> Self {
        let prober = Arc::new(DefaultExchangeRateProber::new(link.clone(), config.clone()));
        StreamPayer {
            link,
            spsp_client,
            oracle,
            prober,
            config,
        }
    }

    /// Probe paths with something other than the default prober.
    pub fn with_prober(mut self, prober: Arc<dyn ExchangeRateProber>) -> Self {
        self.prober = prober;
        self
    }

    /// Resolve the receiver, probe the path and check that its rate is at
    /// least the oracle rate minus slippage.
    pub async fn get_quote(&self, options: PaymentOptions) -> Result<Quote, StreamPayerError> {
        let span = info_span!(
            "quote",
            destination = %options.destination_payment_pointer,
            amount = %options.amount_to_send,
        );
        self.quote(options).instrument(span).await
    }

    async fn quote(&self, options: PaymentOptions) -> Result<Quote, StreamPayerError> {
        let details = self
            .spsp_client
            .get_stream_connection_details(&options.destination_payment_pointer)
            .await
            .map_err(|err| {
                StreamPayerError::new(
                    SendState::QueryFailed,
                    format!(
                        "Failed to query {}: {}",
                        options.destination_payment_pointer, err
                    ),
                )
            })?;

        let source_scheme = options.sender.scheme();
        let destination_scheme = address_scheme(&details.destination_account);
        if source_scheme != destination_scheme {
            return Err(StreamPayerError::new(
                SendState::IncompatibleInterledgerNetworks,
                format!(
                    "Sender on network {} cannot pay a receiver on network {}",
                    source_scheme, destination_scheme
                ),
            ));
        }

        let source_denomination = options.sender.denomination().ok_or_else(|| {
            StreamPayerError::new(
                SendState::UnknownSourceAsset,
                "Sender account has no asset details",
            )
        })?;
        let max_source_amount =
            to_ledger_units(options.amount_to_send, source_denomination.asset_scale())
                .ok_or_else(|| {
                    StreamPayerError::new(
                        SendState::InvalidSourceAmount,
                        format!(
                            "Cannot send {} {} with an asset scale of {}",
                            options.amount_to_send,
                            source_denomination.asset_code(),
                            source_denomination.asset_scale()
                        ),
                    )
                })?;

        let connection = StreamConnection::new(
            options.sender.clone(),
            details.destination_account.clone(),
            details.shared_secret,
        );
        debug!(
            "Quoting connection {} to {}",
            connection.connection_id(),
            details.destination_account
        );
        let shared_state = Arc::new(PaymentSharedStateTracker::new(connection, &self.config));
        let probed = self.prober.probe_path(&shared_state).await?;

        let (lower_bound, upper_bound) =
            match (&probed.lower_bound_rate, &probed.upper_bound_rate) {
                (Some(lower), Some(upper)) => (lower.clone(), upper.clone()),
                _ => {
                    return Err(StreamPayerError::new(
                        SendState::RateProbeFailed,
                        "No probe packet reached the receiver",
                    ))
                }
            };

        let destination_denomination =
            probed.destination_denomination.clone().ok_or_else(|| {
                StreamPayerError::new(
                    SendState::UnknownDestinationAsset,
                    "Receiver did not share its asset details",
                )
            })?;
        let destination_account = AccountDetails::new(
            details.destination_account,
            Some(destination_denomination.clone()),
        );

        let rate_unavailable = |reason: String| {
            StreamPayerError::new(
                SendState::ExternalRateUnavailable,
                format!(
                    "No rate found in oracleExchangeRateProvider from {} to {}: {}",
                    source_denomination.asset_code(),
                    destination_denomination.asset_code(),
                    reason
                ),
            )
        };
        let external_rate = self
            .oracle
            .get_exchange_rate(
                source_denomination.asset_code(),
                destination_denomination.asset_code(),
            )
            .map_err(|err| rate_unavailable(err.to_string()))?;
        let scaled_rate = determine_scaled_external_rate(
            &options.sender,
            &destination_account,
            external_rate,
            options.slippage,
        )
        .map_err(|err| rate_unavailable(err.to_string()))?;

        let min_exchange_rate = Ratio::from_decimal(scaled_rate.lower_bound());
        if lower_bound <= min_exchange_rate {
            return Err(StreamPayerError::new(
                SendState::InsufficientExchangeRate,
                format!(
                    "Probed exchange rate of {} does not exceed the minimum of {}",
                    lower_bound, min_exchange_rate
                ),
            ));
        }
        if !lower_bound.is_positive() || !upper_bound.is_positive() {
            return Err(StreamPayerError::new(
                SendState::InsufficientExchangeRate,
                format!(
                    "Probed exchange rate between {} and {} is not positive",
                    lower_bound, upper_bound
                ),
            ));
        }

        check_rate_enforceable(probed.max_packet_amount, &lower_bound, &min_exchange_rate)?;

        let estimated_number_of_packets = estimate_number_of_packets(
            max_source_amount,
            probed.max_packet_amount,
            shared_state.max_packet_amount().verified_path_capacity(),
        );
        let estimated_payment_outcome = EstimatedPaymentOutcome {
            max_source_amount,
            estimated_number_of_packets,
            min_delivery_amount: min_exchange_rate.multiply_floor(max_source_amount),
        };
        info!(
            "Quoted {} source units for at least {} destination units in about {} packets",
            max_source_amount,
            estimated_payment_outcome.min_delivery_amount,
            estimated_number_of_packets
        );

        Ok(Quote {
            source_account: options.sender.clone(),
            destination_account,
            estimated_payment_outcome,
            min_exchange_rate,
            estimated_exchange_rate: probed,
            payment_options: options,
            shared_state,
        })
    }

    /// Send the quoted payment on the connection the quote was made on.
    pub async fn pay(&self, quote: Quote) -> Result<PaymentReceipt, StreamPayerError> {
        let state = quote.shared_state.clone();
        let outcome = &quote.estimated_payment_outcome;
        state.amount().set_payment_target(
            outcome.max_source_amount,
            outcome.min_delivery_amount,
            quote.min_exchange_rate.clone(),
        );

        let span = info_span!(
            "pay",
            connection.id = %state.connection().connection_id(),
            destination = %state.connection().destination_address(),
        );
        let result = RunLoop::new(self.link.clone(), state.clone(), &self.config)
            .run()
            .instrument(span)
            .await;

        let amounts = state.amount();
        let receipt = PaymentReceipt {
            original_source_amount: outcome.max_source_amount,
            amount_sent: amounts.amount_sent(),
            amount_delivered: amounts.amount_delivered(),
            fulfilled_packets: amounts.fulfilled_packets(),
            rejected_packets: amounts.rejected_packets(),
            success: result.is_ok(),
        };
        match result {
            Ok(()) => {
                info!(
                    "Payment complete: sent {} and delivered {}",
                    receipt.amount_sent, receipt.amount_delivered
                );
                Ok(receipt)
            }
            Err(err) => Err(err.with_receipt(receipt)),
        }
    }
}

/// Whole units of an asset to ledger units. `None` for negative amounts,
/// amounts with more decimals than the scale allows and amounts too large
/// for a packet amount.
fn to_ledger_units(amount: Decimal, asset_scale: u8) -> Option<u64> {
    let units = Ratio::from_decimal(amount).shift(i32::from(asset_scale));
    if !units.denominator().is_one() {
        return None;
    }
    units.numerator().to_u64()
}

/// Without a known max, packets as large as the largest probe that reached
/// the receiver are assumed to get through, plus one for the untested rest.
fn estimate_number_of_packets(
    max_source_amount: u64,
    max_packet_amount: MaxPacketAmount,
    verified_path_capacity: u64,
) -> u64 {
    if max_source_amount == 0 {
        return 0;
    }
    match max_packet_amount.value() {
        Some(max) => max_source_amount / max + u64::from(max_source_amount % max != 0),
        None => max_source_amount / verified_path_capacity.max(1) + 1,
    }
}

/// Packets are rounded down at every hop, so each one must be large enough
/// that the probed rate still delivers at least the minimum after rounding.
fn check_rate_enforceable(
    max_packet_amount: MaxPacketAmount,
    lower_bound: &Ratio,
    min_exchange_rate: &Ratio,
) -> Result<(), StreamPayerError> {
    if max_packet_amount.value() == Some(0) {
        return Err(StreamPayerError::new(
            SendState::ExchangeRateRoundingError,
            "Path cannot carry packets of any amount",
        ));
    }
    if !min_exchange_rate.is_positive() {
        return Ok(());
    }

    let margin = lower_bound - min_exchange_rate;
    let min_packet_amount = match margin.reciprocal() {
        Some(inverse) if margin.is_positive() => inverse.ceil(),
        _ => {
            return Err(StreamPayerError::new(
                SendState::ExchangeRateRoundingError,
                format!(
                    "Probed exchange rate of {} leaves no margin over the minimum of {}",
                    lower_bound, min_exchange_rate
                ),
            ))
        }
    };
    match max_packet_amount.value() {
        Some(max) if BigInt::from(max) < min_packet_amount => Err(StreamPayerError::new(
            SendState::ExchangeRateRoundingError,
            format!(
                "Max packet amount of {} is too small to enforce the minimum rate, {} is needed",
                max, min_packet_amount
            ),
        )),
        _ => Ok(()),
    }
}
