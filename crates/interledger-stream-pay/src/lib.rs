//! # interledger-stream-pay
//!
//! Quote and send [STREAM](https://interledger.org/rfcs/0029-stream/) payments over
//! an unknown, multi-hop Interledger path.
//!
//! A payment happens in two steps:
//!
//! 1. [`StreamPayer::get_quote`](./struct.StreamPayer.html#method.get_quote) resolves the
//!    receiver, probes the path for its exchange rate and maximum packet amount, and
//!    compares the probed rate against an external oracle rate (minus slippage).
//! 1. [`StreamPayer::pay`](./struct.StreamPayer.html#method.pay) sends the quoted amount
//!    as a sequence of STREAM packets, each of which must deliver at least the quoted
//!    minimum exchange rate.

/// Boundary with the transport that carries ILP packets
mod link;
/// Exact rate arithmetic: ratios, slippage and scaled exchange rates
pub mod rates;
/// STREAM packet codec and cryptographic helpers, [as specified in the
/// RFC](https://interledger.org/rfcs/0029-stream/#5-packet-and-frame-specification)
pub mod stream;
/// Per-connection state: asset details, exchange rate, max packet amount, pacing and amounts
pub mod trackers;

mod config;
mod connection;
mod error;
mod filters;
mod oracle;
mod payer;
mod probe;
mod request;
mod run_loop;
mod spsp;

#[cfg(test)]
mod test_helpers;

pub use config::StreamPayerConfig;
pub use connection::{AccountDetails, Denomination, SharedSecret, StreamConnection};
pub use error::{SendState, StreamPayerError};
pub use filters::{
    AmountFilter, AssetDetailsFilter, ExchangeRateFilter, FailureFilter, MaxPacketAmountFilter,
    PacingFilter, PendingRequestsFilter, SequenceFilter, StreamPacketFilter,
};
pub use link::{link_fn, IlpResult, Link, LinkFn};
pub use oracle::{ExchangeRateError, ExchangeRateProvider, InMemoryExchangeRateProvider};
pub use payer::{EstimatedPaymentOutcome, PaymentOptions, PaymentReceipt, Quote, StreamPayer};
pub use probe::{DefaultExchangeRateProber, ExchangeRateProbeOutcome, ExchangeRateProber};
pub use request::{ReceiverReply, StreamReject, StreamReply, StreamRequest};
pub use run_loop::RunLoop;
pub use spsp::{SpspClient, SpspError, StreamConnectionDetails};
