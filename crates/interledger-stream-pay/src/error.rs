use crate::payer::PaymentReceipt;
use std::fmt;

/// What the sender should do next, or why it had to stop.
///
/// `Ready`, `Wait` and `End` drive the send loop. Every other value is a
/// terminal error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendState {
    /// Send the packet that was just built
    Ready,
    /// Nothing can be sent right now; wait for a reply or for pacing
    Wait,
    /// The payment is complete
    End,

    /// The payment pointer could not be resolved
    QueryFailed,
    /// Sender and receiver are on different Interledger networks
    IncompatibleInterledgerNetworks,
    /// The amount to send is negative, too precise, or too large
    InvalidSourceAmount,
    /// No probe packet made it to the receiver
    RateProbeFailed,
    /// The oracle has no rate for the asset pair
    ExternalRateUnavailable,
    /// The receiver never shared its asset details
    UnknownDestinationAsset,
    /// The sending account has no asset details
    UnknownSourceAsset,
    /// The path's exchange rate is below the minimum rate
    InsufficientExchangeRate,
    /// Packets are too small to enforce the minimum rate
    ExchangeRateRoundingError,
    /// The receiver changed its asset details mid-payment
    DestinationAssetConflict,
    /// A connector rejected a packet with a final error, or kept rejecting them
    ConnectorError,
    /// The receiver closed the connection or stream
    ClosedByRecipient,
    /// The receiver cannot accept as much as must be delivered
    IncompatibleReceiveMax,
    /// No packet was fulfilled for too long
    IdleTimeout,
    /// Too many packets were encrypted with the same key
    MaxSafeEncryptionLimit,
}

impl SendState {
    pub fn is_error(self) -> bool {
        match self {
            SendState::Ready | SendState::Wait | SendState::End => false,
            _ => true,
        }
    }

    /// Default human readable explanation
    pub fn description(self) -> &'static str {
        match self {
            SendState::Ready => "Ready to send",
            SendState::Wait => "Waiting to send",
            SendState::End => "Payment complete",
            SendState::QueryFailed => "Failed to query the payment pointer",
            SendState::IncompatibleInterledgerNetworks => {
                "Sender and receiver use incompatible Interledger networks"
            }
            SendState::InvalidSourceAmount => "Invalid source amount",
            SendState::RateProbeFailed => "Rate probe failed to establish the exchange rate",
            SendState::ExternalRateUnavailable => "External exchange rate is unavailable",
            SendState::UnknownDestinationAsset => "Destination asset details are unknown",
            SendState::UnknownSourceAsset => "Source asset details are unknown",
            SendState::InsufficientExchangeRate => "Probed exchange rate is too low",
            SendState::ExchangeRateRoundingError => {
                "Exchange rate cannot be enforced due to rounding"
            }
            SendState::DestinationAssetConflict => "Receiver changed its asset details",
            SendState::ConnectorError => "Packets were rejected by a connector",
            SendState::ClosedByRecipient => "Receiver closed the connection",
            SendState::IncompatibleReceiveMax => "Receiver cannot accept the minimum delivery",
            SendState::IdleTimeout => "No packets were fulfilled before the idle timeout",
            SendState::MaxSafeEncryptionLimit => "Exceeded the number of packets safe to encrypt",
        }
    }
}

impl fmt::Display for SendState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A quote or payment that could not be completed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct StreamPayerError {
    state: SendState,
    message: String,
    receipt: Option<PaymentReceipt>,
}

impl StreamPayerError {
    pub fn new<M: Into<String>>(state: SendState, message: M) -> Self {
        StreamPayerError {
            state,
            message: message.into(),
            receipt: None,
        }
    }

    /// Attach what was sent and delivered before the payment failed
    pub fn with_receipt(mut self, receipt: PaymentReceipt) -> Self {
        self.receipt = Some(receipt);
        self
    }

    #[inline]
    pub fn state(&self) -> SendState {
        self.state
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn receipt(&self) -> Option<&PaymentReceipt> {
        self.receipt.as_ref()
    }
}

impl From<SendState> for StreamPayerError {
    fn from(state: SendState) -> Self {
        StreamPayerError::new(state, state.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_terminal_states_are_errors() {
        assert!(!SendState::Ready.is_error());
        assert!(!SendState::Wait.is_error());
        assert!(!SendState::End.is_error());
        assert!(SendState::RateProbeFailed.is_error());
        assert!(SendState::IdleTimeout.is_error());
    }

    #[test]
    fn errors_display_their_message() {
        let err = StreamPayerError::new(SendState::QueryFailed, "no such pointer");
        assert_eq!(err.to_string(), "no such pointer");
        assert_eq!(err.state(), SendState::QueryFailed);
        assert!(err.receipt().is_none());

        let err = StreamPayerError::from(SendState::ConnectorError);
        assert_eq!(err.message(), "Packets were rejected by a connector");
    }
}
