use crate::connection::SharedSecret;
use async_trait::async_trait;
use interledger_packet::Address;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SpspError {
    #[error("Invalid payment pointer: {0}")]
    InvalidPaymentPointer(String),
    #[error("Unable to query SPSP server: {0}")]
    HttpError(String),
    #[error("Got invalid SPSP response from server: {0}")]
    InvalidSpspServerResponseError(String),
}

/// Where and how to reach the receiver, as returned by its SPSP server.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamConnectionDetails {
    pub destination_account: Address,
    pub shared_secret: SharedSecret,
}

/// Resolves a payment pointer to STREAM connection details.
#[async_trait]
pub trait SpspClient: Send + Sync {
    async fn get_stream_connection_details(
        &self,
        payment_pointer: &str,
    ) -> Result<StreamConnectionDetails, SpspError>;
}
