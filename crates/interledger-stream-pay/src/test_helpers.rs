use crate::connection::{AccountDetails, Denomination, SharedSecret, StreamConnection};
use crate::link::{IlpResult, Link};
use crate::oracle::InMemoryExchangeRateProvider;
use crate::payer::{PaymentOptions, StreamPayer};
use crate::rates::Slippage;
use crate::spsp::{SpspClient, SpspError, StreamConnectionDetails};
use crate::stream::{
    generate_fulfillment, hash_sha256, ConnectionAssetDetailsFrame, Frame, PacketType,
    StreamMaxMoneyFrame, StreamPacket, StreamPacketBuilder,
};
use crate::StreamPayerConfig;
use async_trait::async_trait;
use bytes::BytesMut;
use interledger_packet::{
    Address, ErrorCode, FulfillBuilder, MaxPacketAmountDetails, Prepare, RejectBuilder,
};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

pub static TEST_SECRET: [u8; 32] = [7; 32];

pub static SENDER_ADDRESS: Lazy<Address> =
    Lazy::new(|| Address::from_str("example.sender").unwrap());
pub static RECEIVER_ADDRESS: Lazy<Address> =
    Lazy::new(|| Address::from_str("example.receiver.123").unwrap());

pub fn sender_account() -> AccountDetails {
    AccountDetails::new(SENDER_ADDRESS.clone(), Some(Denomination::new("XRP", 9)))
}

pub fn test_connection() -> StreamConnection {
    StreamConnection::new(
        sender_account(),
        RECEIVER_ADDRESS.clone(),
        SharedSecret::new(TEST_SECRET),
    )
}

/// XRP is worth 0.25 USD.
pub fn test_oracle() -> InMemoryExchangeRateProvider {
    let mut rates = HashMap::new();
    rates.insert("USD".to_string(), Decimal::new(1, 0));
    rates.insert("XRP".to_string(), Decimal::new(4, 0));
    rates.insert("EUR".to_string(), Decimal::new(9, 1));
    InMemoryExchangeRateProvider::new(rates)
}

pub fn test_options(amount_to_send: Decimal) -> PaymentOptions {
    PaymentOptions {
        sender: sender_account(),
        amount_to_send,
        destination_payment_pointer: "$receiver.example".to_string(),
        slippage: Slippage::ONE_PERCENT,
    }
}

pub fn test_payer(path: Arc<TestPath>) -> StreamPayer {
    StreamPayer::new(
        path,
        Arc::new(TestSpspClient::ok()),
        Arc::new(test_oracle()),
        StreamPayerConfig::default(),
    )
}

pub struct TestSpspClient {
    result: Result<StreamConnectionDetails, SpspError>,
}

impl TestSpspClient {
    pub fn ok() -> Self {
        TestSpspClient {
            result: Ok(StreamConnectionDetails {
                destination_account: RECEIVER_ADDRESS.clone(),
                shared_secret: SharedSecret::new(TEST_SECRET),
            }),
        }
    }

    pub fn with_destination(destination_account: &str) -> Self {
        TestSpspClient {
            result: Ok(StreamConnectionDetails {
                destination_account: Address::from_str(destination_account).unwrap(),
                shared_secret: SharedSecret::new(TEST_SECRET),
            }),
        }
    }

    pub fn failing() -> Self {
        TestSpspClient {
            result: Err(SpspError::HttpError("connection refused".to_string())),
        }
    }
}

#[async_trait]
impl SpspClient for TestSpspClient {
    async fn get_stream_connection_details(
        &self,
        _payment_pointer: &str,
    ) -> Result<StreamConnectionDetails, SpspError> {
        self.result.clone()
    }
}

/// A connector path that converts at `numerator / denominator` (rounding
/// down) and ends at a STREAM receiver using `TEST_SECRET`.
pub struct TestPath {
    rate: Mutex<(u64, u64)>,
    max_packet_amount: Option<u64>,
    receiver_asset: Option<Denomination>,
    receive_max: Option<u64>,
    fail_money_packets_with: Option<ErrorCode>,
    prepares: Mutex<Vec<Prepare>>,
    fulfilled: Mutex<Vec<(u64, u64)>>,
}

impl TestPath {
    /// The receiver holds USD with scale 6.
    pub fn new(numerator: u64, denominator: u64) -> Self {
        TestPath {
            rate: Mutex::new((numerator, denominator)),
            max_packet_amount: None,
            receiver_asset: Some(Denomination::new("USD", 6)),
            receive_max: None,
            fail_money_packets_with: None,
            prepares: Mutex::new(Vec::new()),
            fulfilled: Mutex::new(Vec::new()),
        }
    }

    pub fn with_max_packet_amount(mut self, max_packet_amount: u64) -> Self {
        self.max_packet_amount = Some(max_packet_amount);
        self
    }

    pub fn with_receiver_asset(mut self, receiver_asset: Option<Denomination>) -> Self {
        self.receiver_asset = receiver_asset;
        self
    }

    pub fn with_receive_max(mut self, receive_max: u64) -> Self {
        self.receive_max = Some(receive_max);
        self
    }

    /// Fulfillable packets are rejected by a connector with `code`.
    pub fn failing_money_packets_with(mut self, code: ErrorCode) -> Self {
        self.fail_money_packets_with = Some(code);
        self
    }

    pub fn set_rate(&self, numerator: u64, denominator: u64) {
        *self.rate.lock() = (numerator, denominator);
    }

    pub fn packets_sent(&self) -> usize {
        self.prepares.lock().len()
    }

    /// Source and destination amount of every fulfilled packet
    pub fn fulfilled(&self) -> Vec<(u64, u64)> {
        self.fulfilled.lock().clone()
    }

    pub fn total_received(&self) -> u64 {
        self.fulfilled.lock().iter().map(|(_, received)| received).sum()
    }

    /// Answer `prepare` the way the connector and receiver would.
    pub fn handle(&self, prepare: Prepare) -> IlpResult {
        self.prepares.lock().push(prepare.clone());
        let amount = prepare.amount();

        if let Some(max) = self.max_packet_amount {
            if amount > max {
                return Err(RejectBuilder {
                    code: ErrorCode::F08_AMOUNT_TOO_LARGE,
                    message: b"Packet size is too large",
                    triggered_by: None,
                    data: &MaxPacketAmountDetails::new(amount, max).to_bytes(),
                }
                .build());
            }
        }

        let (numerator, denominator) = *self.rate.lock();
        let destination_amount =
            (u128::from(amount) * u128::from(numerator) / u128::from(denominator)) as u64;

        let packet =
            match StreamPacket::from_encrypted(&TEST_SECRET, BytesMut::from(prepare.data())) {
                Ok(packet) => packet,
                Err(_) => {
                    return Err(RejectBuilder {
                        code: ErrorCode::F06_UNEXPECTED_PAYMENT,
                        message: b"Unable to decrypt",
                        triggered_by: None,
                        data: &[],
                    }
                    .build())
                }
            };

        let fulfillment = generate_fulfillment(&TEST_SECRET, prepare.data());
        let is_fulfillable = hash_sha256(&fulfillment)[..] == prepare.execution_condition()[..];
        if is_fulfillable {
            if let Some(code) = self.fail_money_packets_with {
                return Err(RejectBuilder {
                    code,
                    message: b"Connector failure",
                    triggered_by: None,
                    data: &[],
                }
                .build());
            }
        }

        let total_received = self.total_received();
        let mut frames = Vec::new();
        let wants_details = packet
            .frames()
            .any(|frame| matches!(frame, Frame::ConnectionNewAddress(_)));
        if let (true, Some(asset)) = (wants_details, &self.receiver_asset) {
            frames.push(Frame::ConnectionAssetDetails(ConnectionAssetDetailsFrame {
                source_asset_code: asset.asset_code(),
                source_asset_scale: asset.asset_scale(),
            }));
        }
        if let Some(receive_max) = self.receive_max {
            frames.push(Frame::StreamMaxMoney(StreamMaxMoneyFrame {
                stream_id: 1,
                receive_max,
                total_received,
            }));
        }

        let within_receive_max = self
            .receive_max
            .map(|max| total_received + destination_amount <= max)
            .unwrap_or(true);
        let accept = is_fulfillable
            && amount > 0
            && destination_amount >= packet.prepare_amount()
            && within_receive_max;

        let reply = StreamPacketBuilder {
            sequence: packet.sequence(),
            ilp_packet_type: if accept {
                PacketType::Fulfill
            } else {
                PacketType::Reject
            },
            prepare_amount: destination_amount,
            frames: &frames,
        }
        .build()
        .into_encrypted(&TEST_SECRET);

        if accept {
            self.fulfilled.lock().push((amount, destination_amount));
            Ok(FulfillBuilder {
                fulfillment: &fulfillment,
                data: &reply[..],
            }
            .build())
        } else {
            Err(RejectBuilder {
                code: ErrorCode::F99_APPLICATION_ERROR,
                message: &[],
                triggered_by: None,
                data: &reply[..],
            }
            .build())
        }
    }
}

#[async_trait]
impl Link for TestPath {
    async fn send_packet(&self, prepare: Prepare) -> IlpResult {
        self.handle(prepare)
    }
}
