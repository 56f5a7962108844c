use crate::connection::{Denomination, StreamConnection};
use crate::link::Link;
use crate::stream::{
    generate_condition, hash_sha256, random_condition, ConnectionAssetDetailsFrame,
    ConnectionCloseFrame, ConnectionNewAddressFrame, ErrorCode as StreamErrorCode, Frame,
    PacketType, StreamMaxMoneyFrame, StreamMoneyFrame, StreamPacket, StreamPacketBuilder,
};
use bytes::BytesMut;
use interledger_packet::{ErrorCode, PrepareBuilder};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// All money goes over a single stream.
pub(crate) const DEFAULT_STREAM_ID: u64 = 1;

/// A single STREAM packet the sender is about to send.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StreamRequest {
    pub sequence: u64,
    /// Amount of the ILP Prepare, in source units
    pub source_amount: u64,
    /// Least the receiver may accept, in destination units
    pub min_destination_amount: u64,
    /// Unfulfillable packets are used to probe the path and carry no value
    pub is_fulfillable: bool,
    /// Include our address and asset details so the receiver can reply with theirs
    pub send_connection_details: bool,
    /// Ask the receiver to close the connection
    pub close_connection: bool,
}

/// What an authenticated STREAM reply from the receiver told us.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReceiverReply {
    /// Amount the receiver got, in destination units
    pub destination_amount: u64,
    pub asset_details: Option<Denomination>,
    /// Most the receiver will accept on the stream, if it said
    pub receive_max: Option<u64>,
    /// Total the receiver has accepted on the stream so far
    pub total_received: Option<u64>,
    /// The receiver closed the connection or the stream
    pub closed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreamReject {
    pub code: ErrorCode,
    pub message: String,
    /// Raw data of the ILP Reject, for example the F08 max packet details
    pub data: Vec<u8>,
    pub receiver: Option<ReceiverReply>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StreamReply {
    Fulfill(Option<ReceiverReply>),
    Reject(StreamReject),
}

impl StreamReply {
    pub fn is_fulfill(&self) -> bool {
        match self {
            StreamReply::Fulfill(_) => true,
            StreamReply::Reject(_) => false,
        }
    }

    pub fn reject(&self) -> Option<&StreamReject> {
        match self {
            StreamReply::Fulfill(_) => None,
            StreamReply::Reject(reject) => Some(reject),
        }
    }

    /// Present only when the receiver's reply could be decrypted and matched the request.
    pub fn receiver(&self) -> Option<&ReceiverReply> {
        match self {
            StreamReply::Fulfill(receiver) => receiver.as_ref(),
            StreamReply::Reject(reject) => reject.receiver.as_ref(),
        }
    }

    pub fn destination_amount(&self) -> Option<u64> {
        self.receiver().map(|receiver| receiver.destination_amount)
    }

    fn local_reject(code: ErrorCode, message: &str) -> Self {
        StreamReply::Reject(StreamReject {
            code,
            message: message.to_string(),
            data: Vec::new(),
            receiver: None,
        })
    }
}

/// Encrypt `request`, send it over `link` and interpret whatever comes back.
///
/// Never fails: a packet that does not settle before it expires becomes a
/// local `R00` reject and a fulfillment that does not match the condition
/// becomes a local `F05` reject.
pub(crate) async fn send_request(
    link: &dyn Link,
    connection: &StreamConnection,
    request: &StreamRequest,
    expiry: Duration,
) -> StreamReply {
    let secret = connection.shared_secret().as_ref();
    let source_account = connection.source_account();

    let mut frames = Vec::new();
    if request.source_amount > 0 {
        frames.push(Frame::StreamMoney(StreamMoneyFrame {
            stream_id: DEFAULT_STREAM_ID,
            shares: 1,
        }));
    }
    if request.send_connection_details {
        frames.push(Frame::ConnectionNewAddress(ConnectionNewAddressFrame {
            source_account: source_account.interledger_address().clone(),
        }));
        if let Some(denomination) = source_account.denomination() {
            frames.push(Frame::ConnectionAssetDetails(ConnectionAssetDetailsFrame {
                source_asset_code: denomination.asset_code(),
                source_asset_scale: denomination.asset_scale(),
            }));
        }
    }
    if request.close_connection {
        frames.push(Frame::ConnectionClose(ConnectionCloseFrame {
            code: StreamErrorCode::NoError,
            message: "",
        }));
    }

    let stream_packet = StreamPacketBuilder {
        sequence: request.sequence,
        ilp_packet_type: PacketType::Prepare,
        prepare_amount: request.min_destination_amount,
        frames: &frames,
    }
    .build();
    debug!(
        "Sending packet {} with amount: {} and encrypted STREAM packet: {:?}",
        request.sequence, request.source_amount, stream_packet
    );

    let data = stream_packet.into_encrypted(secret);
    let execution_condition = if request.is_fulfillable {
        generate_condition(secret, &data)
    } else {
        random_condition()
    };
    let prepare = PrepareBuilder {
        destination: connection.destination_address().clone(),
        amount: request.source_amount,
        execution_condition: &execution_condition,
        expires_at: SystemTime::now() + expiry,
        data: &data[..],
    }
    .build();

    let result = match tokio::time::timeout(expiry, link.send_packet(prepare)).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Packet {} expired without a reply", request.sequence);
            return StreamReply::local_reject(
                ErrorCode::R00_TRANSFER_TIMED_OUT,
                "Packet expired",
            );
        }
    };

    match result {
        Ok(fulfill) => {
            if hash_sha256(fulfill.fulfillment()) != execution_condition {
                warn!(
                    "Fulfillment for packet {} does not match the condition",
                    request.sequence
                );
                return StreamReply::local_reject(
                    ErrorCode::F05_WRONG_CONDITION,
                    "Fulfillment did not match condition",
                );
            }
            let receiver =
                read_receiver_reply(secret, fulfill.data(), request, PacketType::Fulfill);
            debug!(
                "Packet {} was fulfilled with {}, receiver got: {:?}",
                request.sequence,
                hex::encode(fulfill.fulfillment()),
                receiver.as_ref().map(|reply| reply.destination_amount)
            );
            StreamReply::Fulfill(receiver)
        }
        Err(reject) => {
            let receiver = read_receiver_reply(secret, reject.data(), request, PacketType::Reject);
            debug!(
                "Packet {} was rejected with code: {:?}",
                request.sequence,
                reject.code()
            );
            StreamReply::Reject(StreamReject {
                code: reject.code(),
                message: String::from_utf8_lossy(reject.message()).to_string(),
                data: reject.data().to_vec(),
                receiver,
            })
        }
    }
}

fn read_receiver_reply(
    secret: &[u8],
    data: &[u8],
    request: &StreamRequest,
    expected_type: PacketType,
) -> Option<ReceiverReply> {
    if data.is_empty() {
        return None;
    }
    // Connectors put their own data in rejects (F08 details), so this is often not STREAM
    let packet = StreamPacket::from_encrypted(secret, BytesMut::from(data)).ok()?;
    if packet.sequence() != request.sequence || packet.ilp_packet_type() != expected_type {
        warn!(
            "Ignoring STREAM reply {:?} that does not match packet {}",
            packet, request.sequence
        );
        return None;
    }

    let mut reply = ReceiverReply {
        destination_amount: packet.prepare_amount(),
        ..ReceiverReply::default()
    };
    for frame in packet.frames() {
        match frame {
            Frame::ConnectionAssetDetails(frame) => {
                reply.asset_details = Some(Denomination::new(
                    frame.source_asset_code,
                    frame.source_asset_scale,
                ));
            }
            Frame::StreamMaxMoney(StreamMaxMoneyFrame {
                stream_id,
                receive_max,
                total_received,
            }) if stream_id == DEFAULT_STREAM_ID => {
                reply.receive_max = Some(receive_max);
                reply.total_received = Some(total_received);
            }
            Frame::StreamClose(frame) if frame.stream_id == DEFAULT_STREAM_ID => {
                reply.closed = true;
            }
            Frame::ConnectionClose(_) => reply.closed = true,
            _ => {}
        }
    }
    Some(reply)
}
