mod crypto;
mod packet;

pub use crypto::{generate_condition, generate_fulfillment, hash_sha256, random_condition};
pub use packet::{
    ConnectionAssetDetailsFrame, ConnectionCloseFrame, ConnectionNewAddressFrame, ErrorCode,
    Frame, FrameIterator, FrameType, PacketType, ParseError, SerializableFrame, StreamCloseFrame,
    StreamMaxMoneyFrame, StreamMoneyFrame, StreamPacket, StreamPacketBuilder,
};
