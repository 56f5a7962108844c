use super::crypto::{decrypt, encrypt};
use byteorder::{BigEndian, ByteOrder, ReadBytesExt};
use bytes::BytesMut;
use interledger_packet::Address;
use std::{convert::TryFrom, fmt, str, str::FromStr};
use tracing::warn;

const STREAM_VERSION: u8 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] str::Utf8Error),
    #[error("Invalid packet: {0}")]
    InvalidPacket(String),
}

/// The ILP packet type a STREAM packet is carried in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Prepare = 12,
    Fulfill = 13,
    Reject = 14,
}

impl TryFrom<u8> for PacketType {
    type Error = ParseError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            12 => Ok(PacketType::Prepare),
            13 => Ok(PacketType::Fulfill),
            14 => Ok(PacketType::Reject),
            _ => Err(ParseError::InvalidPacket(format!(
                "Unknown packet type: {}",
                byte
            ))),
        }
    }
}

pub struct StreamPacketBuilder<'a> {
    pub sequence: u64,
    pub ilp_packet_type: PacketType,
    pub prepare_amount: u64,
    pub frames: &'a [Frame<'a>],
}

impl<'a> StreamPacketBuilder<'a> {
    pub fn build(&self) -> StreamPacket {
        let mut buffer_unencrypted = Vec::new();

        buffer_unencrypted.push(STREAM_VERSION);
        buffer_unencrypted.push(self.ilp_packet_type as u8);
        put_var_uint(&mut buffer_unencrypted, self.sequence);
        put_var_uint(&mut buffer_unencrypted, self.prepare_amount);
        let frame_count = self
            .frames
            .iter()
            .filter(|frame| **frame != Frame::Unknown)
            .count();
        put_var_uint(&mut buffer_unencrypted, frame_count as u64);
        let frames_offset = buffer_unencrypted.len();

        for frame in self.frames {
            let mut contents = Vec::new();
            let frame_type = match frame {
                Frame::ConnectionClose(frame) => {
                    frame.put_contents(&mut contents);
                    FrameType::ConnectionClose
                }
                Frame::ConnectionNewAddress(frame) => {
                    frame.put_contents(&mut contents);
                    FrameType::ConnectionNewAddress
                }
                Frame::ConnectionAssetDetails(frame) => {
                    frame.put_contents(&mut contents);
                    FrameType::ConnectionAssetDetails
                }
                Frame::StreamClose(frame) => {
                    frame.put_contents(&mut contents);
                    FrameType::StreamClose
                }
                Frame::StreamMoney(frame) => {
                    frame.put_contents(&mut contents);
                    FrameType::StreamMoney
                }
                Frame::StreamMaxMoney(frame) => {
                    frame.put_contents(&mut contents);
                    FrameType::StreamMaxMoney
                }
                Frame::Unknown => continue,
            };
            buffer_unencrypted.push(frame_type as u8);
            put_var_octet_string(&mut buffer_unencrypted, &contents);
        }

        StreamPacket {
            buffer_unencrypted: BytesMut::from(&buffer_unencrypted[..]),
            sequence: self.sequence,
            ilp_packet_type: self.ilp_packet_type,
            prepare_amount: self.prepare_amount,
            frames_offset,
        }
    }
}

#[derive(PartialEq, Clone)]
pub struct StreamPacket {
    buffer_unencrypted: BytesMut,
    sequence: u64,
    ilp_packet_type: PacketType,
    prepare_amount: u64,
    frames_offset: usize,
}

impl StreamPacket {
    pub fn from_encrypted(shared_secret: &[u8], ciphertext: BytesMut) -> Result<Self, ParseError> {
        let decrypted = decrypt(shared_secret, ciphertext)
            .map_err(|_| ParseError::InvalidPacket(String::from("Unable to decrypt packet")))?;
        StreamPacket::from_bytes_unencrypted(decrypted)
    }

    fn from_bytes_unencrypted(buffer_unencrypted: BytesMut) -> Result<Self, ParseError> {
        let mut reader = &buffer_unencrypted[..];
        let version = reader.read_u8()?;
        if version != STREAM_VERSION {
            return Err(ParseError::InvalidPacket(format!(
                "Unsupported STREAM version: {}",
                version
            )));
        }
        let ilp_packet_type = PacketType::try_from(reader.read_u8()?)?;
        let sequence = read_var_uint(&mut reader)?;
        let prepare_amount = read_var_uint(&mut reader)?;
        let num_frames = read_var_uint(&mut reader)?;
        let frames_offset = buffer_unencrypted.len() - reader.len();

        let mut frames = FrameIterator { buffer: reader };
        let mut parsed = 0u64;
        while !frames.buffer.is_empty() {
            frames.try_read_next_frame()?;
            parsed += 1;
        }
        if parsed != num_frames {
            return Err(ParseError::InvalidPacket(format!(
                "Expected {} frames but found {}",
                num_frames, parsed
            )));
        }

        Ok(StreamPacket {
            buffer_unencrypted,
            sequence,
            ilp_packet_type,
            prepare_amount,
            frames_offset,
        })
    }

    pub fn into_encrypted(self, shared_secret: &[u8]) -> BytesMut {
        encrypt(shared_secret, self.buffer_unencrypted)
    }

    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[inline]
    pub fn ilp_packet_type(&self) -> PacketType {
        self.ilp_packet_type
    }

    /// Amount the packet's recipient received (or, in a Prepare, the minimum it should accept)
    #[inline]
    pub fn prepare_amount(&self) -> u64 {
        self.prepare_amount
    }

    pub fn frames(&self) -> FrameIterator {
        FrameIterator {
            buffer: &self.buffer_unencrypted[self.frames_offset..],
        }
    }
}

impl fmt::Debug for StreamPacket {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "StreamPacket {{ sequence: {}, ilp_packet_type: {:?}, prepare_amount: {}, frames: {:?} }}",
            self.sequence,
            self.ilp_packet_type,
            self.prepare_amount,
            self.frames()
        )
    }
}

pub struct FrameIterator<'a> {
    buffer: &'a [u8],
}

impl<'a> FrameIterator<'a> {
    fn try_read_next_frame(&mut self) -> Result<Frame<'a>, ParseError> {
        let frame_type = self.buffer.read_u8()?;
        let contents: &'a [u8] = read_var_octet_string(&mut self.buffer)?;
        let frame = match FrameType::from(frame_type) {
            FrameType::ConnectionClose => {
                Frame::ConnectionClose(ConnectionCloseFrame::read_contents(contents)?)
            }
            FrameType::ConnectionNewAddress => {
                Frame::ConnectionNewAddress(ConnectionNewAddressFrame::read_contents(contents)?)
            }
            FrameType::ConnectionAssetDetails => Frame::ConnectionAssetDetails(
                ConnectionAssetDetailsFrame::read_contents(contents)?,
            ),
            FrameType::StreamClose => Frame::StreamClose(StreamCloseFrame::read_contents(contents)?),
            FrameType::StreamMoney => Frame::StreamMoney(StreamMoneyFrame::read_contents(contents)?),
            FrameType::StreamMaxMoney => {
                Frame::StreamMaxMoney(StreamMaxMoneyFrame::read_contents(contents)?)
            }
            FrameType::Unknown => Frame::Unknown,
        };
        Ok(frame)
    }
}

impl<'a> Iterator for FrameIterator<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.buffer.is_empty() {
            match self.try_read_next_frame() {
                Ok(frame) => return Some(frame),
                Err(err) => warn!("Error reading STREAM frame: {:?}", err),
            }
        }
        None
    }
}

impl<'a> fmt::Debug for FrameIterator<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(FrameIterator {
                buffer: self.buffer,
            })
            .finish()
    }
}

/// The frames a sender writes or needs to understand. Anything else the
/// receiver sends is surfaced as `Unknown`.
#[derive(Debug, PartialEq, Clone)]
pub enum Frame<'a> {
    ConnectionClose(ConnectionCloseFrame<'a>),
    ConnectionNewAddress(ConnectionNewAddressFrame),
    ConnectionAssetDetails(ConnectionAssetDetailsFrame<'a>),
    StreamClose(StreamCloseFrame<'a>),
    StreamMoney(StreamMoneyFrame),
    StreamMaxMoney(StreamMaxMoneyFrame),
    Unknown,
}

#[derive(Debug, PartialEq, Clone, Copy)]
#[repr(u8)]
pub enum FrameType {
    ConnectionClose = 0x01,
    ConnectionNewAddress = 0x02,
    ConnectionAssetDetails = 0x07,
    StreamClose = 0x10,
    StreamMoney = 0x11,
    StreamMaxMoney = 0x12,
    Unknown,
}

impl From<u8> for FrameType {
    fn from(num: u8) -> Self {
        match num {
            0x01 => FrameType::ConnectionClose,
            0x02 => FrameType::ConnectionNewAddress,
            0x07 => FrameType::ConnectionAssetDetails,
            0x10 => FrameType::StreamClose,
            0x11 => FrameType::StreamMoney,
            0x12 => FrameType::StreamMaxMoney,
            _ => FrameType::Unknown,
        }
    }
}

/// STREAM-level error codes carried by close frames.
#[derive(Debug, PartialEq, Clone, Copy)]
#[repr(u8)]
pub enum ErrorCode {
    NoError = 0x01,
    InternalError = 0x02,
    EndpointBusy = 0x03,
    FlowControlError = 0x04,
    StreamIdError = 0x05,
    StreamStateError = 0x06,
    FrameFormatError = 0x07,
    ProtocolViolation = 0x08,
    ApplicationError = 0x09,
    Unknown,
}

impl From<u8> for ErrorCode {
    fn from(num: u8) -> Self {
        match num {
            0x01 => ErrorCode::NoError,
            0x02 => ErrorCode::InternalError,
            0x03 => ErrorCode::EndpointBusy,
            0x04 => ErrorCode::FlowControlError,
            0x05 => ErrorCode::StreamIdError,
            0x06 => ErrorCode::StreamStateError,
            0x07 => ErrorCode::FrameFormatError,
            0x08 => ErrorCode::ProtocolViolation,
            0x09 => ErrorCode::ApplicationError,
            _ => ErrorCode::Unknown,
        }
    }
}

pub trait SerializableFrame<'a>: Sized {
    fn put_contents(&self, buf: &mut Vec<u8>);

    fn read_contents(reader: &'a [u8]) -> Result<Self, ParseError>;
}

#[derive(Debug, PartialEq, Clone)]
pub struct ConnectionCloseFrame<'a> {
    pub code: ErrorCode,
    pub message: &'a str,
}

impl<'a> SerializableFrame<'a> for ConnectionCloseFrame<'a> {
    fn read_contents(mut reader: &'a [u8]) -> Result<Self, ParseError> {
        let code = ErrorCode::from(reader.read_u8()?);
        let message = str::from_utf8(read_var_octet_string(&mut reader)?)?;

        Ok(ConnectionCloseFrame { code, message })
    }

    fn put_contents(&self, buf: &mut Vec<u8>) {
        buf.push(self.code as u8);
        put_var_octet_string(buf, self.message.as_bytes());
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ConnectionNewAddressFrame {
    pub source_account: Address,
}

impl<'a> SerializableFrame<'a> for ConnectionNewAddressFrame {
    fn read_contents(mut reader: &'a [u8]) -> Result<Self, ParseError> {
        let address = str::from_utf8(read_var_octet_string(&mut reader)?)?;
        let source_account = Address::from_str(address).map_err(|_| {
            ParseError::InvalidPacket(format!("Invalid ILP address: {}", address))
        })?;

        Ok(ConnectionNewAddressFrame { source_account })
    }

    fn put_contents(&self, buf: &mut Vec<u8>) {
        put_var_octet_string(buf, self.source_account.to_string().as_bytes());
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct ConnectionAssetDetailsFrame<'a> {
    pub source_asset_code: &'a str,
    pub source_asset_scale: u8,
}

impl<'a> SerializableFrame<'a> for ConnectionAssetDetailsFrame<'a> {
    fn read_contents(mut reader: &'a [u8]) -> Result<Self, ParseError> {
        let source_asset_code = str::from_utf8(read_var_octet_string(&mut reader)?)?;
        let source_asset_scale = reader.read_u8()?;

        Ok(ConnectionAssetDetailsFrame {
            source_asset_code,
            source_asset_scale,
        })
    }

    fn put_contents(&self, buf: &mut Vec<u8>) {
        put_var_octet_string(buf, self.source_asset_code.as_bytes());
        buf.push(self.source_asset_scale);
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct StreamCloseFrame<'a> {
    pub stream_id: u64,
    pub code: ErrorCode,
    pub message: &'a str,
}

impl<'a> SerializableFrame<'a> for StreamCloseFrame<'a> {
    fn read_contents(mut reader: &'a [u8]) -> Result<Self, ParseError> {
        let stream_id = read_var_uint(&mut reader)?;
        let code = ErrorCode::from(reader.read_u8()?);
        let message = str::from_utf8(read_var_octet_string(&mut reader)?)?;

        Ok(StreamCloseFrame {
            stream_id,
            code,
            message,
        })
    }

    fn put_contents(&self, buf: &mut Vec<u8>) {
        put_var_uint(buf, self.stream_id);
        buf.push(self.code as u8);
        put_var_octet_string(buf, self.message.as_bytes());
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct StreamMoneyFrame {
    pub stream_id: u64,
    pub shares: u64,
}

impl<'a> SerializableFrame<'a> for StreamMoneyFrame {
    fn read_contents(mut reader: &'a [u8]) -> Result<Self, ParseError> {
        let stream_id = read_var_uint(&mut reader)?;
        let shares = read_var_uint(&mut reader)?;

        Ok(StreamMoneyFrame { stream_id, shares })
    }

    fn put_contents(&self, buf: &mut Vec<u8>) {
        put_var_uint(buf, self.stream_id);
        put_var_uint(buf, self.shares);
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct StreamMaxMoneyFrame {
    pub stream_id: u64,
    pub receive_max: u64,
    pub total_received: u64,
}

impl<'a> SerializableFrame<'a> for StreamMaxMoneyFrame {
    fn read_contents(mut reader: &'a [u8]) -> Result<Self, ParseError> {
        let stream_id = read_var_uint(&mut reader)?;
        let receive_max = saturating_read_var_uint(&mut reader)?;
        let total_received = read_var_uint(&mut reader)?;

        Ok(StreamMaxMoneyFrame {
            stream_id,
            receive_max,
            total_received,
        })
    }

    fn put_contents(&self, buf: &mut Vec<u8>) {
        put_var_uint(buf, self.stream_id);
        put_var_uint(buf, self.receive_max);
        put_var_uint(buf, self.total_received);
    }
}

fn read_var_octet_string<'a>(reader: &mut &'a [u8]) -> Result<&'a [u8], ParseError> {
    let first = reader.read_u8()?;
    let length = if first & 0x80 == 0 {
        usize::from(first)
    } else {
        let length_of_length = usize::from(first & 0x7f);
        if length_of_length == 0 || length_of_length > 8 || reader.len() < length_of_length {
            return Err(ParseError::InvalidPacket(
                "Invalid variable-length prefix".to_string(),
            ));
        }
        let length = BigEndian::read_uint(&reader[..length_of_length], length_of_length);
        *reader = &reader[length_of_length..];
        length as usize
    };
    if reader.len() < length {
        return Err(ParseError::InvalidPacket(format!(
            "Expected {} bytes but only {} remain",
            length,
            reader.len()
        )));
    }
    let (contents, rest) = reader.split_at(length);
    *reader = rest;
    Ok(contents)
}

fn read_var_uint(reader: &mut &[u8]) -> Result<u64, ParseError> {
    let bytes = read_var_octet_string(reader)?;
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(ParseError::InvalidPacket(format!(
            "Invalid variable-length integer of {} bytes",
            bytes.len()
        )));
    }
    Ok(BigEndian::read_uint(bytes, bytes.len()))
}

/// See: https://github.com/interledger/rfcs/blob/master/0029-stream/0029-stream.md#514-maximum-varuint-size
fn saturating_read_var_uint(reader: &mut &[u8]) -> Result<u64, ParseError> {
    let mut peek = *reader;
    if read_var_octet_string(&mut peek)?.len() > 8 {
        *reader = peek;
        Ok(u64::max_value())
    } else {
        read_var_uint(reader)
    }
}

fn put_var_octet_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    let length = bytes.len();
    if length < 128 {
        buf.push(length as u8);
    } else {
        let mut length_bytes = [0; 8];
        BigEndian::write_u64(&mut length_bytes, length as u64);
        let skip = length_bytes.iter().take_while(|byte| **byte == 0).count();
        buf.push(0x80 | (8 - skip) as u8);
        buf.extend_from_slice(&length_bytes[skip..]);
    }
    buf.extend_from_slice(bytes);
}

fn put_var_uint(buf: &mut Vec<u8>, value: u64) {
    let mut bytes = [0; 8];
    BigEndian::write_u64(&mut bytes, value);
    // Always at least one byte, even for zero
    let skip = bytes.iter().take(7).take_while(|byte| **byte == 0).count();
    put_var_octet_string(buf, &bytes[skip..]);
}

#[cfg(test)]
mod serialization {
    use super::*;
    use once_cell::sync::Lazy;

    static PACKET: Lazy<StreamPacket> = Lazy::new(|| {
        StreamPacketBuilder {
            sequence: 1,
            ilp_packet_type: PacketType::Prepare,
            prepare_amount: 99,
            frames: &[
                Frame::ConnectionClose(ConnectionCloseFrame {
                    code: ErrorCode::NoError,
                    message: "oop",
                }),
                Frame::ConnectionNewAddress(ConnectionNewAddressFrame {
                    source_account: Address::from_str("example.blah").unwrap(),
                }),
                Frame::ConnectionAssetDetails(ConnectionAssetDetailsFrame {
                    source_asset_code: "XYZ",
                    source_asset_scale: 9,
                }),
                Frame::StreamClose(StreamCloseFrame {
                    stream_id: 76,
                    code: ErrorCode::InternalError,
                    message: "blah",
                }),
                Frame::StreamMoney(StreamMoneyFrame {
                    stream_id: 88,
                    shares: 99,
                }),
                Frame::StreamMaxMoney(StreamMaxMoneyFrame {
                    stream_id: 11,
                    receive_max: 987,
                    total_received: 500,
                }),
            ],
        }
        .build()
    });

    static SERIALIZED: &[u8] = &[
        1, 12, 1, 1, 1, 99, 1, 6, 1, 5, 1, 3, 111, 111, 112, 2, 13, 12, 101, 120, 97, 109, 112,
        108, 101, 46, 98, 108, 97, 104, 7, 5, 3, 88, 89, 90, 9, 16, 8, 1, 76, 2, 4, 98, 108, 97,
        104, 17, 4, 1, 88, 1, 99, 18, 8, 1, 11, 2, 3, 219, 2, 1, 244,
    ];

    // A packet written by the JavaScript implementation, including frames a sender ignores
    static SERIALIZED_WITH_DATA_FRAMES: &[u8] = &[
        1, 12, 1, 1, 1, 99, 1, 14, 1, 5, 1, 3, 111, 111, 112, 2, 13, 12, 101, 120, 97, 109, 112,
        108, 101, 46, 98, 108, 97, 104, 3, 3, 2, 3, 232, 4, 3, 2, 7, 208, 5, 3, 2, 11, 184, 6, 3,
        2, 15, 160, 7, 5, 3, 88, 89, 90, 9, 16, 8, 1, 76, 2, 4, 98, 108, 97, 104, 17, 4, 1, 88, 1,
        99, 18, 8, 1, 11, 2, 3, 219, 2, 1, 244, 19, 8, 1, 66, 2, 78, 32, 2, 23, 112, 20, 11, 1, 34,
        2, 35, 40, 5, 104, 101, 108, 108, 111, 21, 5, 1, 35, 2, 34, 62, 22, 6, 2, 3, 120, 2, 173,
        156,
    ];

    #[test]
    fn it_serializes_to_same_as_javascript() {
        assert_eq!(&PACKET.buffer_unencrypted[..], SERIALIZED);
    }

    #[test]
    fn it_deserializes_from_javascript() {
        assert_eq!(
            StreamPacket::from_bytes_unencrypted(BytesMut::from(SERIALIZED)).unwrap(),
            *PACKET
        );
    }

    #[test]
    fn it_skips_frames_it_does_not_understand() {
        let packet =
            StreamPacket::from_bytes_unencrypted(BytesMut::from(SERIALIZED_WITH_DATA_FRAMES))
                .unwrap();
        let frames: Vec<Frame> = packet.frames().collect();
        assert_eq!(frames.len(), 14);
        assert_eq!(
            frames.iter().filter(|frame| **frame == Frame::Unknown).count(),
            8
        );
        assert_eq!(
            frames[6],
            Frame::ConnectionAssetDetails(ConnectionAssetDetailsFrame {
                source_asset_code: "XYZ",
                source_asset_scale: 9,
            })
        );
    }

    #[test]
    fn it_iterates_through_the_frames() {
        let mut iter = PACKET.frames();
        assert_eq!(
            iter.next().unwrap(),
            Frame::ConnectionClose(ConnectionCloseFrame {
                code: ErrorCode::NoError,
                message: "oop"
            })
        );
        assert_eq!(
            iter.next().unwrap(),
            Frame::ConnectionNewAddress(ConnectionNewAddressFrame {
                source_account: Address::from_str("example.blah").unwrap()
            })
        );
        assert_eq!(iter.count(), 4);
    }

    #[test]
    fn it_round_trips_through_encryption() {
        let secret = [9; 32];
        let encrypted = PACKET.clone().into_encrypted(&secret);
        let decrypted = StreamPacket::from_encrypted(&secret, encrypted).unwrap();
        assert_eq!(decrypted, *PACKET);
        assert!(StreamPacket::from_encrypted(&[1; 32], PACKET.clone().into_encrypted(&secret))
            .is_err());
    }

    #[test]
    fn it_rejects_wrong_frame_count() {
        let mut bytes = SERIALIZED.to_vec();
        bytes[7] = 7;
        assert!(StreamPacket::from_bytes_unencrypted(BytesMut::from(&bytes[..])).is_err());
    }

    #[test]
    fn it_saturates_max_money_frame_receive_max() {
        let mut buffer = Vec::new();
        put_var_uint(&mut buffer, 123);
        put_var_octet_string(
            &mut buffer,
            &[0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09],
        );
        put_var_uint(&mut buffer, 123);
        let frame = StreamMaxMoneyFrame::read_contents(&buffer).unwrap();
        assert_eq!(frame.receive_max, u64::max_value());
        assert_eq!(frame.total_received, 123);
    }

    #[test]
    fn it_encodes_var_uints_minimally() {
        let mut buffer = Vec::new();
        put_var_uint(&mut buffer, 0);
        put_var_uint(&mut buffer, 1000);
        put_var_uint(&mut buffer, u64::max_value());
        assert_eq!(
            buffer,
            vec![1, 0, 2, 3, 232, 8, 255, 255, 255, 255, 255, 255, 255, 255]
        );
        let mut reader = &buffer[..];
        assert_eq!(read_var_uint(&mut reader).unwrap(), 0);
        assert_eq!(read_var_uint(&mut reader).unwrap(), 1000);
        assert_eq!(read_var_uint(&mut reader).unwrap(), u64::max_value());
        assert!(reader.is_empty());
    }

    #[test]
    fn it_handles_long_octet_strings() {
        let mut buffer = Vec::new();
        put_var_octet_string(&mut buffer, &[7; 300]);
        assert_eq!(&buffer[..3], &[0x82, 1, 44]);
        let mut reader = &buffer[..];
        assert_eq!(read_var_octet_string(&mut reader).unwrap(), &[7; 300][..]);
    }
}
