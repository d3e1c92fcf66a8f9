//! RTP/RTCP Packet Buffer
//!
//! A `RawPacket` owns the bytes of one RTP or RTCP packet. Header fields are
//! read in network byte order through `RtpHeader` / `RtcpHeader`, which are
//! parsed on demand and validate that the buffer really holds the header it
//! claims to. Trailing bytes (MKI, SRTCP index, authentication tag) are
//! appended and stripped in place.
//!
//! RTP header extensions are not supported: a packet with the X bit set is
//! rejected rather than risking a mis-computed payload offset.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use srtp_crypto::KeystreamOverflow;
use thiserror::Error;

/// Size of the fixed RTP header in bytes
pub const RTP_HEADER_SIZE: usize = 12;

/// Size of the RTCP header plus sender SSRC, the part SRTCP leaves in the clear
pub const RTCP_HEADER_SIZE: usize = 8;

/// The only RTP/RTCP version in use
pub const RTP_VERSION: u8 = 2;

/// Maximum number of CSRC identifiers (4-bit count)
pub const MAX_CSRC_COUNT: usize = 15;

const VERSION_SHIFT: u8 = 6;
const PADDING_FLAG: u8 = 0x20;
const EXTENSION_FLAG: u8 = 0x10;
const CSRC_COUNT_MASK: u8 = 0x0F;
const MARKER_FLAG: u8 = 0x80;
const PAYLOAD_TYPE_MASK: u8 = 0x7F;
const RTCP_COUNT_MASK: u8 = 0x1F;

/// Packet parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    #[error("Insufficient data: expected {expected} bytes, got {actual}")]
    InsufficientData { expected: usize, actual: usize },

    #[error("Unsupported RTP version: {0}")]
    UnsupportedVersion(u8),

    #[error("RTP header extension present")]
    UnsupportedExtension,

    #[error("Too many CSRC identifiers: {0}")]
    TooManyCsrcs(usize),

    #[error("Payload too large to encrypt: {0} bytes")]
    PayloadTooLarge(usize),
}

impl From<KeystreamOverflow> for PacketError {
    fn from(err: KeystreamOverflow) -> Self {
        PacketError::PayloadTooLarge(err.0)
    }
}

/// Parsed fixed RTP header plus CSRC list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpHeader {
    pub padding: bool,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrcs: Vec<u32>,
}

impl RtpHeader {
    /// Create a header with no CSRCs, padding or marker
    pub fn new(payload_type: u8, sequence_number: u16, timestamp: u32, ssrc: u32) -> Self {
        RtpHeader {
            padding: false,
            marker: false,
            payload_type: payload_type & PAYLOAD_TYPE_MASK,
            sequence_number,
            timestamp,
            ssrc,
            csrcs: Vec::new(),
        }
    }

    /// Header length in bytes, including the CSRC list
    #[inline]
    pub fn len(&self) -> usize {
        RTP_HEADER_SIZE + 4 * self.csrcs.len()
    }

    /// Parse header from bytes (network byte order)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < RTP_HEADER_SIZE {
            return Err(PacketError::InsufficientData {
                expected: RTP_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = bytes;
        let first = buf.get_u8();
        let second = buf.get_u8();

        let version = first >> VERSION_SHIFT;
        if version != RTP_VERSION {
            return Err(PacketError::UnsupportedVersion(version));
        }
        if first & EXTENSION_FLAG != 0 {
            return Err(PacketError::UnsupportedExtension);
        }

        let csrc_count = (first & CSRC_COUNT_MASK) as usize;
        let header_len = RTP_HEADER_SIZE + 4 * csrc_count;
        if bytes.len() < header_len {
            return Err(PacketError::InsufficientData {
                expected: header_len,
                actual: bytes.len(),
            });
        }

        let sequence_number = buf.get_u16();
        let timestamp = buf.get_u32();
        let ssrc = buf.get_u32();
        let csrcs = (0..csrc_count).map(|_| buf.get_u32()).collect();

        Ok(RtpHeader {
            padding: first & PADDING_FLAG != 0,
            marker: second & MARKER_FLAG != 0,
            payload_type: second & PAYLOAD_TYPE_MASK,
            sequence_number,
            timestamp,
            ssrc,
            csrcs,
        })
    }

    /// Serialize header to bytes (network byte order)
    pub fn to_bytes(&self, buf: &mut BytesMut) -> Result<(), PacketError> {
        if self.csrcs.len() > MAX_CSRC_COUNT {
            return Err(PacketError::TooManyCsrcs(self.csrcs.len()));
        }

        let mut first = (RTP_VERSION << VERSION_SHIFT) | self.csrcs.len() as u8;
        if self.padding {
            first |= PADDING_FLAG;
        }
        let mut second = self.payload_type & PAYLOAD_TYPE_MASK;
        if self.marker {
            second |= MARKER_FLAG;
        }

        buf.put_u8(first);
        buf.put_u8(second);
        buf.put_u16(self.sequence_number);
        buf.put_u32(self.timestamp);
        buf.put_u32(self.ssrc);
        for csrc in &self.csrcs {
            buf.put_u32(*csrc);
        }
        Ok(())
    }
}

/// Parsed RTCP common header and sender SSRC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcpHeader {
    pub padding: bool,
    /// Reception report count / subtype
    pub count: u8,
    pub packet_type: u8,
    /// Length in 32-bit words minus one
    pub length: u16,
    pub ssrc: u32,
}

impl RtcpHeader {
    /// Parse header from bytes (network byte order)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < RTCP_HEADER_SIZE {
            return Err(PacketError::InsufficientData {
                expected: RTCP_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut buf = bytes;
        let first = buf.get_u8();
        let version = first >> VERSION_SHIFT;
        if version != RTP_VERSION {
            return Err(PacketError::UnsupportedVersion(version));
        }

        Ok(RtcpHeader {
            padding: first & PADDING_FLAG != 0,
            count: first & RTCP_COUNT_MASK,
            packet_type: buf.get_u8(),
            length: buf.get_u16(),
            ssrc: buf.get_u32(),
        })
    }

    /// Serialize header to bytes (network byte order)
    pub fn to_bytes(&self, buf: &mut BytesMut) {
        let mut first = (RTP_VERSION << VERSION_SHIFT) | (self.count & RTCP_COUNT_MASK);
        if self.padding {
            first |= PADDING_FLAG;
        }
        buf.put_u8(first);
        buf.put_u8(self.packet_type);
        buf.put_u16(self.length);
        buf.put_u32(self.ssrc);
    }
}

/// Owned packet bytes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawPacket {
    buffer: BytesMut,
}

impl RawPacket {
    pub fn new(buffer: BytesMut) -> Self {
        RawPacket { buffer }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        RawPacket {
            buffer: BytesMut::from(bytes),
        }
    }

    /// Build an RTP packet from a header and payload
    pub fn rtp(header: &RtpHeader, payload: &[u8]) -> Result<Self, PacketError> {
        let mut buffer = BytesMut::with_capacity(header.len() + payload.len());
        header.to_bytes(&mut buffer)?;
        buffer.put_slice(payload);
        Ok(RawPacket { buffer })
    }

    /// Build an RTCP packet from a header and the bytes following the sender SSRC
    pub fn rtcp(header: &RtcpHeader, body: &[u8]) -> Self {
        let mut buffer = BytesMut::with_capacity(RTCP_HEADER_SIZE + body.len());
        header.to_bytes(&mut buffer);
        buffer.put_slice(body);
        RawPacket { buffer }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[inline]
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    pub fn into_inner(self) -> BytesMut {
        self.buffer
    }

    pub fn freeze(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Parse the RTP header
    pub fn rtp_header(&self) -> Result<RtpHeader, PacketError> {
        RtpHeader::from_bytes(&self.buffer)
    }

    /// Parse the RTCP header
    pub fn rtcp_header(&self) -> Result<RtcpHeader, PacketError> {
        RtcpHeader::from_bytes(&self.buffer)
    }

    /// SSRC of an RTP packet (bytes 8..12)
    pub fn rtp_ssrc(&self) -> Result<u32, PacketError> {
        self.read_u32(8)
    }

    /// Sender SSRC of an RTCP packet (bytes 4..8)
    pub fn rtcp_ssrc(&self) -> Result<u32, PacketError> {
        self.read_u32(4)
    }

    /// Read a big-endian u32 at `offset`
    pub fn read_u32(&self, offset: usize) -> Result<u32, PacketError> {
        let end = offset + 4;
        self.require(end)?;
        let mut buf = &self.buffer[offset..end];
        Ok(buf.get_u32())
    }

    /// Borrow the last `n` bytes
    pub fn trailing(&self, n: usize) -> Result<&[u8], PacketError> {
        self.require(n)?;
        Ok(&self.buffer[self.buffer.len() - n..])
    }

    /// Append bytes to the end of the packet
    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Remove `n` bytes from the end of the packet
    pub fn shrink(&mut self, n: usize) -> Result<(), PacketError> {
        self.require(n)?;
        self.buffer.truncate(self.buffer.len() - n);
        Ok(())
    }

    fn require(&self, len: usize) -> Result<(), PacketError> {
        if self.buffer.len() < len {
            return Err(PacketError::InsufficientData {
                expected: len,
                actual: self.buffer.len(),
            });
        }
        Ok(())
    }
}

impl From<BytesMut> for RawPacket {
    fn from(buffer: BytesMut) -> Self {
        RawPacket { buffer }
    }
}

impl From<&[u8]> for RawPacket {
    fn from(bytes: &[u8]) -> Self {
        RawPacket::from_slice(bytes)
    }
}

impl AsRef<[u8]> for RawPacket {
    fn as_ref(&self) -> &[u8] {
        &self.buffer
    }
}
