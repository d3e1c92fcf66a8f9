//! Common interface of the SRTP and SRTCP contexts
//!
//! Lets the per-SSRC dispatcher treat both packet families the same way:
//! find the SSRC a packet belongs to, fork a keyed context for a new SSRC
//! from a template, and run the send or receive transform.

use crate::error::SrtpError;
use crate::packet::{PacketError, RawPacket};
use crate::srtcp_context::SrtcpCryptoContext;
use crate::srtp_context::SrtpCryptoContext;
use crate::stats::StreamStats;

pub trait CryptoContext: Send + Sized {
    /// SSRC identifying the stream a packet belongs to
    fn packet_ssrc(packet: &RawPacket) -> Result<u32, PacketError>;

    /// Build a keyed context for `ssrc` sharing this context's policy and
    /// master key material
    fn derive_keyed(&self, ssrc: u32) -> Result<Self, SrtpError>;

    fn ssrc(&self) -> u32;

    fn transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError>;

    fn reverse_transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError>;

    fn stats(&self) -> &StreamStats;
}

impl CryptoContext for SrtpCryptoContext {
    fn packet_ssrc(packet: &RawPacket) -> Result<u32, PacketError> {
        packet.rtp_ssrc()
    }

    fn derive_keyed(&self, ssrc: u32) -> Result<Self, SrtpError> {
        let mut context = self.derive_context(ssrc, 0, self.kdr())?;
        context.derive_srtp_keys(0)?;
        Ok(context)
    }

    fn ssrc(&self) -> u32 {
        SrtpCryptoContext::ssrc(self)
    }

    fn transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        SrtpCryptoContext::transform_packet(self, packet)
    }

    fn reverse_transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        SrtpCryptoContext::reverse_transform_packet(self, packet)
    }

    fn stats(&self) -> &StreamStats {
        SrtpCryptoContext::stats(self)
    }
}

impl CryptoContext for SrtcpCryptoContext {
    fn packet_ssrc(packet: &RawPacket) -> Result<u32, PacketError> {
        packet.rtcp_ssrc()
    }

    fn derive_keyed(&self, ssrc: u32) -> Result<Self, SrtpError> {
        let mut context = self.derive_context(ssrc)?;
        context.derive_srtcp_keys()?;
        Ok(context)
    }

    fn ssrc(&self) -> u32 {
        SrtcpCryptoContext::ssrc(self)
    }

    fn transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        SrtcpCryptoContext::transform_packet(self, packet)
    }

    fn reverse_transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        SrtcpCryptoContext::reverse_transform_packet(self, packet)
    }

    fn stats(&self) -> &StreamStats {
        SrtcpCryptoContext::stats(self)
    }
}
