//! SRTCP Crypto Context
//!
//! Protects RTCP compound packets (RFC 3711 §3.4). The first eight bytes
//! (common header and sender SSRC) stay in the clear. The rest is encrypted,
//! and the packet is extended with a 32-bit word holding the E flag and the
//! 31-bit SRTCP index, then the optional MKI and the authentication tag:
//!
//! ```text
//! | header + SSRC | encrypted part | E | SRTCP index | MKI | tag |
//!  \______________ authenticated _________________/
//! ```
//!
//! The index is explicit on the wire, so no rollover estimation is needed.
//! Session keys are derived once with the SRTCP labels.

use crate::error::SrtpError;
use crate::index::MAX_SRTCP_INDEX;
use crate::packet::{PacketError, RawPacket, RTCP_HEADER_SIZE};
use crate::replay::ReplayWindow;
use crate::session::ActiveKeys;
use crate::stats::StreamStats;
use bytes::Buf;
use srtp_crypto::{
    constant_time_eq, Block, CryptoPolicy, EncryptionType, KeyDerivation, MasterKeyMaterial,
    BLOCK_SIZE,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Size of the E flag + SRTCP index word
pub const SRTCP_INDEX_SIZE: usize = 4;

const E_FLAG: u32 = 0x8000_0000;

/// SRTCP cryptographic context for one SSRC
pub struct SrtcpCryptoContext {
    ssrc: u32,
    policy: Arc<CryptoPolicy>,
    master: MasterKeyMaterial,
    kdf: KeyDerivation,
    keys: Option<ActiveKeys>,
    /// Index for the next outgoing packet
    sent_index: u32,
    /// Highest accepted index
    received_index: Option<u32>,
    window: ReplayWindow,
    stats: StreamStats,
    exhausted: bool,
}

impl SrtcpCryptoContext {
    /// Create an unkeyed context
    pub fn new(
        ssrc: u32,
        policy: Arc<CryptoPolicy>,
        master: MasterKeyMaterial,
    ) -> Result<Self, SrtpError> {
        let kdf = KeyDerivation::new(&master, &policy).map_err(|err| {
            warn!(ssrc, %err, "rejecting SRTCP master key material");
            err
        })?;

        debug!(ssrc, "created SRTCP crypto context");

        Ok(SrtcpCryptoContext {
            ssrc,
            policy,
            master,
            kdf,
            keys: None,
            sent_index: 0,
            received_index: None,
            window: ReplayWindow::new(),
            stats: StreamStats::default(),
            exhausted: false,
        })
    }

    /// Create an unkeyed context for another stream with the same policy
    /// and master key
    pub fn derive_context(&self, ssrc: u32) -> Result<Self, SrtpError> {
        SrtcpCryptoContext::new(ssrc, Arc::clone(&self.policy), self.master.clone())
    }

    /// Derive the SRTCP session keys
    pub fn derive_srtcp_keys(&mut self) -> Result<(), SrtpError> {
        let keys = self.kdf.derive_srtcp(&self.policy, 0)?;
        self.keys = Some(ActiveKeys::new(&self.policy, keys, 0)?);
        Ok(())
    }

    #[inline]
    pub fn is_keyed(&self) -> bool {
        self.keys.is_some()
    }

    #[inline]
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    /// Index the next protected packet will carry
    #[inline]
    pub fn sent_index(&self) -> u32 {
        self.sent_index
    }

    /// Highest accepted index, if any
    #[inline]
    pub fn received_index(&self) -> Option<u32> {
        self.received_index
    }

    pub fn policy(&self) -> &CryptoPolicy {
        &self.policy
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Protect an outgoing RTCP packet in place
    pub fn transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        match self.protect(packet) {
            Ok(()) => {
                self.stats.record_protected(packet.len());
                Ok(())
            }
            Err(err) => {
                trace!(ssrc = self.ssrc, %err, "failed to protect RTCP packet");
                self.stats.record_drop(err.drop_reason());
                Err(err)
            }
        }
    }

    /// Verify, replay-check and decrypt an incoming SRTCP packet in place
    pub fn reverse_transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        match self.unprotect(packet) {
            Ok(()) => {
                self.stats.record_unprotected(packet.len());
                Ok(())
            }
            Err(err) => {
                trace!(ssrc = self.ssrc, %err, "dropping SRTCP packet");
                self.stats.record_drop(err.drop_reason());
                Err(err)
            }
        }
    }

    fn protect(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        if self.exhausted {
            return Err(SrtpError::KeyExhausted);
        }

        let header = packet.rtcp_header()?;
        let keys = self.keys.as_ref().ok_or(SrtpError::NotKeyed)?;
        let index = self.sent_index;

        let word = if self.policy.encrypts() {
            let word = E_FLAG | index;
            let iv = self.packet_iv(keys, packet.as_bytes(), header.ssrc, word);
            keys.cipher
                .process(&mut packet.as_bytes_mut()[RTCP_HEADER_SIZE..], &iv)
                .map_err(PacketError::from)?;
            word
        } else {
            index
        };
        packet.append(&word.to_be_bytes());

        let tag = keys
            .auth
            .as_ref()
            .map(|auth| auth.authenticate(&[packet.as_bytes()]));
        if let Some(mki) = self.master.mki() {
            packet.append(mki);
        }
        if let Some(tag) = tag {
            packet.append(&tag[..self.policy.auth_tag_len()]);
        }

        if index == MAX_SRTCP_INDEX {
            warn!(ssrc = self.ssrc, "SRTCP index space exhausted");
            self.exhausted = true;
        } else {
            self.sent_index = index + 1;
        }
        Ok(())
    }

    fn unprotect(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        let header = packet.rtcp_header()?;

        let mki_len = self.master.mki().map_or(0, <[u8]>::len);
        let tag_len = self.policy.auth_tag_len();
        let min_len = RTCP_HEADER_SIZE + SRTCP_INDEX_SIZE + mki_len + tag_len;
        if packet.len() < min_len {
            return Err(PacketError::InsufficientData {
                expected: min_len,
                actual: packet.len(),
            }
            .into());
        }

        let keys = self.keys.as_ref().ok_or(SrtpError::NotKeyed)?;
        let bytes = packet.as_bytes();
        let authenticated_len = bytes.len() - mki_len - tag_len;
        let body_len = authenticated_len - SRTCP_INDEX_SIZE;

        let word = (&bytes[body_len..authenticated_len]).get_u32();
        let index = word & !E_FLAG;
        let delta = index as i64 - self.received_index.unwrap_or(index) as i64;

        self.window
            .check(delta)
            .map_err(|err| SrtpError::from_replay(err, index as u64))?;

        if let Some(mki) = self.master.mki() {
            if !constant_time_eq(&bytes[authenticated_len..authenticated_len + mki_len], mki) {
                return Err(SrtpError::MkiMismatch);
            }
        }

        if let Some(auth) = &keys.auth {
            let received = &bytes[authenticated_len + mki_len..];
            if !auth.verify(&[&bytes[..authenticated_len]], received) {
                return Err(SrtpError::AuthenticationFailure);
            }
        }

        packet.shrink(SRTCP_INDEX_SIZE + mki_len + tag_len)?;
        if word & E_FLAG != 0 {
            let iv = self.packet_iv(keys, packet.as_bytes(), header.ssrc, word);
            keys.cipher
                .process(&mut packet.as_bytes_mut()[RTCP_HEADER_SIZE..], &iv)
                .map_err(PacketError::from)?;
        }

        self.window.update(delta);
        if delta > 0 || self.received_index.is_none() {
            self.received_index = Some(index);
        }
        Ok(())
    }

    fn packet_iv(&self, keys: &ActiveKeys, packet: &[u8], ssrc: u32, word: u32) -> Block {
        match self.policy.enc_type() {
            EncryptionType::AesCm => keys.counter_iv(ssrc, (word & !E_FLAG) as u64),
            EncryptionType::AesF8 => f8_iv(packet, word),
            EncryptionType::Null => [0u8; BLOCK_SIZE],
        }
    }
}

/// f8 IV: `0x00000000 || E || SRTCP index || V P RC PT length SSRC`
fn f8_iv(packet: &[u8], word: u32) -> Block {
    let mut iv = [0u8; BLOCK_SIZE];
    iv[4..8].copy_from_slice(&word.to_be_bytes());
    iv[8..].copy_from_slice(&packet[..RTCP_HEADER_SIZE]);
    iv
}

impl std::fmt::Debug for SrtcpCryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SrtcpCryptoContext")
            .field("ssrc", &self.ssrc)
            .field("policy", &self.policy)
            .field("sent_index", &self.sent_index)
            .field("received_index", &self.received_index)
            .field("keyed", &self.is_keyed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::RtcpHeader;

    const SSRC: u32 = 0xCAFEBABE;

    fn pair(policy: CryptoPolicy) -> (SrtcpCryptoContext, SrtcpCryptoContext) {
        let policy = Arc::new(policy);
        let master = MasterKeyMaterial::new(&[0x11u8; 16], &[0x22u8; 14], 0);
        let mut tx = SrtcpCryptoContext::new(SSRC, Arc::clone(&policy), master.clone()).unwrap();
        let mut rx = SrtcpCryptoContext::new(SSRC, policy, master).unwrap();
        tx.derive_srtcp_keys().unwrap();
        rx.derive_srtcp_keys().unwrap();
        (tx, rx)
    }

    fn sender_report() -> RawPacket {
        let header = RtcpHeader {
            padding: false,
            count: 0,
            packet_type: 200,
            length: 6,
            ssrc: SSRC,
        };
        let body: Vec<u8> = (0..20u8).collect();
        RawPacket::rtcp(&header, &body)
    }

    #[test]
    fn test_round_trip() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        let original = sender_report();

        let mut packet = original.clone();
        tx.transform_packet(&mut packet).unwrap();
        assert_eq!(packet.len(), original.len() + SRTCP_INDEX_SIZE + 10);
        assert_eq!(
            &packet.as_bytes()[..RTCP_HEADER_SIZE],
            &original.as_bytes()[..RTCP_HEADER_SIZE]
        );
        assert_ne!(
            &packet.as_bytes()[RTCP_HEADER_SIZE..original.len()],
            &original.as_bytes()[RTCP_HEADER_SIZE..]
        );

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, original);
        assert_eq!(rx.received_index(), Some(0));
        assert_eq!(tx.sent_index(), 1);
    }

    #[test]
    fn test_index_word_carries_e_flag() {
        let (mut tx, _) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        let mut packet = sender_report();
        tx.transform_packet(&mut packet).unwrap();

        let len = packet.len();
        assert_eq!(&packet.as_bytes()[len - 14..len - 10], &[0x80, 0, 0, 0]);
    }

    #[test]
    fn test_unencrypted_policy_clears_e_flag() {
        let (mut tx, mut rx) = pair(CryptoPolicy::null_hmac_sha1_80());
        let original = sender_report();
        let mut packet = original.clone();
        tx.transform_packet(&mut packet).unwrap();

        let len = packet.len();
        assert_eq!(&packet.as_bytes()[len - 14..len - 10], &[0, 0, 0, 0]);
        assert_eq!(&packet.as_bytes()[..original.len()], original.as_bytes());

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, original);
    }

    #[test]
    fn test_replay_rejected() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        let mut packet = sender_report();
        tx.transform_packet(&mut packet).unwrap();

        let mut first = packet.clone();
        rx.reverse_transform_packet(&mut first).unwrap();
        assert_eq!(
            rx.reverse_transform_packet(&mut packet),
            Err(SrtpError::ReplayDetected { index: 0 })
        );
    }

    #[test]
    fn test_tampered_index_rejected() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        let mut packet = sender_report();
        tx.transform_packet(&mut packet).unwrap();

        let len = packet.len();
        packet.as_bytes_mut()[len - 11] ^= 0x01;
        assert_eq!(
            rx.reverse_transform_packet(&mut packet),
            Err(SrtpError::AuthenticationFailure)
        );
        assert_eq!(rx.received_index(), None);
    }

    #[test]
    fn test_f8_round_trip() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_f8_128_hmac_sha1_80());
        let original = sender_report();

        for _ in 0..3 {
            let mut packet = original.clone();
            tx.transform_packet(&mut packet).unwrap();
            rx.reverse_transform_packet(&mut packet).unwrap();
            assert_eq!(packet, original);
        }
        assert_eq!(rx.received_index(), Some(2));
    }

    #[test]
    fn test_index_exhaustion() {
        let (mut tx, _) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        tx.sent_index = MAX_SRTCP_INDEX;

        tx.transform_packet(&mut sender_report()).unwrap();
        assert_eq!(
            tx.transform_packet(&mut sender_report()),
            Err(SrtpError::KeyExhausted)
        );
    }

    #[test]
    fn test_mki_between_index_and_tag() {
        let policy = Arc::new(CryptoPolicy::aes_cm_128_hmac_sha1_32());
        let master = MasterKeyMaterial::new(&[0x11u8; 16], &[0x22u8; 14], 0).with_mki(&[7, 7, 7]);
        let mut tx = SrtcpCryptoContext::new(SSRC, Arc::clone(&policy), master.clone()).unwrap();
        let mut rx = SrtcpCryptoContext::new(SSRC, policy, master).unwrap();
        tx.derive_srtcp_keys().unwrap();
        rx.derive_srtcp_keys().unwrap();

        let original = sender_report();
        let mut packet = original.clone();
        tx.transform_packet(&mut packet).unwrap();
        let len = packet.len();
        assert_eq!(len, original.len() + SRTCP_INDEX_SIZE + 3 + 4);
        assert_eq!(&packet.as_bytes()[len - 7..len - 4], &[7, 7, 7]);

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, original);
    }
}
