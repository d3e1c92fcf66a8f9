//! SRTP Crypto Context
//!
//! Per-SSRC state for protecting and unprotecting RTP packets (RFC 3711 §3.3):
//! session keys, rollover counter, highest accepted sequence number and the
//! replay window.
//!
//! A context is not internally synchronized. One context serves one
//! direction of one stream and is mutated serially by its owner.
//!
//! Receive processing runs estimate → replay check → authenticate → decrypt
//! → commit. Nothing is committed until the packet has been accepted, so a
//! forged or replayed packet leaves the context exactly as it was,
//! including session keys re-derived for a new key derivation epoch.

use crate::error::SrtpError;
use crate::index::{estimate_index, SrtpIndex};
use crate::packet::{PacketError, RawPacket, RTP_HEADER_SIZE};
use crate::replay::ReplayWindow;
use crate::session::ActiveKeys;
use crate::stats::StreamStats;
use srtp_crypto::{
    constant_time_eq, Block, CryptoPolicy, EncryptionType, KeyDerivation, MasterKeyMaterial,
    BLOCK_SIZE,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// SRTP cryptographic context for one SSRC
pub struct SrtpCryptoContext {
    ssrc: u32,
    policy: Arc<CryptoPolicy>,
    master: MasterKeyMaterial,
    kdf: KeyDerivation,
    keys: Option<ActiveKeys>,
    /// Rollover counter of the highest index sent or accepted
    roc: u32,
    /// Highest accepted sequence number (receive side)
    seq_num: u16,
    seq_num_set: bool,
    window: ReplayWindow,
    stats: StreamStats,
    /// Set once the sender has used the last index of the 48-bit space
    exhausted: bool,
}

impl SrtpCryptoContext {
    /// Create an unkeyed context
    ///
    /// Fails if the master key or salt does not match the policy.
    pub fn new(
        ssrc: u32,
        roc: u32,
        policy: Arc<CryptoPolicy>,
        master: MasterKeyMaterial,
    ) -> Result<Self, SrtpError> {
        let kdf = KeyDerivation::new(&master, &policy).map_err(|err| {
            warn!(ssrc, %err, "rejecting SRTP master key material");
            err
        })?;

        debug!(ssrc, roc, kdr = kdf.kdr(), "created SRTP crypto context");

        Ok(SrtpCryptoContext {
            ssrc,
            policy,
            master,
            kdf,
            keys: None,
            roc,
            seq_num: 0,
            seq_num_set: false,
            window: ReplayWindow::new(),
            stats: StreamStats::default(),
            exhausted: false,
        })
    }

    /// Create an unkeyed context for another stream sharing this context's
    /// policy and master key
    pub fn derive_context(&self, ssrc: u32, roc: u32, kdr: u64) -> Result<Self, SrtpError> {
        SrtpCryptoContext::new(
            ssrc,
            roc,
            Arc::clone(&self.policy),
            self.master.clone().with_kdr(kdr),
        )
    }

    /// Derive the session keys for the packet index `index`
    pub fn derive_srtp_keys(&mut self, index: u64) -> Result<(), SrtpError> {
        self.keys = Some(self.derive_active(index)?);
        Ok(())
    }

    fn derive_active(&self, index: u64) -> Result<ActiveKeys, SrtpError> {
        let keys = self.kdf.derive_srtp(&self.policy, index)?;
        Ok(ActiveKeys::new(
            &self.policy,
            keys,
            self.kdf.rate_quotient(index),
        )?)
    }

    #[inline]
    pub fn is_keyed(&self) -> bool {
        self.keys.is_some()
    }

    #[inline]
    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    #[inline]
    pub fn roc(&self) -> u32 {
        self.roc
    }

    /// Override the rollover counter, e.g. for a late-joining receiver
    pub fn set_roc(&mut self, roc: u32) {
        self.roc = roc;
    }

    /// Key derivation rate of this context
    #[inline]
    pub fn kdr(&self) -> u64 {
        self.kdf.kdr()
    }

    /// Highest accepted sequence number, if any packet has been accepted
    pub fn last_seq(&self) -> Option<u16> {
        self.seq_num_set.then_some(self.seq_num)
    }

    pub fn policy(&self) -> &CryptoPolicy {
        &self.policy
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Protect an outgoing RTP packet in place
    ///
    /// Encrypts the payload, appends the MKI (if any) and the truncated
    /// authentication tag, and advances the rollover counter after sequence
    /// number 0xFFFF.
    pub fn transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        match self.protect(packet) {
            Ok(()) => {
                self.stats.record_protected(packet.len());
                Ok(())
            }
            Err(err) => {
                trace!(ssrc = self.ssrc, %err, "failed to protect RTP packet");
                self.stats.record_drop(err.drop_reason());
                Err(err)
            }
        }
    }

    /// Verify, replay-check and decrypt an incoming SRTP packet in place
    ///
    /// On success the packet holds the plain RTP packet. On error the packet
    /// must be dropped; the context state is unchanged apart from its drop
    /// counters.
    pub fn reverse_transform_packet(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        match self.unprotect(packet) {
            Ok(()) => {
                self.stats.record_unprotected(packet.len());
                Ok(())
            }
            Err(err) => {
                trace!(ssrc = self.ssrc, %err, "dropping SRTP packet");
                self.stats.record_drop(err.drop_reason());
                Err(err)
            }
        }
    }

    fn protect(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        if self.exhausted {
            return Err(SrtpError::KeyExhausted);
        }

        let header = packet.rtp_header()?;
        let seq = header.sequence_number;
        let index = SrtpIndex::new(self.roc, seq);

        // re-key at key derivation rate boundaries
        let epoch = self.kdf.rate_quotient(index.as_raw());
        let current = self.keys.as_ref().ok_or(SrtpError::NotKeyed)?.epoch;
        if current != epoch {
            self.keys = Some(self.derive_active(index.as_raw())?);
        }
        let keys = self.keys.as_ref().ok_or(SrtpError::NotKeyed)?;

        let iv = self.packet_iv(keys, packet.as_bytes(), header.ssrc, index);
        keys.cipher
            .process(&mut packet.as_bytes_mut()[header.len()..], &iv)
            .map_err(PacketError::from)?;

        let tag = keys.auth.as_ref().map(|auth| {
            let roc = self.roc.to_be_bytes();
            auth.authenticate(&[packet.as_bytes(), &roc[..]])
        });
        if let Some(mki) = self.master.mki() {
            packet.append(mki);
        }
        if let Some(tag) = tag {
            packet.append(&tag[..self.policy.auth_tag_len()]);
        }

        if seq == u16::MAX {
            match self.roc.checked_add(1) {
                Some(roc) => {
                    debug!(ssrc = self.ssrc, roc, "SRTP sender rollover");
                    self.roc = roc;
                }
                None => {
                    warn!(ssrc = self.ssrc, "SRTP index space exhausted");
                    self.exhausted = true;
                }
            }
        }
        Ok(())
    }

    fn unprotect(&mut self, packet: &mut RawPacket) -> Result<(), SrtpError> {
        let header = packet.rtp_header()?;
        let seq = header.sequence_number;

        let mki_len = self.master.mki().map_or(0, <[u8]>::len);
        let tag_len = self.policy.auth_tag_len();
        let min_len = header.len() + mki_len + tag_len;
        if packet.len() < min_len {
            return Err(PacketError::InsufficientData {
                expected: min_len,
                actual: packet.len(),
            }
            .into());
        }

        // the first packet seeds the estimate without committing anything
        let last_seq = if self.seq_num_set { self.seq_num } else { seq };
        let index = match estimate_index(self.roc, last_seq, seq) {
            Some(index) => index,
            // before the first roll of the stream
            None if self.roc == 0 => return Err(SrtpError::ReplayTooOld { index: seq as u64 }),
            None => return Err(SrtpError::KeyExhausted),
        };
        let guessed_roc = index.roc();
        let delta = SrtpIndex::new(self.roc, last_seq).distance_to(index);

        self.window
            .check(delta)
            .map_err(|err| SrtpError::from_replay(err, index.as_raw()))?;

        // candidate keys for a new epoch are only installed on accept
        let epoch = self.kdf.rate_quotient(index.as_raw());
        let current = self.keys.as_ref().ok_or(SrtpError::NotKeyed)?.epoch;
        let candidate = if current != epoch {
            Some(self.derive_active(index.as_raw())?)
        } else {
            None
        };
        let keys = match &candidate {
            Some(keys) => keys,
            None => self.keys.as_ref().ok_or(SrtpError::NotKeyed)?,
        };

        let bytes = packet.as_bytes();
        let body_len = bytes.len() - mki_len - tag_len;

        if let Some(mki) = self.master.mki() {
            if !constant_time_eq(&bytes[body_len..body_len + mki_len], mki) {
                return Err(SrtpError::MkiMismatch);
            }
        }

        if let Some(auth) = &keys.auth {
            let roc = guessed_roc.to_be_bytes();
            let received = &bytes[body_len + mki_len..];
            if !auth.verify(&[&bytes[..body_len], &roc[..]], received) {
                return Err(SrtpError::AuthenticationFailure);
            }
        }

        packet.shrink(mki_len + tag_len)?;
        let iv = self.packet_iv(keys, packet.as_bytes(), header.ssrc, index);
        keys.cipher
            .process(&mut packet.as_bytes_mut()[header.len()..], &iv)
            .map_err(PacketError::from)?;

        self.commit(index, delta, candidate);
        Ok(())
    }

    fn commit(&mut self, index: SrtpIndex, delta: i64, candidate: Option<ActiveKeys>) {
        // the first accepted packet defines the highest index
        let advances = delta > 0 || !self.seq_num_set;
        self.seq_num_set = true;

        self.window.update(delta);
        if !advances {
            // late packets of an older epoch keep the current keys
            return;
        }

        if index.roc() != self.roc {
            debug!(ssrc = self.ssrc, roc = index.roc(), "SRTP receiver rollover");
        }
        self.roc = index.roc();
        self.seq_num = index.seq();

        if let Some(keys) = candidate {
            debug!(ssrc = self.ssrc, epoch = keys.epoch, "installing re-derived SRTP keys");
            self.keys = Some(keys);
        }
    }

    /// Per-packet IV for the policy's cipher
    fn packet_iv(&self, keys: &ActiveKeys, packet: &[u8], ssrc: u32, index: SrtpIndex) -> Block {
        match self.policy.enc_type() {
            EncryptionType::AesCm => keys.counter_iv(ssrc, index.as_raw()),
            EncryptionType::AesF8 => f8_iv(packet, index.roc()),
            EncryptionType::Null => [0u8; BLOCK_SIZE],
        }
    }
}

/// f8 IV: `0x00 || M || PT || SEQ || TS || SSRC || ROC` (RFC 3711 §4.1.2.2)
fn f8_iv(packet: &[u8], roc: u32) -> Block {
    let mut iv = [0u8; BLOCK_SIZE];
    iv[1..RTP_HEADER_SIZE].copy_from_slice(&packet[1..RTP_HEADER_SIZE]);
    iv[RTP_HEADER_SIZE..].copy_from_slice(&roc.to_be_bytes());
    iv
}

impl std::fmt::Debug for SrtpCryptoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SrtpCryptoContext")
            .field("ssrc", &self.ssrc)
            .field("policy", &self.policy)
            .field("roc", &self.roc)
            .field("last_seq", &self.last_seq())
            .field("keyed", &self.is_keyed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::RtpHeader;
    use srtp_crypto::MAX_KEYSTREAM_LEN;

    const SSRC: u32 = 0x12345678;

    fn master() -> MasterKeyMaterial {
        MasterKeyMaterial::new(&[0x0Au8; 16], &[0x0Bu8; 14], 0)
    }

    fn pair(policy: CryptoPolicy, master: MasterKeyMaterial) -> (SrtpCryptoContext, SrtpCryptoContext) {
        let policy = Arc::new(policy);
        let mut tx = SrtpCryptoContext::new(SSRC, 0, Arc::clone(&policy), master.clone()).unwrap();
        let mut rx = SrtpCryptoContext::new(SSRC, 0, policy, master).unwrap();
        tx.derive_srtp_keys(0).unwrap();
        rx.derive_srtp_keys(0).unwrap();
        (tx, rx)
    }

    fn rtp(seq: u16, payload: &[u8]) -> RawPacket {
        RawPacket::rtp(&RtpHeader::new(96, seq, 1000, SSRC), payload).unwrap()
    }

    fn protect(tx: &mut SrtpCryptoContext, seq: u16, payload: &[u8]) -> RawPacket {
        let mut packet = rtp(seq, payload);
        tx.transform_packet(&mut packet).unwrap();
        packet
    }

    #[test]
    fn test_round_trip() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let payload = b"hello srtp payload";

        let mut packet = protect(&mut tx, 1, payload);
        assert_eq!(packet.len(), RTP_HEADER_SIZE + payload.len() + 10);
        assert_ne!(&packet.as_bytes()[RTP_HEADER_SIZE..RTP_HEADER_SIZE + payload.len()], payload);

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, rtp(1, payload));
        assert_eq!(rx.last_seq(), Some(1));
    }

    #[test]
    fn test_unkeyed_context() {
        let policy = Arc::new(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        let mut ctx = SrtpCryptoContext::new(SSRC, 0, policy, master()).unwrap();
        let mut packet = rtp(1, b"abc");

        assert_eq!(ctx.transform_packet(&mut packet), Err(SrtpError::NotKeyed));
        assert_eq!(ctx.stats().key_state_errors, 1);
    }

    #[test]
    fn test_bad_master_rejected() {
        let policy = Arc::new(CryptoPolicy::aes_cm_128_hmac_sha1_80());
        let short = MasterKeyMaterial::new(&[0u8; 10], &[0u8; 14], 0);
        assert!(matches!(
            SrtpCryptoContext::new(SSRC, 0, policy, short),
            Err(SrtpError::Configuration(_))
        ));
    }

    #[test]
    fn test_replay_rejected() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let packet = protect(&mut tx, 7, b"payload");

        let mut first = packet.clone();
        rx.reverse_transform_packet(&mut first).unwrap();

        let mut again = packet;
        assert_eq!(
            rx.reverse_transform_packet(&mut again),
            Err(SrtpError::ReplayDetected { index: 7 })
        );
        assert_eq!(rx.stats().replay_duplicates, 1);

        let mut next = protect(&mut tx, 8, b"payload");
        assert!(rx.reverse_transform_packet(&mut next).is_ok());
    }

    #[test]
    fn test_out_of_order_within_window() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let early = protect(&mut tx, 10, b"a");
        let late = protect(&mut tx, 20, b"b");

        let mut p = late;
        rx.reverse_transform_packet(&mut p).unwrap();
        let mut p = early;
        rx.reverse_transform_packet(&mut p).unwrap();
        assert_eq!(p, rtp(10, b"a"));
        assert_eq!(rx.last_seq(), Some(20));
    }

    #[test]
    fn test_too_old_rejected() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let old = protect(&mut tx, 100, b"old");
        let mut new = protect(&mut tx, 200, b"new");

        rx.reverse_transform_packet(&mut new).unwrap();
        let mut p = old;
        assert_eq!(
            rx.reverse_transform_packet(&mut p),
            Err(SrtpError::ReplayTooOld { index: 100 })
        );
    }

    #[test]
    fn test_tampered_tag_leaves_state() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let mut packet = protect(&mut tx, 5, b"payload");
        let last = packet.len() - 1;
        packet.as_bytes_mut()[last] ^= 0x01;

        assert_eq!(
            rx.reverse_transform_packet(&mut packet),
            Err(SrtpError::AuthenticationFailure)
        );
        assert_eq!(rx.last_seq(), None);
        assert_eq!(rx.stats().auth_failures, 1);
    }

    #[test]
    fn test_sender_rollover() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());

        let mut a = protect(&mut tx, 0xFFFF, b"before");
        assert_eq!(tx.roc(), 1);
        let mut b = protect(&mut tx, 0x0000, b"after");

        rx.reverse_transform_packet(&mut a).unwrap();
        rx.reverse_transform_packet(&mut b).unwrap();
        assert_eq!(b, rtp(0, b"after"));
        assert_eq!(rx.roc(), 1);
    }

    #[test]
    fn test_late_packet_from_previous_roll() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());

        let late = protect(&mut tx, 0xFFFE, b"late");
        let mut wrap = protect(&mut tx, 0xFFFF, b"wrap");
        let mut next = protect(&mut tx, 0x0001, b"next");

        rx.reverse_transform_packet(&mut wrap).unwrap();
        rx.reverse_transform_packet(&mut next).unwrap();
        assert_eq!(rx.roc(), 1);

        let mut p = late;
        rx.reverse_transform_packet(&mut p).unwrap();
        assert_eq!(p, rtp(0xFFFE, b"late"));
        assert_eq!(rx.roc(), 1);
        assert_eq!(rx.last_seq(), Some(1));
    }

    #[test]
    fn test_mki_appended_and_checked() {
        let with_mki = master().with_mki(&[0xA1, 0xB2]);
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), with_mki);

        let packet = protect(&mut tx, 3, b"mki");
        let len = packet.len();
        assert_eq!(&packet.as_bytes()[len - 12..len - 10], &[0xA1, 0xB2]);

        let mut wrong = packet.clone();
        wrong.as_bytes_mut()[len - 12] = 0x00;
        assert_eq!(
            rx.reverse_transform_packet(&mut wrong),
            Err(SrtpError::MkiMismatch)
        );

        let mut p = packet;
        rx.reverse_transform_packet(&mut p).unwrap();
        assert_eq!(p, rtp(3, b"mki"));
    }

    #[test]
    fn test_f8_round_trip() {
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_f8_128_hmac_sha1_80(), master());
        let payload = [0x5Au8; 40];

        let mut packet = protect(&mut tx, 42, &payload);
        assert_ne!(&packet.as_bytes()[RTP_HEADER_SIZE..RTP_HEADER_SIZE + 40], &payload[..]);

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, rtp(42, &payload));
    }

    #[test]
    fn test_aes_256_round_trip() {
        let master = MasterKeyMaterial::new(&[0x0Cu8; 32], &[0x0Du8; 14], 0);
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_256_hmac_sha1_80(), master);
        let payload = [0x3Cu8; 50];

        let mut packet = protect(&mut tx, 77, &payload);
        assert_eq!(packet.len(), RTP_HEADER_SIZE + payload.len() + 10);
        assert_ne!(&packet.as_bytes()[RTP_HEADER_SIZE..RTP_HEADER_SIZE + 50], &payload[..]);

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, rtp(77, &payload));
    }

    #[test]
    fn test_null_cipher_authenticates_only() {
        let (mut tx, mut rx) = pair(CryptoPolicy::null_hmac_sha1_80(), master());

        let mut packet = protect(&mut tx, 9, b"clear");
        assert_eq!(&packet.as_bytes()[RTP_HEADER_SIZE..RTP_HEADER_SIZE + 5], b"clear");

        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, rtp(9, b"clear"));
    }

    #[test]
    fn test_kdr_rekey_only_on_accept() {
        let rekeying = master().with_kdr(4);
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), rekeying);

        let mut first = protect(&mut tx, 1, b"epoch0");
        rx.reverse_transform_packet(&mut first).unwrap();

        // forged packet in the next epoch must not install its keys
        let mut forged = rtp(5, b"forged-payload");
        forged.append(&[0u8; 10]);
        assert_eq!(
            rx.reverse_transform_packet(&mut forged),
            Err(SrtpError::AuthenticationFailure)
        );
        assert_eq!(rx.keys.as_ref().map(|k| k.epoch), Some(0));

        let mut genuine = protect(&mut tx, 5, b"epoch1");
        rx.reverse_transform_packet(&mut genuine).unwrap();
        assert_eq!(genuine, rtp(5, b"epoch1"));
        assert_eq!(rx.keys.as_ref().map(|k| k.epoch), Some(1));
    }

    #[test]
    fn test_late_packet_keeps_current_epoch_keys() {
        let rekeying = master().with_kdr(4);
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), rekeying);

        let mut late = protect(&mut tx, 3, b"epoch0");
        let mut ahead = protect(&mut tx, 5, b"epoch1");

        rx.reverse_transform_packet(&mut ahead).unwrap();
        assert_eq!(rx.keys.as_ref().map(|k| k.epoch), Some(1));

        rx.reverse_transform_packet(&mut late).unwrap();
        assert_eq!(late, rtp(3, b"epoch0"));
        assert_eq!(rx.keys.as_ref().map(|k| k.epoch), Some(1));
        assert_eq!(rx.last_seq(), Some(5));
    }

    #[test]
    fn test_first_packet_installs_its_epoch() {
        let rekeying = master().with_kdr(4);
        let (mut tx, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), rekeying);

        let mut packet = protect(&mut tx, 9, b"epoch2");
        rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(rx.keys.as_ref().map(|k| k.epoch), Some(2));
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let (mut tx, _) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let payload = vec![0x11u8; MAX_KEYSTREAM_LEN + 1];
        let original = rtp(1, &payload);

        let mut packet = original.clone();
        assert_eq!(
            tx.transform_packet(&mut packet),
            Err(SrtpError::Malformed(PacketError::PayloadTooLarge(MAX_KEYSTREAM_LEN + 1)))
        );
        assert_eq!(packet, original);
        assert_eq!(tx.stats().malformed, 1);

        let mut largest = rtp(2, &payload[..MAX_KEYSTREAM_LEN]);
        assert!(tx.transform_packet(&mut largest).is_ok());
    }

    #[test]
    fn test_short_packet_malformed() {
        let (_, mut rx) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let mut packet = rtp(1, b"abc");

        assert!(matches!(
            rx.reverse_transform_packet(&mut packet),
            Err(SrtpError::Malformed(PacketError::InsufficientData { .. }))
        ));
        assert_eq!(rx.stats().malformed, 1);
    }

    #[test]
    fn test_index_exhaustion() {
        let (mut tx, _) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        tx.set_roc(u32::MAX);

        protect(&mut tx, 0xFFFF, b"last");
        let mut packet = rtp(0, b"over");
        assert_eq!(tx.transform_packet(&mut packet), Err(SrtpError::KeyExhausted));
    }

    #[test]
    fn test_derive_context_shares_master() {
        let (tx, _) = pair(CryptoPolicy::aes_cm_128_hmac_sha1_80(), master());
        let mut other_tx = tx.derive_context(0xCAFE, 0, 0).unwrap();
        let mut other_rx = tx.derive_context(0xCAFE, 0, 0).unwrap();
        assert!(!other_tx.is_keyed());
        other_tx.derive_srtp_keys(0).unwrap();
        other_rx.derive_srtp_keys(0).unwrap();

        let header = RtpHeader::new(0, 1, 0, 0xCAFE);
        let mut packet = RawPacket::rtp(&header, b"x").unwrap();
        other_tx.transform_packet(&mut packet).unwrap();
        other_rx.reverse_transform_packet(&mut packet).unwrap();
        assert_eq!(packet, RawPacket::rtp(&header, b"x").unwrap());
    }
}
