//! Session Key Derivation
//!
//! RFC 3711 §4.3. Each session key is AES-CM keystream under the master
//! key, with an IV built from the master salt XORed with
//! `key_id = label << 48 | (index DIV kdr)` aligned to the end of the
//! 14-byte salt. A key derivation rate of zero derives once per stream.

use crate::ctr::{CounterMode, KeystreamOverflow};
use crate::policy::{CryptoPolicy, PolicyError, SALT_LEN};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key derivation labels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KdfLabel {
    RtpEncryption = 0x00,
    RtpAuthentication = 0x01,
    RtpSalt = 0x02,
    RtcpEncryption = 0x03,
    RtcpAuthentication = 0x04,
    RtcpSalt = 0x05,
}

/// Master key, master salt and derivation parameters agreed by key management
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKeyMaterial {
    key: Vec<u8>,
    salt: Vec<u8>,
    kdr: u64,
    mki: Option<Vec<u8>>,
}

impl MasterKeyMaterial {
    /// Bundle master key material; a `kdr` of 0 disables re-keying
    pub fn new(key: &[u8], salt: &[u8], kdr: u64) -> Self {
        MasterKeyMaterial {
            key: key.to_vec(),
            salt: salt.to_vec(),
            kdr,
            mki: None,
        }
    }

    /// Attach a master key identifier carried in every protected packet
    pub fn with_mki(mut self, mki: &[u8]) -> Self {
        self.mki = if mki.is_empty() {
            None
        } else {
            Some(mki.to_vec())
        };
        self
    }

    /// Replace the key derivation rate
    pub fn with_kdr(mut self, kdr: u64) -> Self {
        self.kdr = kdr;
        self
    }

    /// Check key and salt lengths against a policy
    pub fn validate(&self, policy: &CryptoPolicy) -> Result<(), PolicyError> {
        if self.key.len() != policy.enc_key_len() {
            return Err(PolicyError::MasterKeyLength {
                expected: policy.enc_key_len(),
                actual: self.key.len(),
            });
        }
        if self.salt.len() != policy.salt_key_len() {
            return Err(PolicyError::MasterSaltLength {
                expected: policy.salt_key_len(),
                actual: self.salt.len(),
            });
        }
        Ok(())
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn kdr(&self) -> u64 {
        self.kdr
    }

    pub fn mki(&self) -> Option<&[u8]> {
        self.mki.as_deref()
    }
}

impl std::fmt::Debug for MasterKeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKeyMaterial")
            .field("key_len", &self.key.len())
            .field("salt_len", &self.salt.len())
            .field("kdr", &self.kdr)
            .field("mki", &self.mki)
            .finish()
    }
}

/// Session keys derived for one stream direction
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SessionKeys {
    pub enc_key: Vec<u8>,
    pub auth_key: Vec<u8>,
    pub salt_key: Vec<u8>,
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys").finish_non_exhaustive()
    }
}

/// Key derivation function keyed with the master key
///
/// The PRF owns its own cipher handle, independent of any cipher used for
/// packet processing.
pub struct KeyDerivation {
    prf: CounterMode,
    master_salt: [u8; SALT_LEN],
    kdr: u64,
}

impl KeyDerivation {
    pub fn new(master: &MasterKeyMaterial, policy: &CryptoPolicy) -> Result<Self, PolicyError> {
        master.validate(policy)?;

        let mut master_salt = [0u8; SALT_LEN];
        master_salt.copy_from_slice(master.salt());

        Ok(KeyDerivation {
            prf: CounterMode::new(master.key())?,
            master_salt,
            kdr: master.kdr(),
        })
    }

    /// Key derivation rate in packets (0 = derive once)
    pub fn kdr(&self) -> u64 {
        self.kdr
    }

    /// The `index DIV kdr` term for a packet index
    #[inline]
    pub fn rate_quotient(&self, index: u64) -> u64 {
        if self.kdr == 0 {
            0
        } else {
            index / self.kdr
        }
    }

    fn iv(&self, label: KdfLabel, index: u64) -> [u8; 16] {
        let key_id = ((label as u64) << 48) | (self.rate_quotient(index) & 0xFFFF_FFFF_FFFF);
        let key_id = key_id.to_be_bytes();

        let mut iv = [0u8; 16];
        iv[..SALT_LEN].copy_from_slice(&self.master_salt);
        // key_id is 56 bits wide: the low seven bytes of the u64
        for (byte, id) in iv[7..SALT_LEN].iter_mut().zip(key_id[1..].iter()) {
            *byte ^= id;
        }
        iv
    }

    /// Fill `out` with the key for `label` at `index`
    pub fn derive(&self, label: KdfLabel, index: u64, out: &mut [u8]) -> Result<(), KeystreamOverflow> {
        let iv = self.iv(label, index);
        self.prf.keystream(out, &iv)
    }

    /// Derive the three SRTP session keys for `index`
    pub fn derive_srtp(&self, policy: &CryptoPolicy, index: u64) -> Result<SessionKeys, PolicyError> {
        tracing::debug!(index, kdr = self.kdr, "deriving SRTP session keys");
        self.derive_set(
            policy,
            index,
            [
                KdfLabel::RtpEncryption,
                KdfLabel::RtpAuthentication,
                KdfLabel::RtpSalt,
            ],
        )
    }

    /// Derive the three SRTCP session keys for `index`
    pub fn derive_srtcp(&self, policy: &CryptoPolicy, index: u64) -> Result<SessionKeys, PolicyError> {
        tracing::debug!(index, kdr = self.kdr, "deriving SRTCP session keys");
        self.derive_set(
            policy,
            index,
            [
                KdfLabel::RtcpEncryption,
                KdfLabel::RtcpAuthentication,
                KdfLabel::RtcpSalt,
            ],
        )
    }

    fn derive_set(
        &self,
        policy: &CryptoPolicy,
        index: u64,
        labels: [KdfLabel; 3],
    ) -> Result<SessionKeys, PolicyError> {
        let mut keys = SessionKeys {
            enc_key: vec![0u8; policy.enc_key_len()],
            auth_key: vec![0u8; policy.auth_key_len()],
            salt_key: vec![0u8; policy.salt_key_len()],
        };
        self.derive(labels[0], index, &mut keys.enc_key)?;
        self.derive(labels[1], index, &mut keys.auth_key)?;
        self.derive(labels[2], index, &mut keys.salt_key)?;
        Ok(keys)
    }
}
