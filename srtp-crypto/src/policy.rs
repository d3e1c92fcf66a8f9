//! Crypto Policy
//!
//! Immutable description of the algorithms and key/tag lengths used by an
//! SRTP or SRTCP stream. A policy is validated once when it is built and is
//! then shared (behind an `Arc`) by every context created from it.

use crate::ctr::KeystreamOverflow;
use thiserror::Error;

/// Length of the master and session salt consumed by the key derivation (112 bits)
pub const SALT_LEN: usize = 14;

/// Full HMAC-SHA1 output length
pub const HMAC_SHA1_TAG_MAX: usize = 20;

/// Largest HMAC key accepted (one SHA-1 block)
pub const HMAC_SHA1_KEY_MAX: usize = 64;

/// Encryption transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncryptionType {
    /// Payload left in the clear
    Null,
    /// AES in counter mode (RFC 3711 §4.1.1)
    AesCm,
    /// AES in f8 mode (RFC 3711 §4.1.2)
    AesF8,
}

/// Message authentication transform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthenticationType {
    /// No authentication tag
    Null,
    /// HMAC-SHA1 truncated to the policy tag length
    HmacSha1,
}

/// Policy validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unsupported AES key length: {0} bytes (expected 16, 24 or 32)")]
    UnsupportedKeyLength(usize),

    #[error("Invalid salt length: expected {expected} bytes, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    #[error("Invalid authentication key length: {0} bytes")]
    InvalidAuthKeyLength(usize),

    #[error("Invalid authentication tag length: {0} bytes")]
    InvalidTagLength(usize),

    #[error("Master key length mismatch: expected {expected} bytes, got {actual}")]
    MasterKeyLength { expected: usize, actual: usize },

    #[error("Master salt length mismatch: expected {expected} bytes, got {actual}")]
    MasterSaltLength { expected: usize, actual: usize },

    #[error("Derived key too long: {0}")]
    DerivedKeyLength(#[from] KeystreamOverflow),
}

/// Cryptographic policy of one stream direction
///
/// The encryption key length doubles as the master key length: the key
/// derivation PRF is AES keyed with the master key, so even a policy with
/// null encryption carries an AES key size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CryptoPolicy {
    enc_type: EncryptionType,
    auth_type: AuthenticationType,
    enc_key_len: usize,
    auth_key_len: usize,
    salt_key_len: usize,
    auth_tag_len: usize,
}

impl CryptoPolicy {
    /// Create a validated policy
    pub fn new(
        enc_type: EncryptionType,
        auth_type: AuthenticationType,
        enc_key_len: usize,
        auth_key_len: usize,
        salt_key_len: usize,
        auth_tag_len: usize,
    ) -> Result<Self, PolicyError> {
        if !matches!(enc_key_len, 16 | 24 | 32) {
            return Err(PolicyError::UnsupportedKeyLength(enc_key_len));
        }

        if salt_key_len != SALT_LEN {
            return Err(PolicyError::InvalidSaltLength {
                expected: SALT_LEN,
                actual: salt_key_len,
            });
        }

        match auth_type {
            AuthenticationType::Null => {
                if auth_key_len != 0 {
                    return Err(PolicyError::InvalidAuthKeyLength(auth_key_len));
                }
                if auth_tag_len != 0 {
                    return Err(PolicyError::InvalidTagLength(auth_tag_len));
                }
            }
            AuthenticationType::HmacSha1 => {
                if auth_key_len == 0 || auth_key_len > HMAC_SHA1_KEY_MAX {
                    return Err(PolicyError::InvalidAuthKeyLength(auth_key_len));
                }
                if auth_tag_len == 0 || auth_tag_len > HMAC_SHA1_TAG_MAX {
                    return Err(PolicyError::InvalidTagLength(auth_tag_len));
                }
            }
        }

        Ok(CryptoPolicy {
            enc_type,
            auth_type,
            enc_key_len,
            auth_key_len,
            salt_key_len,
            auth_tag_len,
        })
    }

    /// AES_CM_128_HMAC_SHA1_80, the mandatory-to-implement SRTP profile
    pub fn aes_cm_128_hmac_sha1_80() -> Self {
        Self::profile(EncryptionType::AesCm, AuthenticationType::HmacSha1, 16, 20, 10)
    }

    /// AES_CM_128_HMAC_SHA1_32 (short tag, RTP only per RFC 4568)
    pub fn aes_cm_128_hmac_sha1_32() -> Self {
        Self::profile(EncryptionType::AesCm, AuthenticationType::HmacSha1, 16, 20, 4)
    }

    /// AES_256_CM_HMAC_SHA1_80 (RFC 6188)
    pub fn aes_cm_256_hmac_sha1_80() -> Self {
        Self::profile(EncryptionType::AesCm, AuthenticationType::HmacSha1, 32, 20, 10)
    }

    /// F8_128_HMAC_SHA1_80 (RFC 4568)
    pub fn aes_f8_128_hmac_sha1_80() -> Self {
        Self::profile(EncryptionType::AesF8, AuthenticationType::HmacSha1, 16, 20, 10)
    }

    /// Authentication only, payload left in the clear
    pub fn null_hmac_sha1_80() -> Self {
        Self::profile(EncryptionType::Null, AuthenticationType::HmacSha1, 16, 20, 10)
    }

    /// Neither encryption nor authentication
    pub fn null_null() -> Self {
        Self::profile(EncryptionType::Null, AuthenticationType::Null, 16, 0, 0)
    }

    fn profile(
        enc_type: EncryptionType,
        auth_type: AuthenticationType,
        enc_key_len: usize,
        auth_key_len: usize,
        auth_tag_len: usize,
    ) -> Self {
        CryptoPolicy {
            enc_type,
            auth_type,
            enc_key_len,
            auth_key_len,
            salt_key_len: SALT_LEN,
            auth_tag_len,
        }
    }

    #[inline]
    pub fn enc_type(&self) -> EncryptionType {
        self.enc_type
    }

    #[inline]
    pub fn auth_type(&self) -> AuthenticationType {
        self.auth_type
    }

    #[inline]
    pub fn enc_key_len(&self) -> usize {
        self.enc_key_len
    }

    #[inline]
    pub fn auth_key_len(&self) -> usize {
        self.auth_key_len
    }

    #[inline]
    pub fn salt_key_len(&self) -> usize {
        self.salt_key_len
    }

    #[inline]
    pub fn auth_tag_len(&self) -> usize {
        self.auth_tag_len
    }

    /// Whether packets are encrypted under this policy
    #[inline]
    pub fn encrypts(&self) -> bool {
        self.enc_type != EncryptionType::Null
    }

    /// Whether packets carry an authentication tag under this policy
    #[inline]
    pub fn authenticates(&self) -> bool {
        self.auth_type != AuthenticationType::Null
    }
}
