//! Session cipher selection
//!
//! Binds a policy's encryption type to a keyed keystream generator. The IV
//! layout differs between counter mode and f8 and is built by the caller;
//! this type only applies the keystream.

use crate::block::Block;
use crate::ctr::{CounterMode, KeystreamOverflow};
use crate::f8::F8Mode;
use crate::kdf::SessionKeys;
use crate::policy::{EncryptionType, PolicyError};

/// Payload cipher keyed with session keys
#[derive(Debug, Clone)]
pub enum SessionCipher {
    Null,
    AesCm(CounterMode),
    AesF8(F8Mode),
}

impl SessionCipher {
    pub fn new(enc_type: EncryptionType, keys: &SessionKeys) -> Result<Self, PolicyError> {
        match enc_type {
            EncryptionType::Null => Ok(SessionCipher::Null),
            EncryptionType::AesCm => Ok(SessionCipher::AesCm(CounterMode::new(&keys.enc_key)?)),
            EncryptionType::AesF8 => Ok(SessionCipher::AesF8(F8Mode::new(
                &keys.enc_key,
                &keys.salt_key,
            )?)),
        }
    }

    pub fn encryption_type(&self) -> EncryptionType {
        match self {
            SessionCipher::Null => EncryptionType::Null,
            SessionCipher::AesCm(_) => EncryptionType::AesCm,
            SessionCipher::AesF8(_) => EncryptionType::AesF8,
        }
    }

    /// Encrypt or decrypt `data` in place
    pub fn process(&self, data: &mut [u8], iv: &Block) -> Result<(), KeystreamOverflow> {
        match self {
            SessionCipher::Null => Ok(()),
            SessionCipher::AesCm(cm) => cm.process(data, iv),
            SessionCipher::AesF8(f8) => {
                f8.process(data, iv);
                Ok(())
            }
        }
    }
}
