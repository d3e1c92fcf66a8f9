//! AES Block Primitive
//!
//! Single-block AES encryption under a fixed key. SRTP only ever runs AES in
//! the forward direction (counter mode, f8 and the key derivation PRF are all
//! keystream generators), so no decrypt operation is exposed.
//!
//! A `BlockCipher` is immutable once keyed. Re-keying means building a new
//! handle, so key derivation and packet processing never share cipher state.

use crate::policy::PolicyError;
use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// A single AES block
pub type Block = [u8; BLOCK_SIZE];

/// AES keyed for one of the three standard key sizes
#[derive(Clone)]
pub enum BlockCipher {
    Aes128(Aes128),
    Aes192(Aes192),
    Aes256(Aes256),
}

impl BlockCipher {
    /// Key a new cipher handle
    pub fn new(key: &[u8]) -> Result<Self, PolicyError> {
        let invalid = |_| PolicyError::UnsupportedKeyLength(key.len());
        match key.len() {
            16 => Ok(BlockCipher::Aes128(
                Aes128::new_from_slice(key).map_err(invalid)?,
            )),
            24 => Ok(BlockCipher::Aes192(
                Aes192::new_from_slice(key).map_err(invalid)?,
            )),
            32 => Ok(BlockCipher::Aes256(
                Aes256::new_from_slice(key).map_err(invalid)?,
            )),
            other => Err(PolicyError::UnsupportedKeyLength(other)),
        }
    }

    /// Key length in bytes
    pub fn key_len(&self) -> usize {
        match self {
            BlockCipher::Aes128(_) => 16,
            BlockCipher::Aes192(_) => 24,
            BlockCipher::Aes256(_) => 32,
        }
    }

    /// Encrypt one block in place
    #[inline]
    pub fn encrypt_block(&self, block: &mut Block) {
        let block = GenericArray::from_mut_slice(&mut block[..]);
        match self {
            BlockCipher::Aes128(c) => c.encrypt_block(block),
            BlockCipher::Aes192(c) => c.encrypt_block(block),
            BlockCipher::Aes256(c) => c.encrypt_block(block),
        }
    }
}

impl std::fmt::Debug for BlockCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BlockCipher(AES-{})", self.key_len() * 8)
    }
}
