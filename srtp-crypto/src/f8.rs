//! AES f8 Mode
//!
//! RFC 3711 §4.1.2. The packet IV is first encrypted under a masked key
//! `k_e XOR m`, where `m = k_s || 0x55..55` is the session salt padded with
//! 0x55 to the key length, giving IV'. Keystream block `j` is then
//!
//! ```text
//! S(j) = E(k_e, IV' XOR j XOR S(j-1)),   S(-1) = 0
//! ```
//!
//! with `j` taken as a 128-bit big-endian counter.

use crate::block::{Block, BlockCipher, BLOCK_SIZE};
use crate::policy::PolicyError;
use zeroize::Zeroizing;

const MASK_PAD: u8 = 0x55;

/// AES-f8 keystream generator
#[derive(Debug, Clone)]
pub struct F8Mode {
    cipher: BlockCipher,
    iv_cipher: BlockCipher,
}

impl F8Mode {
    /// Create an f8 cipher from the session encryption and salt keys
    pub fn new(enc_key: &[u8], salt_key: &[u8]) -> Result<Self, PolicyError> {
        if salt_key.len() > enc_key.len() {
            return Err(PolicyError::InvalidSaltLength {
                expected: enc_key.len(),
                actual: salt_key.len(),
            });
        }

        let mut masked = Zeroizing::new(vec![MASK_PAD; enc_key.len()]);
        masked[..salt_key.len()].copy_from_slice(salt_key);
        for (m, k) in masked.iter_mut().zip(enc_key.iter()) {
            *m ^= k;
        }

        Ok(F8Mode {
            cipher: BlockCipher::new(enc_key)?,
            iv_cipher: BlockCipher::new(&masked)?,
        })
    }

    /// XOR the f8 keystream for `iv` into `data` (encrypts and decrypts)
    pub fn process(&self, data: &mut [u8], iv: &Block) {
        let mut iv_prime = *iv;
        self.iv_cipher.encrypt_block(&mut iv_prime);

        let mut stream = [0u8; BLOCK_SIZE];
        for (j, chunk) in data.chunks_mut(BLOCK_SIZE).enumerate() {
            let counter = (j as u32).to_be_bytes();

            // stream holds S(j-1) here
            for (s, v) in stream.iter_mut().zip(iv_prime.iter()) {
                *s ^= v;
            }
            for (s, c) in stream[12..].iter_mut().zip(counter.iter()) {
                *s ^= c;
            }
            self.cipher.encrypt_block(&mut stream);

            for (byte, key) in chunk.iter_mut().zip(stream.iter()) {
                *byte ^= key;
            }
        }
    }
}
