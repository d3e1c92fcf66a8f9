//! AES Counter Mode (AES-CM)
//!
//! RFC 3711 §4.1.1 counter mode: the last two bytes of a 16-byte IV carry a
//! big-endian block counter starting at zero, and the encrypted counter
//! blocks form a keystream XORed onto the data. The same routine serves as
//! the key derivation PRF.
//!
//! The 16-bit block counter bounds one invocation to 2^20 bytes of keystream.
//! Longer inputs are refused; wrapping the counter would reuse keystream.

use crate::block::{Block, BlockCipher, BLOCK_SIZE};
use crate::policy::PolicyError;
use thiserror::Error;

/// Most bytes one IV can encrypt: 2^16 counter blocks
pub const MAX_KEYSTREAM_LEN: usize = BLOCK_SIZE << 16;

/// Input longer than the keystream one IV can produce
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("keystream overflow: {0} bytes exceed the 16-bit block counter")]
pub struct KeystreamOverflow(pub usize);

/// AES-CM keystream generator
#[derive(Debug, Clone)]
pub struct CounterMode {
    cipher: BlockCipher,
}

impl CounterMode {
    /// Create a counter mode cipher keyed with `key`
    pub fn new(key: &[u8]) -> Result<Self, PolicyError> {
        Ok(CounterMode {
            cipher: BlockCipher::new(key)?,
        })
    }

    /// XOR the keystream for `iv` into `data`
    ///
    /// Applying this twice with the same IV restores the input, so the same
    /// call encrypts and decrypts. Nothing is written when `data` is longer
    /// than [`MAX_KEYSTREAM_LEN`].
    pub fn process(&self, data: &mut [u8], iv: &Block) -> Result<(), KeystreamOverflow> {
        if data.len() > MAX_KEYSTREAM_LEN {
            return Err(KeystreamOverflow(data.len()));
        }

        let mut counter_block = *iv;
        let mut keystream = [0u8; BLOCK_SIZE];

        for (counter, chunk) in data.chunks_mut(BLOCK_SIZE).enumerate() {
            // at most 2^16 blocks after the length check
            let counter = counter as u16;
            counter_block[14..].copy_from_slice(&counter.to_be_bytes());

            keystream.copy_from_slice(&counter_block);
            self.cipher.encrypt_block(&mut keystream);

            for (byte, key) in chunk.iter_mut().zip(keystream.iter()) {
                *byte ^= key;
            }
        }
        Ok(())
    }

    /// Fill `out` with raw keystream for `iv`
    pub fn keystream(&self, out: &mut [u8], iv: &Block) -> Result<(), KeystreamOverflow> {
        out.fill(0);
        self.process(out, iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3711_keystream() {
        // RFC 3711 Appendix B.2
        let cm = CounterMode::new(&hex::decode("2B7E151628AED2A6ABF7158809CF4F3C").unwrap()).unwrap();
        let mut iv = [0u8; BLOCK_SIZE];
        hex::decode_to_slice("F0F1F2F3F4F5F6F7F8F9FAFBFCFD0000", &mut iv).unwrap();

        let mut out = [0u8; 48];
        cm.keystream(&mut out, &iv).unwrap();

        let expected = hex::decode(concat!(
            "E03EAD0935C95E80E166B16DD92B4EB4",
            "D23513162B02D0F72A43A2FE4A5F97AB",
            "41E95B3BB0A2E8DD477901E4FCA894C0",
        ))
        .unwrap();
        assert_eq!(out.to_vec(), expected);
    }

    #[test]
    fn test_partial_final_block() {
        let cm = CounterMode::new(&[7u8; 16]).unwrap();
        let iv = [3u8; BLOCK_SIZE];

        let mut full = [0u8; 32];
        cm.keystream(&mut full, &iv).unwrap();
        let mut partial = [0u8; 21];
        cm.keystream(&mut partial, &iv).unwrap();

        assert_eq!(&full[..21], &partial[..]);
    }

    #[test]
    fn test_involution() {
        let cm = CounterMode::new(&[9u8; 16]).unwrap();
        let iv = [0xA5u8; BLOCK_SIZE];
        let original: Vec<u8> = (0u8..=99).collect();

        let mut data = original.clone();
        cm.process(&mut data, &iv).unwrap();
        assert_ne!(data, original);
        cm.process(&mut data, &iv).unwrap();
        assert_eq!(data, original);
    }

    #[test]
    fn test_empty_input() {
        let cm = CounterMode::new(&[0u8; 16]).unwrap();
        let mut data: [u8; 0] = [];
        cm.process(&mut data, &[0u8; BLOCK_SIZE]).unwrap();
    }

    #[test]
    fn test_counter_space_limit() {
        let cm = CounterMode::new(&[1u8; 16]).unwrap();
        let iv = [0u8; BLOCK_SIZE];

        let mut largest = vec![0u8; MAX_KEYSTREAM_LEN];
        assert!(cm.process(&mut largest, &iv).is_ok());
        // the last block still uses a distinct counter value
        assert_ne!(largest[..BLOCK_SIZE], largest[MAX_KEYSTREAM_LEN - BLOCK_SIZE..]);

        let mut too_long = vec![0u8; MAX_KEYSTREAM_LEN + 1];
        assert_eq!(
            cm.process(&mut too_long, &iv),
            Err(KeystreamOverflow(MAX_KEYSTREAM_LEN + 1))
        );
        assert!(too_long.iter().all(|&b| b == 0));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Shorter keystreams are prefixes of longer ones for the same IV
            #[test]
            fn prop_keystream_prefix(
                key in prop::collection::vec(any::<u8>(), 16),
                iv in prop::array::uniform16(any::<u8>()),
                short in 0usize..200,
                extra in 0usize..200,
            ) {
                let cm = CounterMode::new(&key).unwrap();
                let mut long = vec![0u8; short + extra];
                cm.keystream(&mut long, &iv).unwrap();
                let mut prefix = vec![0u8; short];
                cm.keystream(&mut prefix, &iv).unwrap();

                prop_assert_eq!(&long[..short], &prefix[..]);
            }
        }
    }
}
