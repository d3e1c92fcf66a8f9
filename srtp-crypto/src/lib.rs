//! SRTP Cryptographic Transforms
//!
//! This crate provides the primitives SRTP and SRTCP are built from: the
//! crypto policy, single-block AES, the counter-mode and f8 keystream
//! generators, the HMAC-SHA1 authenticator and the session key derivation.
//! AES comes from the RustCrypto `aes` crate, HMAC-SHA1 from `ring`.

pub mod block;
pub mod cipher;
pub mod ctr;
pub mod f8;
pub mod hmac;
pub mod kdf;
pub mod policy;

pub use block::{Block, BlockCipher, BLOCK_SIZE};
pub use cipher::SessionCipher;
pub use ctr::{CounterMode, KeystreamOverflow, MAX_KEYSTREAM_LEN};
pub use f8::F8Mode;
pub use hmac::{constant_time_eq, HmacSha1, Tag};
pub use kdf::{KdfLabel, KeyDerivation, MasterKeyMaterial, SessionKeys};
pub use policy::{AuthenticationType, CryptoPolicy, EncryptionType, PolicyError, SALT_LEN};
