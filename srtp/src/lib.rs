//! SRTP - Secure Real-time Transport Protocol
//!
//! High-level Rust API for protecting RTP and RTCP streams (RFC 3711), with
//! lazily created per-SSRC crypto contexts.

pub mod engine;
pub mod transformer;

pub use srtp_crypto as crypto;
pub use srtp_protocol as protocol;

// Re-export commonly used types
pub use crypto::{AuthenticationType, CryptoPolicy, EncryptionType, MasterKeyMaterial};
pub use engine::{EngineStats, SrtpTransformEngine};
pub use protocol::{DropReason, RawPacket, RtcpHeader, RtpHeader, SrtpError, StreamStats};
pub use transformer::{PacketTransformer, SrtcpTransformer, SrtpTransformer, Transformer};
