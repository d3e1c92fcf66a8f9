//! SRTP Errors
//!
//! Configuration errors are fatal and surface when a context is built.
//! Every other variant describes why a single packet was dropped; the media
//! pipeline discards that packet and carries on.

use crate::packet::PacketError;
use crate::replay::ReplayError;
use srtp_crypto::PolicyError;
use thiserror::Error;

/// SRTP/SRTCP processing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SrtpError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] PolicyError),

    #[error("Authentication tag mismatch")]
    AuthenticationFailure,

    #[error("Replayed packet: index {index}")]
    ReplayDetected { index: u64 },

    #[error("Packet index {index} is behind the replay window")]
    ReplayTooOld { index: u64 },

    #[error("Malformed packet: {0}")]
    Malformed(PacketError),

    #[error("RTP header extensions are not supported")]
    UnsupportedExtension,

    #[error("Master key identifier mismatch")]
    MkiMismatch,

    #[error("Session keys have not been derived")]
    NotKeyed,

    #[error("Packet index space exhausted, re-keying required")]
    KeyExhausted,
}

impl From<PacketError> for SrtpError {
    fn from(err: PacketError) -> Self {
        match err {
            PacketError::UnsupportedExtension => SrtpError::UnsupportedExtension,
            other => SrtpError::Malformed(other),
        }
    }
}

impl SrtpError {
    pub(crate) fn from_replay(err: ReplayError, index: u64) -> Self {
        match err {
            ReplayError::Duplicate => SrtpError::ReplayDetected { index },
            ReplayError::TooOld => SrtpError::ReplayTooOld { index },
        }
    }

    /// Classify the error for drop accounting
    pub fn drop_reason(&self) -> DropReason {
        match self {
            SrtpError::AuthenticationFailure => DropReason::Authentication,
            SrtpError::ReplayDetected { .. } => DropReason::Replay,
            SrtpError::ReplayTooOld { .. } => DropReason::TooOld,
            SrtpError::Malformed(_) | SrtpError::UnsupportedExtension => DropReason::Malformed,
            SrtpError::MkiMismatch => DropReason::Mki,
            SrtpError::Configuration(_) | SrtpError::NotKeyed | SrtpError::KeyExhausted => {
                DropReason::KeyState
            }
        }
    }
}

/// Why a packet was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    Authentication,
    Replay,
    TooOld,
    Malformed,
    Mki,
    KeyState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_maps_to_own_variant() {
        let err: SrtpError = PacketError::UnsupportedExtension.into();
        assert_eq!(err, SrtpError::UnsupportedExtension);
        assert_eq!(err.drop_reason(), DropReason::Malformed);
    }

    #[test]
    fn test_replay_mapping() {
        assert_eq!(
            SrtpError::from_replay(ReplayError::Duplicate, 7),
            SrtpError::ReplayDetected { index: 7 }
        );
        assert_eq!(
            SrtpError::from_replay(ReplayError::TooOld, 7).drop_reason(),
            DropReason::TooOld
        );
    }
}
