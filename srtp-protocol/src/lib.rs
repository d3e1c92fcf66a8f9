//! SRTP Protocol Core Implementation
//!
//! This crate implements the per-SSRC packet protection state of SRTP and
//! SRTCP (RFC 3711): RTP/RTCP packet access, packet index estimation, the
//! replay window, and the crypto contexts that tie them to the transforms
//! of `srtp-crypto`.

pub mod context;
pub mod error;
pub mod index;
pub mod packet;
pub mod replay;
mod session;
pub mod srtcp_context;
pub mod srtp_context;
pub mod stats;

pub use context::CryptoContext;
pub use error::{DropReason, SrtpError};
pub use index::{estimate_index, estimate_roc, SrtpIndex, MAX_SRTCP_INDEX, MAX_SRTP_INDEX};
pub use packet::{PacketError, RawPacket, RtcpHeader, RtpHeader, RTCP_HEADER_SIZE, RTP_HEADER_SIZE};
pub use replay::{ReplayError, ReplayWindow, REPLAY_WINDOW_SIZE};
pub use srtcp_context::{SrtcpCryptoContext, SRTCP_INDEX_SIZE};
pub use srtp_context::SrtpCryptoContext;
pub use stats::StreamStats;
