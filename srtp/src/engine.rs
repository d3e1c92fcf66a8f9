//! SRTP Transform Engine
//!
//! Pairs an RTP and an RTCP dispatcher keyed from the same key exchange.
//! RTP and RTCP may use different policies (e.g. a shorter RTP tag), and key
//! management may hand out separate master keys for the two.

use crate::transformer::{PacketTransformer, SrtcpTransformer, SrtpTransformer};
use srtp_crypto::{CryptoPolicy, MasterKeyMaterial};
use srtp_protocol::{SrtpError, StreamStats};
use std::sync::Arc;
use tracing::info;

/// Combined counters of both packet families
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub rtp: StreamStats,
    pub rtcp: StreamStats,
}

/// RTP/RTCP transformer pair
pub struct SrtpTransformEngine {
    rtp: SrtpTransformer,
    rtcp: SrtcpTransformer,
}

impl SrtpTransformEngine {
    /// Build an engine using one master key for both RTP and RTCP
    pub fn new(
        master: MasterKeyMaterial,
        rtp_policy: CryptoPolicy,
        rtcp_policy: CryptoPolicy,
    ) -> Result<Self, SrtpError> {
        SrtpTransformEngine::with_keys(master.clone(), rtp_policy, master, rtcp_policy)
    }

    /// Build an engine with separate RTP and RTCP master keys
    pub fn with_keys(
        rtp_master: MasterKeyMaterial,
        rtp_policy: CryptoPolicy,
        rtcp_master: MasterKeyMaterial,
        rtcp_policy: CryptoPolicy,
    ) -> Result<Self, SrtpError> {
        let rtp = SrtpTransformer::srtp(Arc::new(rtp_policy), rtp_master)?;
        let rtcp = SrtcpTransformer::srtcp(Arc::new(rtcp_policy), rtcp_master)?;
        Ok(SrtpTransformEngine { rtp, rtcp })
    }

    #[inline]
    pub fn rtp_transformer(&self) -> &SrtpTransformer {
        &self.rtp
    }

    #[inline]
    pub fn rtcp_transformer(&self) -> &SrtcpTransformer {
        &self.rtcp
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            rtp: self.rtp.stats(),
            rtcp: self.rtcp.stats(),
        }
    }

    /// Drop every stream context of both transformers
    pub fn close(&self) {
        info!(
            rtp_streams = self.rtp.stream_count(),
            rtcp_streams = self.rtcp.stream_count(),
            "closing SRTP transform engine"
        );
        self.rtp.close();
        self.rtcp.close();
    }
}
