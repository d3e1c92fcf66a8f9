//! Per-SSRC dispatch
//!
//! A `Transformer` owns a template context carrying the policy and master key
//! material, and lazily forks a keyed context for every SSRC it sees. The
//! SSRC map sits behind a `RwLock`; lookups of known streams take the read
//! lock only, and creation of a missing stream happens entirely under the
//! write lock so two callers can never create diverging contexts for the
//! same SSRC.
//!
//! Each stream context has its own `Mutex`, so streams are processed in
//! parallel while packets of one stream are serialized.
//!
//! The receive path only stores a context once it has accepted a packet.
//! The first packet of an unknown SSRC is checked by a detached context;
//! rejected packets leave the map untouched and their drops are counted as
//! unresolved.

use parking_lot::{Mutex, RwLock};
use srtp_crypto::{CryptoPolicy, MasterKeyMaterial};
use srtp_protocol::{
    CryptoContext, DropReason, RawPacket, SrtcpCryptoContext, SrtpCryptoContext, SrtpError,
    StreamStats,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Send and receive transform of one packet family
pub trait PacketTransformer: Send + Sync {
    /// Protect an outgoing packet
    fn transform(&self, packet: RawPacket) -> Result<RawPacket, SrtpError>;

    /// Unprotect an incoming packet; `None` means drop it
    fn reverse_transform(&self, packet: RawPacket) -> Option<RawPacket>;

    /// Drop all stream contexts
    fn close(&self);
}

/// SSRC → crypto context dispatcher
pub struct Transformer<C: CryptoContext> {
    template: Mutex<C>,
    contexts: RwLock<HashMap<u32, Arc<Mutex<C>>>>,
    /// Drops that happened before a stream context was resolved
    unresolved: Mutex<StreamStats>,
}

/// Dispatcher for RTP packets
pub type SrtpTransformer = Transformer<SrtpCryptoContext>;

/// Dispatcher for RTCP packets
pub type SrtcpTransformer = Transformer<SrtcpCryptoContext>;

impl<C: CryptoContext> Transformer<C> {
    /// Create a dispatcher from a template context
    pub fn new(template: C) -> Self {
        Transformer {
            template: Mutex::new(template),
            contexts: RwLock::new(HashMap::new()),
            unresolved: Mutex::new(StreamStats::default()),
        }
    }

    /// Get the context of `ssrc`, creating and keying it if necessary
    pub fn context(&self, ssrc: u32) -> Result<Arc<Mutex<C>>, SrtpError> {
        if let Some(context) = self.contexts.read().get(&ssrc) {
            return Ok(Arc::clone(context));
        }

        let mut contexts = self.contexts.write();
        if let Some(context) = contexts.get(&ssrc) {
            return Ok(Arc::clone(context));
        }

        let context = Arc::new(Mutex::new(self.template.lock().derive_keyed(ssrc)?));
        contexts.insert(ssrc, Arc::clone(&context));
        debug!(ssrc, streams = contexts.len(), "created stream context");
        Ok(context)
    }

    fn resolve(&self, packet: &RawPacket) -> Result<Arc<Mutex<C>>, SrtpError> {
        let resolved = C::packet_ssrc(packet)
            .map_err(SrtpError::from)
            .and_then(|ssrc| self.context(ssrc));

        if let Err(err) = &resolved {
            self.record_unresolved(err);
        }
        resolved
    }

    fn record_unresolved(&self, err: &SrtpError) {
        trace!(%err, "dropping packet without stream context");
        self.unresolved.lock().record_drop(err.drop_reason());
    }

    /// Unprotect the first packet of an SSRC without a context
    ///
    /// The context is stored only if it accepts the packet. If another
    /// caller stored one in the meantime, the packet goes through that one.
    fn reverse_first(&self, ssrc: u32, packet: RawPacket) -> Option<RawPacket> {
        let derived = self.template.lock().derive_keyed(ssrc);
        let mut candidate = match derived {
            Ok(candidate) => candidate,
            Err(err) => {
                self.record_unresolved(&err);
                return None;
            }
        };

        let mut unprotected = packet.clone();
        if candidate.reverse_transform_packet(&mut unprotected).is_err() {
            self.unresolved.lock().merge(candidate.stats());
            return None;
        }

        let mut contexts = self.contexts.write();
        if let Some(existing) = contexts.get(&ssrc).cloned() {
            drop(contexts);
            return Self::reverse_with(&existing, packet);
        }

        contexts.insert(ssrc, Arc::new(Mutex::new(candidate)));
        debug!(ssrc, streams = contexts.len(), "created stream context");
        Some(unprotected)
    }

    fn reverse_with(context: &Mutex<C>, mut packet: RawPacket) -> Option<RawPacket> {
        context.lock().reverse_transform_packet(&mut packet).ok()?;
        Some(packet)
    }

    /// Number of streams with a context
    pub fn stream_count(&self) -> usize {
        self.contexts.read().len()
    }

    /// SSRCs with a context
    pub fn ssrcs(&self) -> Vec<u32> {
        self.contexts.read().keys().copied().collect()
    }

    /// Counters of one stream
    pub fn stream_stats(&self, ssrc: u32) -> Option<StreamStats> {
        let context = self.contexts.read().get(&ssrc).cloned()?;
        let stats = context.lock().stats().clone();
        Some(stats)
    }

    /// Counters summed over all streams, including unresolved drops
    pub fn stats(&self) -> StreamStats {
        let mut total = self.unresolved.lock().clone();
        for context in self.contexts.read().values() {
            total.merge(context.lock().stats());
        }
        total
    }

    /// Packets dropped for `reason` across all streams
    pub fn drops(&self, reason: DropReason) -> u64 {
        let stats = self.stats();
        match reason {
            DropReason::Authentication => stats.auth_failures,
            DropReason::Replay => stats.replay_duplicates,
            DropReason::TooOld => stats.replay_too_old,
            DropReason::Malformed => stats.malformed,
            DropReason::Mki => stats.mki_mismatches,
            DropReason::KeyState => stats.key_state_errors,
        }
    }
}

impl<C: CryptoContext> PacketTransformer for Transformer<C> {
    fn transform(&self, mut packet: RawPacket) -> Result<RawPacket, SrtpError> {
        let context = self.resolve(&packet)?;
        let mut context = context.lock();
        context.transform_packet(&mut packet)?;
        Ok(packet)
    }

    fn reverse_transform(&self, packet: RawPacket) -> Option<RawPacket> {
        let ssrc = match C::packet_ssrc(&packet) {
            Ok(ssrc) => ssrc,
            Err(err) => {
                self.record_unresolved(&SrtpError::from(err));
                return None;
            }
        };

        let known = self.contexts.read().get(&ssrc).cloned();
        match known {
            Some(context) => Self::reverse_with(&context, packet),
            None => self.reverse_first(ssrc, packet),
        }
    }

    fn close(&self) {
        let mut contexts = self.contexts.write();
        debug!(streams = contexts.len(), "closing transformer");
        contexts.clear();
    }
}

impl SrtpTransformer {
    /// Dispatcher for RTP streams protected with `policy` and `master`
    pub fn srtp(policy: Arc<CryptoPolicy>, master: MasterKeyMaterial) -> Result<Self, SrtpError> {
        Ok(Transformer::new(SrtpCryptoContext::new(0, 0, policy, master)?))
    }
}

impl SrtcpTransformer {
    /// Dispatcher for RTCP streams protected with `policy` and `master`
    pub fn srtcp(policy: Arc<CryptoPolicy>, master: MasterKeyMaterial) -> Result<Self, SrtpError> {
        Ok(Transformer::new(SrtcpCryptoContext::new(0, policy, master)?))
    }
}
