//! Per-stream counters
//!
//! Owned by each crypto context and mutated under the same exclusive access
//! as the rest of the context state.

use crate::error::DropReason;

/// Packet and drop counters of one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Packets protected on the send path
    pub packets_protected: u64,
    /// Bytes of protected output (tags and trailers included)
    pub bytes_protected: u64,
    /// Packets accepted on the receive path
    pub packets_unprotected: u64,
    /// Bytes of recovered output
    pub bytes_unprotected: u64,
    pub auth_failures: u64,
    pub replay_duplicates: u64,
    pub replay_too_old: u64,
    pub malformed: u64,
    pub mki_mismatches: u64,
    pub key_state_errors: u64,
}

impl StreamStats {
    pub fn record_protected(&mut self, bytes: usize) {
        self.packets_protected += 1;
        self.bytes_protected += bytes as u64;
    }

    pub fn record_unprotected(&mut self, bytes: usize) {
        self.packets_unprotected += 1;
        self.bytes_unprotected += bytes as u64;
    }

    pub fn record_drop(&mut self, reason: DropReason) {
        match reason {
            DropReason::Authentication => self.auth_failures += 1,
            DropReason::Replay => self.replay_duplicates += 1,
            DropReason::TooOld => self.replay_too_old += 1,
            DropReason::Malformed => self.malformed += 1,
            DropReason::Mki => self.mki_mismatches += 1,
            DropReason::KeyState => self.key_state_errors += 1,
        }
    }

    /// Total packets dropped for any reason
    pub fn dropped(&self) -> u64 {
        self.auth_failures
            + self.replay_duplicates
            + self.replay_too_old
            + self.malformed
            + self.mki_mismatches
            + self.key_state_errors
    }

    /// Add another stream's counters into this one
    pub fn merge(&mut self, other: &StreamStats) {
        self.packets_protected += other.packets_protected;
        self.bytes_protected += other.bytes_protected;
        self.packets_unprotected += other.packets_unprotected;
        self.bytes_unprotected += other.bytes_unprotected;
        self.auth_failures += other.auth_failures;
        self.replay_duplicates += other.replay_duplicates;
        self.replay_too_old += other.replay_too_old;
        self.malformed += other.malformed;
        self.mki_mismatches += other.mki_mismatches;
        self.key_state_errors += other.key_state_errors;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_accounting() {
        let mut stats = StreamStats::default();
        stats.record_drop(DropReason::Authentication);
        stats.record_drop(DropReason::Authentication);
        stats.record_drop(DropReason::Replay);

        assert_eq!(stats.auth_failures, 2);
        assert_eq!(stats.replay_duplicates, 1);
        assert_eq!(stats.dropped(), 3);
    }

    #[test]
    fn test_merge() {
        let mut a = StreamStats::default();
        a.record_protected(100);
        let mut b = StreamStats::default();
        b.record_protected(50);
        b.record_drop(DropReason::Malformed);

        a.merge(&b);
        assert_eq!(a.packets_protected, 2);
        assert_eq!(a.bytes_protected, 150);
        assert_eq!(a.malformed, 1);
    }
}
