//! SRTP Packet Index
//!
//! SRTP extends the 16-bit RTP sequence number with a 32-bit rollover
//! counter (ROC) into a 48-bit packet index. The receiver never sees the ROC
//! on the wire and has to estimate it from the last accepted sequence
//! number (RFC 3711 §3.3.1 and Appendix A).

use std::fmt;

/// Maximum SRTP packet index value (48-bit)
pub const MAX_SRTP_INDEX: u64 = 0xFFFF_FFFF_FFFF;

/// Maximum SRTCP index value (31-bit)
pub const MAX_SRTCP_INDEX: u32 = 0x7FFF_FFFF;

/// Half of the 16-bit sequence space
const SEQ_HALF: i32 = 0x8000;

/// 48-bit SRTP packet index, `ROC << 16 | SEQ`
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct SrtpIndex(u64);

impl SrtpIndex {
    /// Combine a rollover counter and a sequence number
    #[inline]
    pub fn new(roc: u32, seq: u16) -> Self {
        SrtpIndex(((roc as u64) << 16) | seq as u64)
    }

    /// Create an index from a raw value, masked to 48 bits
    #[inline]
    pub fn from_raw(value: u64) -> Self {
        SrtpIndex(value & MAX_SRTP_INDEX)
    }

    #[inline]
    pub fn as_raw(self) -> u64 {
        self.0
    }

    /// Rollover counter part
    #[inline]
    pub fn roc(self) -> u32 {
        (self.0 >> 16) as u32
    }

    /// Sequence number part
    #[inline]
    pub fn seq(self) -> u16 {
        self.0 as u16
    }

    /// Signed distance from this index to another
    ///
    /// Positive values mean `other` is ahead of `self`.
    #[inline]
    pub fn distance_to(self, other: SrtpIndex) -> i64 {
        other.0 as i64 - self.0 as i64
    }
}

impl fmt::Debug for SrtpIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SrtpIndex(roc={}, seq={})", self.roc(), self.seq())
    }
}

impl fmt::Display for SrtpIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SrtpIndex> for u64 {
    fn from(index: SrtpIndex) -> u64 {
        index.0
    }
}

/// Estimate the rollover counter of a received sequence number
///
/// `roc` and `last_seq` describe the highest index accepted so far. The
/// result may be `roc - 1` (a late packet from before the last wrap, which
/// is -1 when `roc` is 0) or `roc + 1` (the first packets after a wrap).
pub fn estimate_roc(roc: u32, last_seq: u16, seq: u16) -> i64 {
    let roc = roc as i64;
    let last = last_seq as i32;
    let seq = seq as i32;

    if last < SEQ_HALF {
        if seq - last > SEQ_HALF {
            roc - 1
        } else {
            roc
        }
    } else if last - SEQ_HALF > seq {
        roc + 1
    } else {
        roc
    }
}

/// Estimate the full index of a received sequence number
///
/// Returns `None` when the estimate falls outside the 48-bit index space,
/// i.e. a packet from before the stream's first rollover period or past the
/// last one.
pub fn estimate_index(roc: u32, last_seq: u16, seq: u16) -> Option<SrtpIndex> {
    let guessed = estimate_roc(roc, last_seq, seq);
    u32::try_from(guessed)
        .ok()
        .map(|guessed_roc| SrtpIndex::new(guessed_roc, seq))
}
