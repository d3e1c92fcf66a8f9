//! Replay Window
//!
//! Sliding 64-entry bitmask anchored at the highest accepted index. Bit `k`
//! records whether the index `highest - k` has been accepted. Callers pass
//! the signed distance of a candidate index from the highest one.

use thiserror::Error;

/// Number of indices tracked behind the highest accepted one
pub const REPLAY_WINDOW_SIZE: u64 = 64;

/// Replay check failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayError {
    #[error("Index already received")]
    Duplicate,

    #[error("Index behind the replay window")]
    TooOld,
}

/// 64-bit replay bitmask
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayWindow {
    bitmap: u64,
}

impl ReplayWindow {
    pub fn new() -> Self {
        ReplayWindow { bitmap: 0 }
    }

    /// Check a candidate at signed distance `delta` from the highest index
    pub fn check(&self, delta: i64) -> Result<(), ReplayError> {
        if delta > 0 {
            return Ok(());
        }

        let behind = delta.unsigned_abs();
        if behind >= REPLAY_WINDOW_SIZE {
            return Err(ReplayError::TooOld);
        }
        if (self.bitmap >> behind) & 1 != 0 {
            return Err(ReplayError::Duplicate);
        }
        Ok(())
    }

    /// Mark the index at distance `delta` as received
    ///
    /// A positive delta advances the window so the new index becomes the
    /// highest one.
    pub fn update(&mut self, delta: i64) {
        if delta > 0 {
            let shift = delta as u64;
            self.bitmap = if shift >= REPLAY_WINDOW_SIZE {
                0
            } else {
                self.bitmap << shift
            };
            self.bitmap |= 1;
        } else {
            let behind = delta.unsigned_abs();
            if behind < REPLAY_WINDOW_SIZE {
                self.bitmap |= 1 << behind;
            }
        }
    }

    /// Whether the index at `behind` positions from the highest has been seen
    pub fn contains(&self, behind: u64) -> bool {
        behind < REPLAY_WINDOW_SIZE && (self.bitmap >> behind) & 1 != 0
    }

    pub fn bitmap(&self) -> u64 {
        self.bitmap
    }
}
