//! Per-voice filter history.
//!
//! Each (channel, scale, note) combination owns a three-element recursive
//! state vector — the filter's feedback memory. The grid is a flat arena
//! indexed by composite key, so zero-on-invalidate is a contiguous fill and
//! sample access is O(1).

use alloc::vec;
use alloc::vec::Vec;

use crate::{NUM_CHANNELS, NUM_FILTS, NUM_SCALES};

const CHANNEL_STRIDE: usize = NUM_SCALES * NUM_FILTS;

/// One pass's history grid: `channel × scale × note → [f32; 3]`.
#[derive(Clone, Debug)]
pub struct HistoryArena {
    state: Vec<[f32; 3]>,
}

impl HistoryArena {
    pub fn new() -> Self {
        Self {
            state: vec![[0.0; 3]; NUM_CHANNELS * CHANNEL_STRIDE],
        }
    }

    /// Mutable state vector for one (channel, scale, note).
    #[inline]
    pub fn tap(&mut self, channel: usize, scale: usize, note: usize) -> &mut [f32; 3] {
        &mut self.state[(channel * NUM_SCALES + scale) * NUM_FILTS + note]
    }

    /// Zero a channel's entire scale × note submatrix.
    pub fn zero_channel(&mut self, channel: usize) {
        let start = channel * CHANNEL_STRIDE;
        self.state[start..start + CHANNEL_STRIDE].fill([0.0; 3]);
    }

    #[cfg(test)]
    pub fn channel_is_silent(&self, channel: usize) -> bool {
        let start = channel * CHANNEL_STRIDE;
        self.state[start..start + CHANNEL_STRIDE]
            .iter()
            .all(|v| v.iter().all(|&x| x == 0.0))
    }
}

impl Default for HistoryArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_silent() {
        let h = HistoryArena::new();
        for ch in 0..NUM_CHANNELS {
            assert!(h.channel_is_silent(ch));
        }
    }

    #[test]
    fn taps_are_distinct_per_key() {
        let mut h = HistoryArena::new();
        h.tap(1, 2, 3)[0] = 1.0;
        h.tap(1, 2, 4)[0] = 2.0;
        h.tap(2, 2, 3)[0] = 3.0;
        assert_eq!(h.tap(1, 2, 3)[0], 1.0);
        assert_eq!(h.tap(1, 2, 4)[0], 2.0);
        assert_eq!(h.tap(2, 2, 3)[0], 3.0);
    }

    #[test]
    fn zero_channel_clears_only_that_channel() {
        let mut h = HistoryArena::new();
        h.tap(0, 10, 19)[2] = 5.0;
        h.tap(3, 0, 0)[1] = 7.0;
        h.zero_channel(3);
        assert!(h.channel_is_silent(3));
        assert!(!h.channel_is_silent(0));
    }
}
