//! Q-control lookup tables.
//!
//! All three filter algorithms map the raw 0–4095 Q control through
//! precomputed curves rather than evaluating exponentials per block. The
//! tables are generated once at construction.

use alloc::vec::Vec;

use crate::INTERNAL_RATE;

/// Entries in the decay and blend tables (matches the Q control domain).
pub const Q_TABLE_LEN: usize = 4096;

/// Q control is divided by this before the decay lookup.
const Q_INDEX_SCALE: f32 = 1.4;

/// Offset added to the scaled Q control before the decay lookup, so the
/// addressed index range is 200..=3125.
const Q_INDEX_OFFSET: usize = 200;

/// Decay range spanned by the addressed part of the decay table, in
/// seconds. The pole-radius coefficient is `c0 = 1 - 2/(decay * rate)`.
const DECAY_MIN_S: f32 = 0.01;
const DECAY_MAX_S: f32 = 4.0;

/// Entries in the two-pass gain calibration table.
pub const TWOPASS_CAL_LEN: usize = 3380;

/// The second-pass Q value is shifted down by this before indexing the
/// calibration table.
const TWOPASS_CAL_OFFSET: f32 = 900.0;

/// Numerator of the calibration lookup; the table stores this constant
/// divided by the second pass's compensation weight, rounded to u32.
const TWOPASS_GAIN: f32 = 33_554_432.0;

/// Generated lookup tables shared by the three filter algorithms.
pub struct Tables {
    /// Exponentially spaced decay values, decreasing in index. Addressed at
    /// `q / 1.4 + 200`; higher Q reads a smaller value, pushing the pole
    /// radius toward 1.
    q_decay: Vec<f32>,
    /// Logarithmic 0..1 curve blending the low-Q and high-Q coefficient
    /// anchors in interpolated mode.
    q_blend: Vec<f32>,
    /// Loudness compensation for the second pass of two-pass mode, indexed
    /// by `qval_b - 900`.
    twopass_cal: Vec<u32>,
}

impl Tables {
    pub fn new() -> Self {
        let mut q_decay = Vec::with_capacity(Q_TABLE_LEN);
        let addressed_span = (q_index(4095.0) - Q_INDEX_OFFSET) as f32;
        for i in 0..Q_TABLE_LEN {
            let t = (i as f32 - Q_INDEX_OFFSET as f32) / addressed_span;
            let decay = DECAY_MIN_S * libm::powf(DECAY_MAX_S / DECAY_MIN_S, t);
            // 10/(decay * rate): twice 2/(decay * rate), pre-scaled for the
            // caller's divide by 10/freq_scale.
            q_decay.push(10.0 / (decay * INTERNAL_RATE as f32));
        }

        let norm = libm::logf(Q_TABLE_LEN as f32);
        let mut q_blend = Vec::with_capacity(Q_TABLE_LEN);
        for i in 0..Q_TABLE_LEN {
            q_blend.push(libm::logf(1.0 + i as f32) / norm);
        }

        // Second-pass resonant gain grows as 1/(1 - c0); the stored value
        // keeps TWOPASS_GAIN / cal equal to that gain normalized to 1.0 at
        // the crossfade entry point (qval_b = 1000).
        let entry_decay = q_decay[q_index(1000.0)];
        let mut twopass_cal = Vec::with_capacity(TWOPASS_CAL_LEN);
        for i in 0..TWOPASS_CAL_LEN {
            let qval_b = i as f32 + TWOPASS_CAL_OFFSET;
            let comp = q_decay[q_index(qval_b)] / entry_decay;
            twopass_cal.push(libm::roundf(TWOPASS_GAIN / comp) as u32);
        }

        Self {
            q_decay,
            q_blend,
            twopass_cal,
        }
    }

    /// Pole-decay coefficient c0 for a Q control value:
    /// `c0 = 1 - 2/(decay * samplerate)`, decay 0.01–4.0 s across the knob.
    #[inline]
    pub fn decay_coef(&self, qval: f32, freq_scale: f32) -> f32 {
        1.0 - self.q_decay[q_index(qval)] / (10.0 / freq_scale)
    }

    /// Low/high anchor blend position for interpolated mode, snapping to
    /// pure high-Q near the top of the control.
    #[inline]
    pub fn blend_pos(&self, qval: f32) -> f32 {
        if qval > 4065.0 {
            1.0
        } else {
            self.q_blend[(qval as usize).min(Q_TABLE_LEN - 1)]
        }
    }

    /// Second-pass crossfade compensation for a shifted second-pass Q.
    #[inline]
    pub fn twopass_comp(&self, qval_b: f32) -> f32 {
        let idx = ((qval_b - TWOPASS_CAL_OFFSET) as usize).min(TWOPASS_CAL_LEN - 1);
        TWOPASS_GAIN / self.twopass_cal[idx] as f32
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

/// Decay table index for a Q control value.
#[inline]
fn q_index(qval: f32) -> usize {
    ((qval / Q_INDEX_SCALE) as usize + Q_INDEX_OFFSET).min(Q_TABLE_LEN - 1)
}
