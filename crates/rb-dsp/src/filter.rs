//! The filter bank: scale-bank resolution, the three filter algorithms,
//! and the block finalizer.
//!
//! Everything runs block-synchronously: one call to
//! [`FilterBank::process_block`] consumes one internal block of input and
//! produces one block of output plus the per-block scalar outputs. Algorithm
//! selection is block-granular — a pending change takes effect at the top of
//! the next call, never mid-block.

use alloc::vec::Vec;

use crate::block::{BlockIo, BlockParams};
use crate::history::HistoryArena;
use crate::scales::ScaleSet;
use crate::tables::Tables;
use crate::{
    BLOCK_SIZE, CLIP_LEVEL, FREQ_COEF_MAX, INPUT_CLIP_LEVEL, NUM_CHANNELS, NUM_FILTS,
    NUM_SCALEBANKS, NUM_SCALENOTES, NUM_SCALES, USER_BANK,
};

/// Center of the two-pass crossfade region on the Q control.
const CROSSFADE_POINT: f32 = 2730.0;
const CROSSFADE_WIDTH: f32 = 1800.0;
const CROSSFADE_MIN: f32 = CROSSFADE_POINT - CROSSFADE_WIDTH / 2.0;
const CROSSFADE_MAX: f32 = CROSSFADE_POINT + CROSSFADE_WIDTH / 2.0;

/// The three filter algorithms.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterType {
    /// Two cascaded sections crossfaded by the Q control. Widest usable Q
    /// range.
    #[default]
    TwoPass,
    /// One section per voice at the full Q mapping.
    OnePass,
    /// Continuously tuned resonator interpolating between adjacent notes
    /// and between low/high-Q coefficient anchors.
    Bpre,
}

/// Six-voice resonant filter bank.
pub struct FilterBank {
    scales: ScaleSet,
    tables: Tables,
    /// User-editable max-Q table occupying the last bank slot.
    user_bank: Vec<f32>,

    note: [usize; NUM_CHANNELS],
    scale: [usize; NUM_CHANNELS],
    scale_bank: [usize; NUM_CHANNELS],
    /// Shadow of `scale_bank` as of the last resolved block; a mismatch
    /// triggers history invalidation.
    old_scale_bank: [usize; NUM_CHANNELS],

    /// First-section history (two-pass mode only).
    hist_a: HistoryArena,
    /// Second-section history; the only section in one-pass and bpre modes.
    hist_b: HistoryArena,

    filter_type: FilterType,
    requested_type: FilterType,
    type_changed: bool,
    user_scale_changed: bool,
}

impl FilterBank {
    pub fn new(scales: ScaleSet) -> Self {
        debug_assert_eq!(scales.presets.len(), NUM_SCALEBANKS);
        let user_bank = scales.presets[USER_BANK].maxq_table().to_vec();
        Self {
            scales,
            tables: Tables::new(),
            user_bank,
            // Spread the voices across the scale by default.
            note: [0, 3, 6, 9, 12, 15],
            scale: [0; NUM_CHANNELS],
            scale_bank: [0; NUM_CHANNELS],
            old_scale_bank: [usize::MAX; NUM_CHANNELS],
            hist_a: HistoryArena::new(),
            hist_b: HistoryArena::new(),
            filter_type: FilterType::default(),
            requested_type: FilterType::default(),
            type_changed: false,
            user_scale_changed: false,
        }
    }

    pub fn with_default_catalog() -> Self {
        Self::new(ScaleSet::default())
    }

    /// Select a channel's note and scale. Out-of-range values are clamped
    /// at the next block.
    pub fn set_voice(&mut self, channel: usize, note: usize, scale: usize) {
        self.note[channel] = note;
        self.scale[channel] = scale;
    }

    /// Select a single channel's bank directly.
    pub fn set_bank(&mut self, channel: usize, bank: usize) {
        self.scale_bank[channel] = bank;
    }

    /// Bank-change event: retarget every unlocked channel to `bank`.
    /// Locked channels keep their current bank.
    pub fn change_bank(&mut self, bank: usize, locks: &[bool; NUM_CHANNELS]) {
        for ch in 0..NUM_CHANNELS {
            if !locks[ch] {
                self.scale_bank[ch] = bank;
            }
        }
    }

    /// Replace the user-editable bank's coefficients. Takes effect (and
    /// invalidates all history) at the next block.
    pub fn set_user_scale(&mut self, coefs: &[f32]) {
        debug_assert_eq!(coefs.len(), self.user_bank.len());
        self.user_bank.copy_from_slice(coefs);
        self.user_scale_changed = true;
    }

    /// Reset the user bank to the catalog's shipped default.
    pub fn default_user_scale(&mut self) {
        self.user_bank
            .copy_from_slice(self.scales.presets[USER_BANK].maxq_table());
        self.user_scale_changed = true;
    }

    /// Request an algorithm change; applied at the top of the next block.
    pub fn request_filter_type(&mut self, new_type: FilterType) {
        if self.requested_type != new_type {
            self.requested_type = new_type;
            self.type_changed = true;
        }
    }

    /// The active (not pending) algorithm.
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    pub fn note(&self, channel: usize) -> usize {
        self.note[channel]
    }

    pub fn scale(&self, channel: usize) -> usize {
        self.scale[channel]
    }

    pub fn bank(&self, channel: usize) -> usize {
        self.scale_bank[channel]
    }

    /// Process one internal block: resolve banks, run the active algorithm,
    /// blend morphs, level, and derive the scalar outputs.
    pub fn process_block(&mut self, io: &mut BlockIo, params: &BlockParams) {
        if self.type_changed {
            self.filter_type = self.requested_type;
        }
        self.resolve_scale_banks();

        // Lanes 0-5: source-note output. Lanes 6-11: morph destination,
        // only computed for channels with a nonzero morph position.
        let mut out = [[0.0f32; BLOCK_SIZE]; NUM_CHANNELS * 2];
        match self.filter_type {
            FilterType::TwoPass => self.filter_twopass(io, params, &mut out),
            FilterType::OnePass => self.filter_onepass(io, params, &mut out),
            FilterType::Bpre => self.filter_bpre(io, params, &mut out),
        }

        finalize_block(io, params, &out);

        self.type_changed = false;
        self.user_scale_changed = false;
    }

    /// Clamp indices into range and zero any history invalidated by a bank
    /// change, an algorithm change, or a user-scale update. Must run before
    /// the first sample of the block.
    fn resolve_scale_banks(&mut self) {
        for ch in 0..NUM_CHANNELS {
            if self.scale_bank[ch] >= NUM_SCALEBANKS {
                self.scale_bank[ch] = NUM_SCALEBANKS - 1;
            }
            if self.scale[ch] >= NUM_SCALES {
                self.scale[ch] = NUM_SCALES - 1;
            }
            if self.note[ch] >= NUM_FILTS {
                self.note[ch] = NUM_FILTS - 1;
            }

            if self.scale_bank[ch] != self.old_scale_bank[ch]
                || self.type_changed
                || self.user_scale_changed
            {
                self.old_scale_bank[ch] = self.scale_bank[ch];
                self.hist_a.zero_channel(ch);
                self.hist_b.zero_channel(ch);
            }
        }
    }

    /// Frequency coefficient for a (channel, scale, note), scaled by the
    /// channel's tuning nudge/shift and the global factor, hard-limited at
    /// the 20 kHz ceiling.
    fn freq_coef(&self, ch: usize, scale: usize, note: usize, params: &BlockParams) -> f32 {
        let base = if self.scale_bank[ch] == USER_BANK {
            self.user_bank[scale * NUM_SCALENOTES + note]
        } else {
            self.scales.presets[self.scale_bank[ch]].maxq(scale, note)
        };
        let c1 = base * params.freq_nudge[ch] * params.freq_shift[ch] * params.freq_scale;
        c1.min(FREQ_COEF_MAX)
    }

    fn filter_twopass(
        &mut self,
        io: &mut BlockIo,
        params: &BlockParams,
        out: &mut [[f32; BLOCK_SIZE]; NUM_CHANNELS * 2],
    ) {
        let mut clipped = false;

        for ch in 0..NUM_CHANNELS {
            let note = self.note[ch];
            let scale = self.scale[ch];
            let qc = params.q[ch].clamp(0.0, 4095.0);

            // First section reaches its max Q at noon on the control.
            let qval_a = (qc * 2.0).min(4095.0);
            // Second section's Q is held down until the top of the range.
            let qval_b = if qc < 3900.0 {
                1000.0
            } else {
                1000.0 + (qc - 3900.0) * 15.0
            };

            let c0_a = self.tables.decay_coef(qval_a, params.freq_scale);
            let c0_b = self.tables.decay_coef(qval_b, params.freq_scale);

            let ratio_a = crossfade_ratio(qc);
            // Second-section weight, compensated against its resonant gain.
            let ratio_b = (1.0 - ratio_a) * self.tables.twopass_comp(qval_b);

            let c1 = self.freq_coef(ch, scale, note, params);
            let c2_a = 0.003 * c1 - 0.1 * c0_a + 0.102;
            let c2_b = (0.003 * c1 - 0.1 * c0_b + 0.102) * ratio_b;

            io.voct[ch] = c1;

            let input = io.input[ch];
            {
                let ha = self.hist_a.tap(ch, scale, note);
                let hb = self.hist_b.tap(ch, scale, note);
                for i in 0..BLOCK_SIZE {
                    let x = input[i];
                    if x >= INPUT_CLIP_LEVEL {
                        clipped = true;
                    }
                    let a_out = two_pole_step(ha, c0_a, c1, c2_a, x as f32);
                    let b_out = two_pole_step(hb, c0_b, c1, c2_b, a_out);
                    // Second section inverted to avoid phase cancellation.
                    out[ch][i] = ratio_a * a_out - b_out;
                }
            }

            if params.morph[ch] > 0.0 {
                let dnote = params.morph_note[ch].min(NUM_FILTS - 1);
                let dscale = params.morph_scale[ch].min(NUM_SCALES - 1);
                let c1 = self.freq_coef(ch, dscale, dnote, params);
                let c2_a = 0.003 * c1 - 0.1 * c0_a + 0.102;
                let c2_b = (0.003 * c1 - 0.1 * c0_b + 0.102) * ratio_b;

                let ha = self.hist_a.tap(ch, dscale, dnote);
                let hb = self.hist_b.tap(ch, dscale, dnote);
                for i in 0..BLOCK_SIZE {
                    let a_out = two_pole_step(ha, c0_a, c1, c2_a, input[i] as f32);
                    let b_out = two_pole_step(hb, c0_b, c1, c2_b, a_out);
                    out[ch + NUM_CHANNELS][i] = ratio_a * a_out - b_out;
                }

                io.voct[ch] = glide_voct(io.voct[ch], c1, params.morph[ch], params.glide);
            }
        }

        io.input_clip = clipped;
    }

    fn filter_onepass(
        &mut self,
        io: &mut BlockIo,
        params: &BlockParams,
        out: &mut [[f32; BLOCK_SIZE]; NUM_CHANNELS * 2],
    ) {
        let mut clipped = false;
        let mut destvoct = [0.0f32; NUM_CHANNELS];

        for j in 0..NUM_CHANNELS * 2 {
            let ch = j % NUM_CHANNELS;
            if j >= NUM_CHANNELS && params.morph[ch] == 0.0 {
                continue;
            }
            let (note, scale) = if j < NUM_CHANNELS {
                (self.note[ch], self.scale[ch])
            } else {
                (
                    params.morph_note[ch].min(NUM_FILTS - 1),
                    params.morph_scale[ch].min(NUM_SCALES - 1),
                )
            };

            let qval = params.q[ch].clamp(0.0, 4095.0);
            let c0 = self.tables.decay_coef(qval, params.freq_scale);
            let c1 = self.freq_coef(ch, scale, note, params);

            if j < NUM_CHANNELS {
                io.voct[ch] = c1;
            } else {
                destvoct[ch] = c1;
            }

            // Boost high frequencies and low resonance.
            let mut c2 = 0.003 * c1 - 0.1 * c0 + 0.102;
            c2 *= (4096.0 - qval) / 1024.0 + 1.04;

            let input = io.input[ch];
            let h = self.hist_b.tap(ch, scale, note);
            for i in 0..BLOCK_SIZE {
                let x = input[i];
                if x >= INPUT_CLIP_LEVEL {
                    clipped = true;
                }
                out[j][i] = two_pole_step(h, c0, c1, c2, x as f32);
            }

            if j >= NUM_CHANNELS {
                io.voct[ch] = glide_voct(io.voct[ch], destvoct[ch], params.morph[ch], params.glide);
            }
        }

        io.input_clip = clipped;
    }

    fn filter_bpre(
        &mut self,
        io: &mut BlockIo,
        params: &BlockParams,
        out: &mut [[f32; BLOCK_SIZE]; NUM_CHANNELS * 2],
    ) {
        let mut clipped = false;
        let mut destvoct = [0.0f32; NUM_CHANNELS];

        for j in 0..NUM_CHANNELS * 2 {
            let ch = j % NUM_CHANNELS;
            if j >= NUM_CHANNELS && params.morph[ch] == 0.0 {
                continue;
            }
            let (note, scale) = if j < NUM_CHANNELS {
                (self.note[ch], self.scale[ch])
            } else {
                (
                    params.morph_note[ch].min(NUM_FILTS - 1),
                    params.morph_scale[ch].min(NUM_SCALES - 1),
                )
            };

            // Interpolated mode always reads the catalog preset; the user
            // bank carries only a max-Q table.
            let preset = &self.scales.presets[self.scale_bank[ch]];

            // Nudge position toward the next note, snapped at the rails.
            let mut pos = params.freq_nudge[ch].clamp(0.0, 1.0);
            if pos < 0.002 {
                pos = 0.0;
            } else if pos > 0.998 {
                pos = 1.0;
            }
            let next = (note + 1).min(NUM_SCALENOTES - 1);

            // Pitch reference comes from the tuning table; no exact tracking
            // of the interpolated center frequency.
            let tuning = preset.maxq(scale, note);
            if j < NUM_CHANNELS {
                io.voct[ch] = tuning;
            } else {
                destvoct[ch] = tuning;
            }

            let lo = blend_triple(preset.bpre_lo(scale, note), preset.bpre_lo(scale, next), pos);
            let hi = blend_triple(preset.bpre_hi(scale, note), preset.bpre_hi(scale, next), pos);

            let wq = self.tables.blend_pos(params.q[ch].clamp(0.0, 4095.0));
            let inv_wq = 1.0 - wq;
            let c0 = hi[0] * wq + lo[0] * inv_wq;
            let c1 = hi[1] * wq + lo[1] * inv_wq;
            let c2 = hi[2] * wq + lo[2] * inv_wq;

            let input = io.input[ch];
            let h = self.hist_b.tap(ch, scale, note);
            for i in 0..BLOCK_SIZE {
                let tmp = h[0];
                h[0] = h[1];

                let x = input[i];
                if x >= INPUT_CLIP_LEVEL {
                    clipped = true;
                }

                let mut iir = x as f32 * c0;
                iir -= c1 * tmp;
                let mut fir = -tmp;
                iir -= c2 * h[0];
                fir += iir;
                h[1] = iir;

                out[j][i] = fir;
            }

            if j >= NUM_CHANNELS {
                io.voct[ch] = glide_voct(io.voct[ch], destvoct[ch], params.morph[ch], params.glide);
            }
        }

        io.input_clip = clipped;
    }
}

/// One step of the two-pole recursion shared by the discrete-note modes.
#[inline]
fn two_pole_step(h: &mut [f32; 3], c0: f32, c1: f32, c2: f32, x: f32) -> f32 {
    h[2] = (c0 * h[1] + c1 * h[0]) - c2 * x;
    h[0] -= c1 * h[2];
    h[1] = h[2];
    h[1]
}

/// Crossfade weight of the first two-pass section: 1 below the region,
/// 0 above it, linear in between.
fn crossfade_ratio(qc: f32) -> f32 {
    if qc < CROSSFADE_MIN {
        1.0
    } else if qc > CROSSFADE_MAX {
        0.0
    } else {
        1.0 - (qc - CROSSFADE_MIN) / CROSSFADE_WIDTH
    }
}

/// Pitch CV across a morph: interpolated when glide is on, snapped to the
/// source otherwise.
fn glide_voct(src: f32, dest: f32, morph: f32, glide: bool) -> f32 {
    if glide {
        src * (1.0 - morph) + dest * morph
    } else {
        src
    }
}

/// Per-component blend of two resonator triples.
fn blend_triple(cur: [f32; 3], next: [f32; 3], pos: f32) -> [f32; 3] {
    let inv = 1.0 - pos;
    [
        next[0] * pos + cur[0] * inv,
        next[1] * pos + cur[1] * inv,
        next[2] * pos + cur[2] * inv,
    ]
}

/// Blend source and morph-destination outputs, apply channel level, and
/// derive the envelope and meter taps.
fn finalize_block(
    io: &mut BlockIo,
    params: &BlockParams,
    out: &[[f32; BLOCK_SIZE]; NUM_CHANNELS * 2],
) {
    for i in 0..BLOCK_SIZE {
        for ch in 0..NUM_CHANNELS {
            let m = params.morph[ch];
            let blended = if m == 0.0 {
                out[ch][i]
            } else {
                out[ch][i] * (1.0 - m) + out[ch + NUM_CHANNELS][i] * m
            };
            io.output[ch][i] = blended * params.channel_level[ch];
        }
    }

    for ch in 0..NUM_CHANNELS {
        let m = params.morph[ch];
        let blended = out[ch][0] * (1.0 - m) + out[ch + NUM_CHANNELS][0] * m;
        io.level[ch] = blended * params.channel_level[ch] / CLIP_LEVEL;
        // The envelope input ignores channel level.
        io.env_in[ch] = libm::fabsf(blended);
    }
}
