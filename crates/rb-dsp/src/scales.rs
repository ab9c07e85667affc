//! Scale-bank coefficient catalog.
//!
//! A bank holds, for every scale × note slot, the frequency coefficient used
//! by the discrete-note algorithms (`c_maxq`) and a pair of resonator
//! triples anchoring interpolated mode at low and high resonance
//! (`c_bpre_lo` / `c_bpre_hi`). Tables are flat with explicit strides:
//! `NUM_SCALENOTES` slots per scale, the last being a guard note above the
//! top so "next note" reads never leave the scale.
//!
//! The catalog is plain data. The default below is generated from named
//! tuning systems; a host may supply any catalog of the same shape.

use alloc::vec::Vec;
use arrayvec::ArrayString;
use core::f32::consts::TAU;

use crate::{FREQ_COEF_MAX, INTERNAL_RATE, NUM_BANKNOTES, NUM_SCALEBANKS, NUM_SCALENOTES, NUM_SCALES};

/// Pole radius of the low-Q interpolated-mode anchor.
const BPRE_RADIUS_LO: f32 = 0.986;

/// Pole radius of the high-Q interpolated-mode anchor.
const BPRE_RADIUS_HI: f32 = 0.999;

/// Root of the lowest scale in the generated catalog (C2).
const ROOT_HZ: f32 = 65.406;

/// One scale bank: tuning preset for all 11 scales × 21 note slots.
#[derive(Clone, Debug)]
pub struct ScalePreset {
    pub name: ArrayString<24>,
    /// Frequency coefficient `2π·f / 96000` per (scale, note).
    c_maxq: Vec<f32>,
    /// Low-Q resonator triples `(gain, r², −2r·cos ω)` per (scale, note).
    c_bpre_lo: Vec<[f32; 3]>,
    /// High-Q resonator triples per (scale, note).
    c_bpre_hi: Vec<[f32; 3]>,
}

impl ScalePreset {
    /// Build a preset from per-slot frequencies in Hz
    /// (`NUM_BANKNOTES` entries, scale-major order).
    pub fn from_freqs(name: &str, freqs: &[f32]) -> Self {
        debug_assert_eq!(freqs.len(), NUM_BANKNOTES);
        let mut c_maxq = Vec::with_capacity(NUM_BANKNOTES);
        let mut c_bpre_lo = Vec::with_capacity(NUM_BANKNOTES);
        let mut c_bpre_hi = Vec::with_capacity(NUM_BANKNOTES);
        for &f in freqs {
            let omega = (TAU * f / INTERNAL_RATE as f32).min(FREQ_COEF_MAX);
            c_maxq.push(omega);
            c_bpre_lo.push(resonator_triple(omega, BPRE_RADIUS_LO));
            c_bpre_hi.push(resonator_triple(omega, BPRE_RADIUS_HI));
        }
        Self {
            name: ArrayString::from(name).unwrap_or_default(),
            c_maxq,
            c_bpre_lo,
            c_bpre_hi,
        }
    }

    /// Frequency coefficient for a (scale, note) slot.
    #[inline]
    pub fn maxq(&self, scale: usize, note: usize) -> f32 {
        self.c_maxq[scale * NUM_SCALENOTES + note]
    }

    /// Raw max-Q table, scale-major.
    pub fn maxq_table(&self) -> &[f32] {
        &self.c_maxq
    }

    /// Low-Q anchor triple for a (scale, note) slot.
    #[inline]
    pub fn bpre_lo(&self, scale: usize, note: usize) -> [f32; 3] {
        self.c_bpre_lo[scale * NUM_SCALENOTES + note]
    }

    /// High-Q anchor triple for a (scale, note) slot.
    #[inline]
    pub fn bpre_hi(&self, scale: usize, note: usize) -> [f32; 3] {
        self.c_bpre_hi[scale * NUM_SCALENOTES + note]
    }
}

/// Resonator triple for the interpolated-mode recurrence
/// `y[n] = g·x[n] − r²·y[n-2] + 2r·cos ω·y[n-1]`.
fn resonator_triple(omega: f32, r: f32) -> [f32; 3] {
    [(1.0 - r), r * r, -2.0 * r * libm::cosf(omega)]
}

/// The full catalog of selectable banks.
#[derive(Clone, Debug)]
pub struct ScaleSet {
    pub presets: Vec<ScalePreset>,
}

impl ScaleSet {
    /// Generated default catalog: 19 tuning systems plus the default data
    /// for the user-editable bank.
    pub fn generated() -> Self {
        let mut presets: Vec<ScalePreset> = BANKS
            .iter()
            .map(|(name, gen)| ScalePreset::from_freqs(name, &gen.freqs()))
            .collect();
        // The user bank ships with a copy of the first preset's data until
        // the host supplies its own.
        let mut user = presets[0].clone();
        user.name = ArrayString::from("User").unwrap_or_default();
        presets.push(user);
        debug_assert_eq!(presets.len(), NUM_SCALEBANKS);
        Self { presets }
    }
}

impl Default for ScaleSet {
    fn default() -> Self {
        Self::generated()
    }
}

/// How a generated bank lays out its note frequencies.
enum Gen {
    /// Repeating semitone-step pattern (12-TET), e.g. a diatonic mode.
    Steps(&'static [u8]),
    /// Fixed interval list in cents, repeated at the octave.
    Cents(&'static [f32]),
    /// Equal division: every note the same number of cents up.
    EqualCents(f32),
    /// Harmonic series over the root.
    Harmonics,
}

impl Gen {
    /// Frequencies for all scales of a bank, scale-major. Scale `s` is the
    /// system rooted `s` semitones above `ROOT_HZ`.
    fn freqs(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(NUM_BANKNOTES);
        for scale in 0..NUM_SCALES {
            let root = ROOT_HZ * semitones(scale as f32);
            for note in 0..NUM_SCALENOTES {
                out.push(self.note_freq(root, note));
            }
        }
        out
    }

    fn note_freq(&self, root: f32, note: usize) -> f32 {
        match self {
            Gen::Steps(steps) => {
                let mut semis = 0u32;
                for i in 0..note {
                    semis += steps[i % steps.len()] as u32;
                }
                root * semitones(semis as f32)
            }
            Gen::Cents(intervals) => {
                let octave = (note / intervals.len()) as f32;
                let idx = note % intervals.len();
                root * libm::powf(2.0, octave + intervals[idx] / 1200.0)
            }
            Gen::EqualCents(step) => root * libm::powf(2.0, note as f32 * step / 1200.0),
            Gen::Harmonics => root * (note + 1) as f32,
        }
    }
}

/// Equal-tempered interval ratio `2^(semis/12)`.
fn semitones(semis: f32) -> f32 {
    libm::powf(2.0, semis / 12.0)
}

const BANKS: [(&str, Gen); NUM_SCALEBANKS - 1] = [
    ("Ionian", Gen::Steps(&[2, 2, 1, 2, 2, 2, 1])),
    ("Aeolian", Gen::Steps(&[2, 1, 2, 2, 1, 2, 2])),
    ("Dorian", Gen::Steps(&[2, 1, 2, 2, 2, 1, 2])),
    ("Phrygian", Gen::Steps(&[1, 2, 2, 2, 1, 2, 2])),
    ("Lydian", Gen::Steps(&[2, 2, 2, 1, 2, 2, 1])),
    ("Mixolydian", Gen::Steps(&[2, 2, 1, 2, 2, 1, 2])),
    ("Harmonic Minor", Gen::Steps(&[2, 1, 2, 2, 1, 3, 1])),
    ("Melodic Minor", Gen::Steps(&[2, 1, 2, 2, 2, 2, 1])),
    ("Major Pentatonic", Gen::Steps(&[2, 2, 3, 2, 3])),
    ("Minor Pentatonic", Gen::Steps(&[3, 2, 2, 3, 2])),
    ("Blues", Gen::Steps(&[3, 2, 1, 1, 3, 2])),
    ("Whole Tone", Gen::EqualCents(200.0)),
    ("Chromatic", Gen::EqualCents(100.0)),
    ("Quarter Tone", Gen::EqualCents(50.0)),
    ("Harmonic Series", Gen::Harmonics),
    (
        "Just Major",
        Gen::Cents(&[0.0, 203.9, 386.3, 498.0, 702.0, 884.4, 1088.3]),
    ),
    (
        "Pythagorean",
        Gen::Cents(&[0.0, 203.9, 407.8, 498.0, 702.0, 905.9, 1109.8]),
    ),
    (
        "Pelog",
        Gen::Cents(&[0.0, 137.0, 446.0, 575.0, 687.0, 820.0, 981.0]),
    ),
    ("Slendro", Gen::Cents(&[0.0, 240.0, 480.0, 720.0, 960.0])),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::USER_BANK;

    #[test]
    fn generated_catalog_has_all_banks() {
        let set = ScaleSet::generated();
        assert_eq!(set.presets.len(), NUM_SCALEBANKS);
        assert_eq!(set.presets[USER_BANK].name.as_str(), "User");
    }

    #[test]
    fn tables_have_full_stride() {
        let set = ScaleSet::generated();
        for p in &set.presets {
            assert_eq!(p.maxq_table().len(), NUM_BANKNOTES);
            assert_eq!(p.c_bpre_lo.len(), NUM_BANKNOTES);
            assert_eq!(p.c_bpre_hi.len(), NUM_BANKNOTES);
        }
    }

    #[test]
    fn freq_coefs_are_positive_and_clamped() {
        let set = ScaleSet::generated();
        for p in &set.presets {
            for &c in p.maxq_table() {
                assert!(c > 0.0 && c <= FREQ_COEF_MAX, "{} out of range", c);
            }
        }
    }

    #[test]
    fn notes_ascend_within_every_scale() {
        let set = ScaleSet::generated();
        for p in &set.presets {
            for scale in 0..NUM_SCALES {
                for note in 1..NUM_SCALENOTES {
                    let prev = p.maxq(scale, note - 1);
                    let cur = p.maxq(scale, note);
                    // Equal only when both hit the 20 kHz ceiling.
                    assert!(
                        cur > prev || cur == FREQ_COEF_MAX,
                        "{}: scale {} note {} not ascending",
                        p.name,
                        scale,
                        note
                    );
                }
            }
        }
    }

    #[test]
    fn guard_note_is_reachable() {
        let set = ScaleSet::generated();
        let p = &set.presets[0];
        // note + 1 at the top note must stay inside the scale's slots.
        let _ = p.maxq(NUM_SCALES - 1, NUM_SCALENOTES - 1);
        let _ = p.bpre_lo(NUM_SCALES - 1, NUM_SCALENOTES - 1);
    }

    #[test]
    fn resonator_triples_are_stable() {
        let set = ScaleSet::generated();
        for p in &set.presets {
            for t in p.c_bpre_lo.iter().chain(p.c_bpre_hi.iter()) {
                assert!(t[1] < 1.0, "pole radius² {} unstable", t[1]);
                assert!(t[2].abs() <= 2.0);
            }
        }
    }
}
