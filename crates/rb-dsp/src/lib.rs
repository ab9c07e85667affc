//! Resonant filter bank engine for resobank.
//!
//! Six independently tunable two-pole bandpass voices running at a fixed
//! 96 kHz internal rate, processed one fixed-size block at a time under one
//! of three filter algorithms. Host-rate bridging lives in `rb-audio`; knob
//! scaling, modulation, envelopes, and persistence are the caller's problem
//! and arrive here as plain per-channel value arrays.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod block;
mod filter;
mod history;
mod noise;
mod scales;
mod tables;

pub use block::{BlockIo, BlockParams};
pub use filter::{FilterBank, FilterType};
pub use noise::{NoiseBank, NoiseColor};
pub use scales::{ScalePreset, ScaleSet};

/// Number of filter voices.
pub const NUM_CHANNELS: usize = 6;

/// Discrete notes per scale.
pub const NUM_FILTS: usize = 20;

/// Scales per bank.
pub const NUM_SCALES: usize = 11;

/// Coefficient slots per scale: one per note plus a guard note above the
/// top, so interpolated mode can always read the "next note" entry.
pub const NUM_SCALENOTES: usize = NUM_FILTS + 1;

/// Flat length of one bank's max-Q table (and of the user scale array).
pub const NUM_BANKNOTES: usize = NUM_SCALES * NUM_SCALENOTES;

/// Number of selectable scale banks. The last one is user-editable.
pub const NUM_SCALEBANKS: usize = 20;

/// Index of the user-editable bank.
pub const USER_BANK: usize = NUM_SCALEBANKS - 1;

/// Samples per internal processing block.
pub const BLOCK_SIZE: usize = 32;

/// Fixed internal processing rate in Hz.
pub const INTERNAL_RATE: u32 = 96_000;

/// Upper rail of the 12-bit internal sample domain.
pub const MAX_12BIT: i32 = 2047;

/// Lower rail of the 12-bit internal sample domain.
pub const MIN_12BIT: i32 = -2048;

/// Input samples at or above this level raise the overload flag.
pub const INPUT_CLIP_LEVEL: i32 = 2047;

/// Reference level for the normalized per-channel meter output.
pub const CLIP_LEVEL: f32 = 2047.0;

/// Hard ceiling on the derived frequency coefficient, ~2π·20 kHz / 96 kHz.
/// Keeps the recursion stable under extreme tuning/modulation input.
pub const FREQ_COEF_MAX: f32 = 1.308_995_8;
