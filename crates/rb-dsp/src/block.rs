//! Internal block I/O and per-block modulation values.

use crate::{BLOCK_SIZE, NUM_CHANNELS};

/// One internal block's worth of engine I/O.
///
/// `input` is in the 12-bit fixed-point domain; `output` is the raw filter
/// sum before host scaling. The scalar outputs are consumed by external
/// collaborators (envelope follower, pitch CV, metering).
#[derive(Clone, Debug)]
pub struct BlockIo {
    pub input: [[i32; BLOCK_SIZE]; NUM_CHANNELS],
    pub output: [[f32; BLOCK_SIZE]; NUM_CHANNELS],
    /// Per-channel pitch (v/oct) value: the effective frequency coefficient.
    pub voct: [f32; NUM_CHANNELS],
    /// Rectified pre-level sample feeding the envelope follower.
    pub env_in: [f32; NUM_CHANNELS],
    /// Post-level sample normalized against the clip reference, for meters.
    pub level: [f32; NUM_CHANNELS],
    /// Raised while any input sample reaches the overload threshold.
    pub input_clip: bool,
}

impl BlockIo {
    pub fn new() -> Self {
        Self {
            input: [[0; BLOCK_SIZE]; NUM_CHANNELS],
            output: [[0.0; BLOCK_SIZE]; NUM_CHANNELS],
            voct: [0.0; NUM_CHANNELS],
            env_in: [0.0; NUM_CHANNELS],
            level: [0.0; NUM_CHANNELS],
            input_clip: false,
        }
    }
}

impl Default for BlockIo {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-channel modulation scalars supplied by the external orchestrator,
/// valid for one block.
#[derive(Clone, Debug)]
pub struct BlockParams {
    /// Q control, 0–4095.
    pub q: [f32; NUM_CHANNELS],
    /// Tuning nudge. Discrete-note modes treat it as a frequency multiplier;
    /// interpolated mode as a 0–1 position toward the next note.
    pub freq_nudge: [f32; NUM_CHANNELS],
    /// Tuning shift multiplier (transpose).
    pub freq_shift: [f32; NUM_CHANNELS],
    /// Morph position, 0 (source note) to 1 (destination note).
    pub morph: [f32; NUM_CHANNELS],
    /// Morph destination note per channel.
    pub morph_note: [usize; NUM_CHANNELS],
    /// Morph destination scale per channel.
    pub morph_scale: [usize; NUM_CHANNELS],
    /// Output level per channel, 0–1.
    pub channel_level: [f32; NUM_CHANNELS],
    /// Global frequency-scale factor.
    pub freq_scale: f32,
    /// Interpolate pitch CV across a morph instead of snapping.
    pub glide: bool,
}

impl Default for BlockParams {
    fn default() -> Self {
        Self {
            q: [2048.0; NUM_CHANNELS],
            freq_nudge: [1.0; NUM_CHANNELS],
            freq_shift: [1.0; NUM_CHANNELS],
            morph: [0.0; NUM_CHANNELS],
            morph_note: [0; NUM_CHANNELS],
            morph_scale: [0; NUM_CHANNELS],
            channel_level: [1.0; NUM_CHANNELS],
            freq_scale: 1.0,
            glide: false,
        }
    }
}
