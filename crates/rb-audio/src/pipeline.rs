//! Host-rate to internal-rate bridging pipeline.
//!
//! Called once per host frame. Buffers host input per lane, runs the engine
//! in bursts of one internal block whenever the previous block's output has
//! fully drained, and emits one converted host frame per call. Never blocks:
//! full input FIFOs skip the push, empty output FIFOs yield silence for that
//! tick — host output therefore lags by up to one internal block.

use heapless::Deque;

use rb_dsp::{
    BlockIo, BlockParams, FilterBank, NoiseBank, NoiseColor, BLOCK_SIZE, INTERNAL_RATE, MAX_12BIT,
    MIN_12BIT, NUM_CHANNELS,
};

use crate::resampler::Resampler;

/// Host amplitude convention: ±5 V full scale.
pub const HOST_FULL_SCALE: f32 = 5.0;

/// Per-lane FIFO depth, host-rate frames.
const FIFO_CAP: usize = 256;

/// Host-facing output width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// All six channels summed into one.
    #[default]
    Mono,
    /// Even channels left, odd channels right.
    Stereo,
    /// One host channel per engine channel.
    Six,
}

impl OutputMode {
    /// Map a raw three-position selector; out-of-range falls back to mono.
    pub fn from_selector(value: u8) -> Self {
        match value {
            1 => OutputMode::Stereo,
            2 => OutputMode::Six,
            _ => OutputMode::Mono,
        }
    }

    pub fn channels(&self) -> usize {
        match self {
            OutputMode::Mono => 1,
            OutputMode::Stereo => 2,
            OutputMode::Six => 6,
        }
    }
}

/// The sample-rate-adapting I/O pipeline in front of a [`FilterBank`].
pub struct Pipeline {
    host_rate: f32,
    output_mode: OutputMode,
    noise: NoiseBank,
    noise_color: NoiseColor,

    in_fifo: [Deque<f32, FIFO_CAP>; NUM_CHANNELS],
    out_fifo: [Deque<f32, FIFO_CAP>; NUM_CHANNELS],
    in_src: [Resampler; NUM_CHANNELS],
    out_src: [Resampler; NUM_CHANNELS],

    io: BlockIo,
    blocks_processed: u64,
}

impl Pipeline {
    pub fn new(host_rate: f32) -> Self {
        Self {
            host_rate,
            output_mode: OutputMode::default(),
            noise: NoiseBank::new(),
            noise_color: NoiseColor::default(),
            in_fifo: core::array::from_fn(|_| Deque::new()),
            out_fifo: core::array::from_fn(|_| Deque::new()),
            in_src: core::array::from_fn(|_| Resampler::new()),
            out_src: core::array::from_fn(|_| Resampler::new()),
            io: BlockIo::new(),
            blocks_processed: 0,
        }
    }

    pub fn set_host_rate(&mut self, rate: f32) {
        self.host_rate = rate;
    }

    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn set_noise_color(&mut self, color: NoiseColor) {
        self.noise_color = color;
    }

    /// The most recent block's I/O, including the scalar outputs (pitch,
    /// envelope input, meter level, overload flag).
    pub fn io(&self) -> &BlockIo {
        &self.io
    }

    /// Internal blocks processed so far.
    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed
    }

    /// One host tick. `input` holds one sample per connected host channel
    /// (empty ⇒ disconnected ⇒ noise); `output` receives one sample per
    /// active output channel, in volts. Returns false when the output FIFO
    /// had nothing for this tick (silence emitted).
    pub fn process(
        &mut self,
        bank: &mut FilterBank,
        params: &BlockParams,
        input: &[f32],
        output: &mut [f32],
    ) -> bool {
        let in_lanes = match input.len() {
            0..=2 => 2,
            3 => 3,
            _ => 6,
        };

        // Buffer one host frame per active lane; full lanes skip (the FIFO
        // is never overrun).
        for lane in 0..in_lanes {
            if self.in_fifo[lane].is_full() {
                continue;
            }
            let v = if input.is_empty() {
                self.generate_noise() / HOST_FULL_SCALE
            } else if input.len() == 1 {
                input[0] / HOST_FULL_SCALE
            } else {
                input.get(lane).copied().unwrap_or(0.0) / HOST_FULL_SCALE
            };
            let _ = self.in_fifo[lane].push_back(v);
        }

        // Previous block fully drained ⇒ run the next one.
        if self.out_fifo[0].is_empty() {
            self.run_block(bank, params, in_lanes);
        }

        // Emit one frame per active output lane, silence on underrun.
        let out_lanes = self.output_mode.channels();
        output.fill(0.0);
        let ready = (0..out_lanes).all(|lane| !self.out_fifo[lane].is_empty());
        if ready {
            for (lane, slot) in output.iter_mut().enumerate().take(out_lanes) {
                if let Some(v) = self.out_fifo[lane].pop_front() {
                    *slot = v * HOST_FULL_SCALE;
                }
            }
        }
        ready
    }

    /// Noise in volts, selected color.
    fn generate_noise(&mut self) -> f32 {
        self.noise.next(self.noise_color) * 10.0 - 5.0
    }

    /// Convert buffered input up to the internal rate, run the engine for
    /// one block, and convert its output back into the host-rate FIFOs.
    fn run_block(&mut self, bank: &mut FilterBank, params: &BlockParams, in_lanes: usize) {
        let mut frame = [0.0f32; BLOCK_SIZE];
        for lane in 0..in_lanes {
            if self.in_fifo[lane].is_empty() {
                continue;
            }
            self.in_src[lane].set_rates(self.host_rate, INTERNAL_RATE as f32);
            self.in_src[lane].pull(&mut self.in_fifo[lane], &mut frame);

            for (i, &s) in frame.iter().enumerate() {
                let v = (s * MAX_12BIT as f32).clamp(MIN_12BIT as f32, MAX_12BIT as f32) as i32;
                match in_lanes {
                    // Two lanes mirror across the odd/even channel triples.
                    2 => {
                        self.io.input[lane][i] = v;
                        self.io.input[lane + 2][i] = v;
                        self.io.input[lane + 4][i] = v;
                    }
                    // Three lanes each drive one adjacent channel pair.
                    3 => {
                        self.io.input[2 * lane][i] = v;
                        self.io.input[2 * lane + 1][i] = v;
                    }
                    _ => {
                        self.io.input[lane][i] = v;
                    }
                }
            }
        }

        bank.process_block(&mut self.io, params);
        self.blocks_processed += 1;

        let mut accum = [[0.0f32; BLOCK_SIZE]; NUM_CHANNELS];
        for ch in 0..NUM_CHANNELS {
            for i in 0..BLOCK_SIZE {
                let v = self.io.output[ch][i] / MAX_12BIT as f32;
                match self.output_mode {
                    OutputMode::Mono => accum[0][i] += v,
                    OutputMode::Stereo => accum[ch % 2][i] += v,
                    // Assign, not sum.
                    OutputMode::Six => accum[ch][i] = v,
                }
            }
        }

        let out_lanes = self.output_mode.channels();
        for lane in 0..out_lanes {
            self.out_src[lane].set_rates(INTERNAL_RATE as f32, self.host_rate);
            self.out_src[lane].push(&accum[lane], &mut self.out_fifo[lane]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_ticks(
        pipeline: &mut Pipeline,
        bank: &mut FilterBank,
        params: &BlockParams,
        input: &[f32],
        ticks: usize,
    ) {
        let mut out = [0.0f32; 6];
        for _ in 0..ticks {
            pipeline.process(bank, params, input, &mut out);
        }
    }

    #[test]
    fn mono_input_broadcasts_to_all_channels() {
        let mut pipeline = Pipeline::new(96_000.0);
        let mut bank = FilterBank::with_default_catalog();
        let params = BlockParams::default();
        // DC long enough for several blocks.
        run_ticks(&mut pipeline, &mut bank, &params, &[2.5], 512);

        let io = pipeline.io();
        for ch in 1..NUM_CHANNELS {
            assert_eq!(
                io.input[0], io.input[ch],
                "channel {} differs from channel 0",
                ch
            );
        }
        // 2.5 V -> half scale in the 12-bit domain.
        let mid = io.input[0][BLOCK_SIZE / 2];
        assert!((mid - MAX_12BIT / 2).abs() <= 2, "level {}", mid);
    }

    #[test]
    fn three_inputs_mirror_to_adjacent_pairs() {
        let mut pipeline = Pipeline::new(96_000.0);
        let mut bank = FilterBank::with_default_catalog();
        let params = BlockParams::default();
        run_ticks(&mut pipeline, &mut bank, &params, &[1.0, 2.0, 3.0], 512);

        let io = pipeline.io();
        for lane in 0..3 {
            assert_eq!(io.input[2 * lane], io.input[2 * lane + 1], "pair {}", lane);
        }
        // Distinct lanes stay distinct (no channel swap).
        let a = io.input[0][BLOCK_SIZE / 2];
        let b = io.input[2][BLOCK_SIZE / 2];
        let c = io.input[4][BLOCK_SIZE / 2];
        assert!(a < b && b < c, "lanes out of order: {} {} {}", a, b, c);
    }

    #[test]
    fn two_inputs_mirror_across_channel_triples() {
        let mut pipeline = Pipeline::new(96_000.0);
        let mut bank = FilterBank::with_default_catalog();
        let params = BlockParams::default();
        run_ticks(&mut pipeline, &mut bank, &params, &[1.0, 3.0], 512);

        let io = pipeline.io();
        assert_eq!(io.input[0], io.input[2]);
        assert_eq!(io.input[0], io.input[4]);
        assert_eq!(io.input[1], io.input[3]);
        assert_eq!(io.input[1], io.input[5]);
        assert!(io.input[0][BLOCK_SIZE / 2] < io.input[1][BLOCK_SIZE / 2]);
    }

    #[test]
    fn disconnected_input_synthesizes_noise() {
        let mut pipeline = Pipeline::new(96_000.0);
        let mut bank = FilterBank::with_default_catalog();
        let params = BlockParams::default();
        run_ticks(&mut pipeline, &mut bank, &params, &[], 512);

        let io = pipeline.io();
        let nonzero = io.input[0].iter().filter(|&&v| v != 0).count();
        assert!(nonzero > BLOCK_SIZE / 2, "noise input looks silent");
        // Both lanes carry independent noise.
        assert_ne!(io.input[0], io.input[1]);
    }

    #[test]
    fn engine_runs_once_per_drained_block() {
        let mut pipeline = Pipeline::new(96_000.0);
        pipeline.set_output_mode(OutputMode::Six);
        let mut bank = FilterBank::with_default_catalog();
        let params = BlockParams::default();

        // At a 96 kHz host rate one block drains in exactly BLOCK_SIZE ticks.
        run_ticks(&mut pipeline, &mut bank, &params, &[0.0], 10 * BLOCK_SIZE);
        let blocks = pipeline.blocks_processed();
        assert!(
            (10..=11).contains(&blocks),
            "expected ~10 blocks, ran {}",
            blocks
        );
    }

    #[test]
    fn output_mode_fallback_is_mono() {
        assert_eq!(OutputMode::from_selector(9), OutputMode::Mono);
        assert_eq!(OutputMode::from_selector(1), OutputMode::Stereo);
        assert_eq!(OutputMode::from_selector(2), OutputMode::Six);
    }

    #[test]
    fn mismatched_host_rate_stays_bounded() {
        // 44.1 kHz host: block cadence and FIFO fill must stay balanced
        // without panics or runaway output.
        let mut pipeline = Pipeline::new(44_100.0);
        pipeline.set_output_mode(OutputMode::Stereo);
        let mut bank = FilterBank::with_default_catalog();
        let params = BlockParams::default();

        let mut out = [0.0f32; 2];
        for i in 0..44_100 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            pipeline.process(&mut bank, &params, &[x], &mut out);
            assert!(out[0].is_finite() && out[1].is_finite());
            assert!(out[0].abs() < 100.0, "runaway output {}", out[0]);
        }
        assert!(pipeline.blocks_processed() > 0);
    }
}
