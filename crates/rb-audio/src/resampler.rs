//! Fractional-phase rate converter.
//!
//! Linear interpolation over a one-sample window, driven either pull-style
//! (fill a whole internal block from a host-rate FIFO) or push-style (feed
//! internal-rate samples, emit host-rate frames as the phase accumulator
//! crosses). Both directions share the same step definition: input samples
//! per output sample. Never blocks — pull holds the last sample on
//! underrun, push drops frames when the destination FIFO is full.

use heapless::Deque;

/// One lane's rate converter.
#[derive(Clone, Debug)]
pub struct Resampler {
    /// Input samples per output sample.
    step: f32,
    /// Fractional position between `prev` and `curr`.
    phase: f32,
    prev: f32,
    curr: f32,
}

impl Resampler {
    pub fn new() -> Self {
        Self {
            step: 1.0,
            phase: 0.0,
            prev: 0.0,
            curr: 0.0,
        }
    }

    /// Set conversion rates in Hz. No-op on degenerate values.
    pub fn set_rates(&mut self, from: f32, to: f32) {
        let step = from / to;
        if step.is_finite() && step > 0.0 {
            self.step = step;
        }
    }

    /// Drop interpolation state (not the configured rates).
    pub fn reset(&mut self) {
        self.phase = 0.0;
        self.prev = 0.0;
        self.curr = 0.0;
    }

    /// Fill `out` by consuming from `fifo`. When the FIFO runs dry the last
    /// sample is held, so the block is always complete.
    pub fn pull<const N: usize>(&mut self, fifo: &mut Deque<f32, N>, out: &mut [f32]) {
        for slot in out.iter_mut() {
            self.phase += self.step;
            while self.phase >= 1.0 {
                self.phase -= 1.0;
                self.prev = self.curr;
                if let Some(s) = fifo.pop_front() {
                    self.curr = s;
                }
            }
            *slot = self.prev + (self.curr - self.prev) * self.phase;
        }
    }

    /// Feed `input`, emitting converted samples into `fifo`. Frames that
    /// do not fit are dropped rather than blocking.
    pub fn push<const N: usize>(&mut self, input: &[f32], fifo: &mut Deque<f32, N>) {
        for &x in input {
            self.prev = self.curr;
            self.curr = x;
            while self.phase < 1.0 {
                let v = self.prev + (self.curr - self.prev) * self.phase;
                let _ = fifo.push_back(v);
                self.phase += self.step;
            }
            self.phase -= 1.0;
        }
    }
}

impl Default for Resampler {
    fn default() -> Self {
        Self::new()
    }
}
