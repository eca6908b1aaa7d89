//! Portamento: slews a voice's playback frequency toward a target.

use crate::patch::GlideMode;

#[derive(Debug, Clone, Copy)]
pub struct Glide {
    sample_rate: f64,
    current_freq: f64,
    target_freq: f64,
}

impl Glide {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            current_freq: 0.0,
            target_freq: 0.0,
        }
    }

    pub fn current_freq(&self) -> f64 {
        self.current_freq
    }

    /// Snap both current and target to `freq` with no slew (off mode, or a
    /// voice's very first note).
    pub fn snap(&mut self, freq: f64) {
        self.current_freq = freq;
        self.target_freq = freq;
    }

    /// Set a new target frequency. `slew` decides whether the source should
    /// glide toward it or be snapped instantly, per the channel's glide mode
    /// and retrigger policy.
    pub fn set_target(&mut self, freq: f64, mode: GlideMode, slew: bool) {
        self.target_freq = freq;
        if mode == GlideMode::Off || !slew {
            self.current_freq = freq;
        }
    }

    /// Advance the glide by `n` samples using time constant `glide_time`
    /// seconds, returning the resulting frequency (per-block constant is
    /// acceptable since glide is slow relative to a block).
    pub fn advance(&mut self, glide_time: f64, n: usize) -> f64 {
        if (self.current_freq - self.target_freq).abs() < 1e-6 {
            self.current_freq = self.target_freq;
            return self.current_freq;
        }
        let time = glide_time.max(1e-4);
        let tau = time * self.sample_rate;
        let alpha = 1.0 - (-(n as f64) / tau).exp();
        self.current_freq += (self.target_freq - self.current_freq) * alpha;
        self.current_freq
    }
}

impl Default for Glide {
    fn default() -> Self {
        Self::new(crate::config::SAMPLE_RATE)
    }
}
