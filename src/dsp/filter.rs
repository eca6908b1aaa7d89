//! Four-stage nonlinear ladder low-pass filter (Huovilainen-style), with
//! per-sample cutoff modulation. State and math are kept in `f64` per the
//! numerical requirement on this filter — it is the one component where the
//! original implementation's precision choice is load-bearing.

use crate::config::{filter_max_hz, FILTER_MIN_HZ};

/// Four one-pole tap states, persisted across render calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct LadderFilter {
    sample_rate: f64,
    s0: f64,
    s1: f64,
    s2: f64,
    s3: f64,
}

impl LadderFilter {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        self.s0 = 0.0;
        self.s1 = 0.0;
        self.s2 = 0.0;
        self.s3 = 0.0;
    }

    /// One sample, at cutoff `fc` Hz and resonance `r` in `[0, 1]`.
    pub fn process_sample(&mut self, x: f64, fc: f64, r: f64) -> f64 {
        let nyquist = filter_max_hz(self.sample_rate as u32);
        let fc = fc.clamp(FILTER_MIN_HZ, nyquist);

        let f = 2.0 * self.sample_rate * (std::f64::consts::PI * fc / self.sample_rate).tan();
        let g = f / (2.0 * self.sample_rate);
        let gg = g / (1.0 + g);
        let rr = 4.0 * r;

        let gg2 = gg * gg;
        let gg3 = gg2 * gg;
        let gg4 = gg3 * gg;

        let s = gg3 * self.s0 + gg2 * self.s1 + gg * self.s2 + self.s3;
        let u = (x - rr * s) / (1.0 + rr * gg4);

        let v0 = (u - self.s0) * gg;
        let lp0 = v0 + self.s0;
        self.s0 = lp0 + v0;

        let v1 = (lp0 - self.s1) * gg;
        let lp1 = v1 + self.s1;
        self.s1 = lp1 + v1;

        let v2 = (lp1 - self.s2) * gg;
        let lp2 = v2 + self.s2;
        self.s2 = lp2 + v2;

        let v3 = (lp2 - self.s3) * gg;
        let lp3 = v3 + self.s3;
        self.s3 = lp3 + v3;

        lp3
    }

    /// Process a whole buffer in place, with a per-sample cutoff buffer and
    /// a single resonance value for the block.
    pub fn process(&mut self, buf: &mut [f64], cutoff: &[f64], resonance: f64) {
        debug_assert_eq!(buf.len(), cutoff.len());
        for (sample, &fc) in buf.iter_mut().zip(cutoff.iter()) {
            *sample = self.process_sample(*sample, fc, resonance);
        }
    }
}
