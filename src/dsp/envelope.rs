//! ADSR envelope, evaluated at a reduced control rate and linearly
//! interpolated up to audio rate.

use crate::config::{CONTROL_RATE_DIVIDER, MIN_ENV_TIME};
use crate::patch::AdsrParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Gate-driven ADSR state machine. `render` fills an audio-rate buffer by
/// evaluating the envelope once every `CONTROL_RATE_DIVIDER` samples and
/// interpolating between control points — the same shape as the reduced
/// control-rate renderer this spec's source language used for LFOs/envelopes.
#[derive(Debug, Clone)]
pub struct Envelope {
    stage: EnvelopeStage,
    level: f64,
    sample_rate: f64,
}

impl Envelope {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            stage: EnvelopeStage::Idle,
            level: 0.0,
            sample_rate: sample_rate as f64,
        }
    }

    pub fn gate_on(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    pub fn gate_off(&mut self) {
        if self.stage != EnvelopeStage::Idle {
            self.stage = EnvelopeStage::Release;
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage != EnvelopeStage::Idle
    }

    pub fn is_releasing(&self) -> bool {
        self.stage == EnvelopeStage::Release
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn reset(&mut self) {
        self.stage = EnvelopeStage::Idle;
        self.level = 0.0;
    }

    /// Advance the envelope by `n` samples in a single control step.
    fn advance(&mut self, params: &AdsrParams, n: usize) {
        if n == 0 {
            return;
        }
        let n = n as f64;
        match self.stage {
            EnvelopeStage::Idle => {}
            EnvelopeStage::Attack => {
                let rate = params.attack.max(MIN_ENV_TIME) * self.sample_rate;
                self.level += n / rate;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                let rate = params.decay.max(MIN_ENV_TIME) * self.sample_rate;
                self.level -= (1.0 - params.sustain) * n / rate;
                if self.level <= params.sustain {
                    self.level = params.sustain;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                self.level = params.sustain;
            }
            EnvelopeStage::Release => {
                let rate = params.release.max(MIN_ENV_TIME) * self.sample_rate;
                self.level -= self.level * n / rate;
                if self.level < 1e-5 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }
    }

    /// Render `out.len()` audio-rate samples of envelope level.
    pub fn render(&mut self, params: &AdsrParams, out: &mut [f64]) {
        let n_samples = out.len();
        if n_samples == 0 {
            return;
        }

        let mut pos = 0;
        let mut prev_level = self.level;
        while pos < n_samples {
            let block = CONTROL_RATE_DIVIDER.min(n_samples - pos);
            prev_level = self.level;
            self.advance(params, block);
            let cur_level = self.level;

            if block == 1 {
                out[pos] = cur_level;
            } else {
                for i in 0..block {
                    let t = i as f64 / block as f64;
                    out[pos + i] = prev_level + (cur_level - prev_level) * t;
                }
            }
            pos += block;
        }
        let _ = prev_level;
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(crate::config::SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> AdsrParams {
        AdsrParams {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }

    #[test]
    fn idle_until_gated() {
        let env = Envelope::new(44_100);
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn attack_reaches_full_scale() {
        let mut env = Envelope::new(44_100);
        let p = params();
        env.gate_on();
        let mut buf = vec![0.0; 44_100];
        env.render(&p, &mut buf);
        assert!(buf.iter().cloned().fold(0.0, f64::max) >= 0.999);
    }

    #[test]
    fn decay_settles_on_sustain() {
        let mut env = Envelope::new(44_100);
        let p = params();
        env.gate_on();
        let mut buf = vec![0.0; 44_100];
        env.render(&p, &mut buf);
        assert!((env.level() - p.sustain).abs() < 1e-3);
    }

    #[test]
    fn release_reaches_idle_and_zero() {
        let mut env = Envelope::new(44_100);
        let p = params();
        env.gate_on();
        let mut buf = vec![0.0; 44_100];
        env.render(&p, &mut buf);
        env.gate_off();
        let mut rel_buf = vec![0.0; 44_100];
        env.render(&p, &mut rel_buf);
        assert!(!env.is_active());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn min_time_prevents_div_by_zero() {
        let mut env = Envelope::new(44_100);
        let p = AdsrParams {
            attack: 0.0,
            decay: 0.0,
            sustain: 0.5,
            release: 0.0,
        };
        env.gate_on();
        let mut buf = vec![0.0; 1000];
        env.render(&p, &mut buf);
        assert!(buf.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn gate_off_from_idle_is_noop() {
        let mut env = Envelope::new(44_100);
        env.gate_off();
        assert!(!env.is_active());
    }

    #[test]
    fn releasing_flag_only_set_during_release() {
        let mut env = Envelope::new(44_100);
        let p = params();
        assert!(!env.is_releasing());
        env.gate_on();
        assert!(!env.is_releasing());
        env.gate_off();
        assert!(env.is_releasing());
        let mut buf = vec![0.0; 44_100];
        env.render(&p, &mut buf);
        assert!(!env.is_releasing());
    }
}
