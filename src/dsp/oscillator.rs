//! Phase-accumulator oscillator reading the shared wavetable bank.

use crate::config::SAMPLE_RATE;
use crate::dsp::wavetable::{self, WavetableBank};
use crate::patch::Waveform;

/// A single wavetable oscillator. Holds only the phase accumulator — the
/// wavetables themselves live in the process-lifetime `WavetableBank`.
#[derive(Debug, Clone)]
pub struct Oscillator {
    phase: f64,
    sample_rate: f64,
}

impl Oscillator {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            sample_rate: sample_rate as f64,
        }
    }

    /// Render `out.len()` samples at `base_freq` Hz, scaled to `[-level, +level]`.
    ///
    /// `pitch_mod`, if given, is a per-sample additive semitone offset:
    /// `freq_i = base_freq * 2^(pitch_mod[i] / 12)`.
    pub fn render(
        &mut self,
        bank: &WavetableBank,
        waveform: Waveform,
        base_freq: f64,
        level: f64,
        pitch_mod: Option<&[f64]>,
        out: &mut [f64],
    ) {
        if level <= 0.0 {
            out.fill(0.0);
            return;
        }

        for (i, sample) in out.iter_mut().enumerate() {
            let freq = match pitch_mod {
                Some(mod_buf) => base_freq * 2f64.powf(mod_buf[i] / 12.0),
                None => base_freq,
            };
            let inc = freq / self.sample_rate;
            *sample = bank.lookup(waveform, self.phase) * level;
            self.phase = (self.phase + inc).rem_euclid(1.0);
        }
    }

    /// Snap the phase accumulator back to zero (key-sync / legato-new-voice).
    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(SAMPLE_RATE)
    }
}

/// Convert octave/semitone/detune-cents params into a frequency multiplier.
pub fn tuning_ratio(octave: i32, semitone: i32, detune_cents: f64) -> f64 {
    2f64.powi(octave) * 2f64.powf(semitone as f64 / 12.0) * 2f64.powf(detune_cents / 1200.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_stays_in_unit_range() {
        let bank = wavetable::bank();
        let mut osc = Oscillator::new(SAMPLE_RATE);
        let mut buf = vec![0.0; 10_000];
        osc.render(bank, Waveform::Saw, 440.0, 1.0, None, &mut buf);
        assert!((0.0..1.0).contains(&osc.phase()));
    }

    #[test]
    fn zero_level_is_silent_and_does_not_advance_phase() {
        let bank = wavetable::bank();
        let mut osc = Oscillator::new(SAMPLE_RATE);
        let mut buf = vec![1.234; 128];
        osc.render(bank, Waveform::Sine, 440.0, 0.0, None, &mut buf);
        assert!(buf.iter().all(|&s| s == 0.0));
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn reset_phase_returns_to_zero() {
        let bank = wavetable::bank();
        let mut osc = Oscillator::new(SAMPLE_RATE);
        let mut buf = vec![0.0; 1000];
        osc.render(bank, Waveform::Sine, 440.0, 1.0, None, &mut buf);
        assert!(osc.phase() > 0.0);
        osc.reset_phase();
        assert_eq!(osc.phase(), 0.0);
    }

    #[test]
    fn pitch_mod_shifts_frequency() {
        let bank = wavetable::bank();
        let mut osc_plain = Oscillator::new(SAMPLE_RATE);
        let mut osc_mod = Oscillator::new(SAMPLE_RATE);
        let mut plain = vec![0.0; 4096];
        let mut modded = vec![0.0; 4096];
        osc_plain.render(bank, Waveform::Sine, 440.0, 1.0, None, &mut plain);
        let mod_buf = vec![12.0; 4096]; // one octave up
        osc_mod.render(bank, Waveform::Sine, 440.0, 1.0, Some(&mod_buf), &mut modded);
        // The modulated oscillator should have completed roughly twice the
        // phase distance of the plain one.
        assert!(osc_mod.phase() != osc_plain.phase());
    }

    #[test]
    fn tuning_ratio_identity_at_zero() {
        assert!((tuning_ratio(0, 0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn tuning_ratio_octave_doubles() {
        assert!((tuning_ratio(1, 0, 0.0) - 2.0).abs() < 1e-9);
    }
}
