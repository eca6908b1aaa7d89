//! Low-frequency oscillator, built on the same wavetable bank as the audio
//! oscillators but consumed as a modulation signal rather than audio.

use crate::config::{LFO_FILTER_RANGE_HZ, LFO_PITCH_MAX_SEMITONES};
use crate::dsp::wavetable::WavetableBank;
use crate::patch::{LfoDestination, LfoParams};

#[derive(Debug, Clone)]
pub struct Lfo {
    phase: f64,
    sample_rate: f64,
}

impl Lfo {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            phase: 0.0,
            sample_rate: sample_rate as f64,
        }
    }

    pub fn reset_phase(&mut self) {
        self.phase = 0.0;
    }

    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Render `n` raw samples of the LFO waveform in `[-1, 1]`, unscaled by depth.
    pub fn render_raw(&mut self, bank: &WavetableBank, params: &LfoParams, out: &mut [f64]) {
        let inc = params.rate / self.sample_rate;
        for sample in out.iter_mut() {
            *sample = bank.lookup(params.waveform, self.phase);
            self.phase = (self.phase + inc).rem_euclid(1.0);
        }
    }

    /// Render the LFO's contribution for its configured destination.
    ///
    /// - `pitch`: additive semitones, in `[-depth*12, +depth*12]`.
    /// - `filter`: additive Hz, in `[-depth*LFO_FILTER_RANGE_HZ, +depth*LFO_FILTER_RANGE_HZ]`.
    /// - `amp`: multiplier in `[1 - depth, 1]` (tremolo; depth=1 fully duckable).
    pub fn render(&mut self, bank: &WavetableBank, params: &LfoParams, out: &mut [f64]) {
        self.render_raw(bank, params, out);
        match params.destination {
            LfoDestination::Pitch => {
                for s in out.iter_mut() {
                    *s *= params.depth * LFO_PITCH_MAX_SEMITONES;
                }
            }
            LfoDestination::Filter => {
                for s in out.iter_mut() {
                    *s *= params.depth * LFO_FILTER_RANGE_HZ;
                }
            }
            LfoDestination::Amp => {
                for s in out.iter_mut() {
                    *s = 1.0 - params.depth * (0.5 - 0.5 * *s);
                }
            }
        }
    }
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(crate::config::SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::wavetable;
    use crate::patch::Waveform;

    fn params(destination: LfoDestination) -> LfoParams {
        LfoParams {
            waveform: Waveform::Sine,
            rate: 5.0,
            depth: 0.5,
            destination,
            key_sync: false,
        }
    }

    #[test]
    fn pitch_destination_bounded_by_depth() {
        let bank = wavetable::bank();
        let mut lfo = Lfo::new(44_100);
        let p = params(LfoDestination::Pitch);
        let mut buf = vec![0.0; 44_100];
        lfo.render(bank, &p, &mut buf);
        let max = buf.iter().cloned().fold(0.0, f64::max);
        assert!(max <= p.depth * LFO_PITCH_MAX_SEMITONES + 1e-6);
    }

    #[test]
    fn amp_destination_never_negative_and_caps_at_one() {
        let bank = wavetable::bank();
        let mut lfo = Lfo::new(44_100);
        let p = params(LfoDestination::Amp);
        let mut buf = vec![0.0; 44_100];
        lfo.render(bank, &p, &mut buf);
        assert!(buf.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn reset_phase_restarts_waveform() {
        let bank = wavetable::bank();
        let mut lfo = Lfo::new(44_100);
        let p = params(LfoDestination::Filter);
        let mut buf = vec![0.0; 100];
        lfo.render(bank, &p, &mut buf);
        lfo.reset_phase();
        assert_eq!(lfo.phase, 0.0);
    }
}
