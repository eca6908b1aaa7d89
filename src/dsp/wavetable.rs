//! Band-limited single-cycle wavetables, shared read-only by every voice.
//!
//! Tables are built once by additive synthesis and never mutated again, so
//! one process-lifetime `WavetableBank` is shared by reference — see
//! `crate::dsp::wavetable::bank()`.

use std::f64::consts::PI;

use crate::config::{WAVETABLE_HARMONICS, WAVETABLE_SIZE};
use crate::patch::Waveform;

/// One precomputed single-cycle table per waveform.
pub struct WavetableBank {
    sine: Vec<f64>,
    saw: Vec<f64>,
    square: Vec<f64>,
    triangle: Vec<f64>,
}

impl WavetableBank {
    fn build() -> Self {
        Self {
            sine: build_sine(),
            saw: build_saw(),
            square: build_square(),
            triangle: build_triangle(),
        }
    }

    /// The table backing `waveform`.
    pub fn table(&self, waveform: Waveform) -> &[f64] {
        match waveform {
            Waveform::Sine => &self.sine,
            Waveform::Saw => &self.saw,
            Waveform::Square => &self.square,
            Waveform::Triangle => &self.triangle,
        }
    }

    /// Linearly interpolated lookup at phase `phase` (wrapped into `[0, 1)`).
    pub fn lookup(&self, waveform: Waveform, phase: f64) -> f64 {
        let table = self.table(waveform);
        let n = table.len();
        let scaled = phase * n as f64;
        let idx = scaled as usize % n;
        let next = (idx + 1) % n;
        let frac = scaled - scaled.floor();
        table[idx] * (1.0 - frac) + table[next] * frac
    }
}

fn build_sine() -> Vec<f64> {
    (0..WAVETABLE_SIZE)
        .map(|i| {
            let phase = i as f64 / WAVETABLE_SIZE as f64;
            (2.0 * PI * phase).sin()
        })
        .collect()
}

fn build_saw() -> Vec<f64> {
    additive(WAVETABLE_SIZE, |phase| {
        let mut acc = 0.0;
        for k in 1..=WAVETABLE_HARMONICS {
            let sign = if (k + 1) % 2 == 0 { 1.0 } else { -1.0 };
            acc += sign * (2.0 * PI * k as f64 * phase).sin() / k as f64;
        }
        acc * (2.0 / PI)
    })
}

fn build_square() -> Vec<f64> {
    additive(WAVETABLE_SIZE, |phase| {
        let mut acc = 0.0;
        let mut k = 1;
        while k <= WAVETABLE_HARMONICS {
            acc += (2.0 * PI * k as f64 * phase).sin() / k as f64;
            k += 2;
        }
        acc * (4.0 / PI)
    })
}

fn build_triangle() -> Vec<f64> {
    additive(WAVETABLE_SIZE, |phase| {
        let mut acc = 0.0;
        let mut k = 1;
        while k <= WAVETABLE_HARMONICS {
            let sign = if ((k - 1) / 2) % 2 == 0 { 1.0 } else { -1.0 };
            acc += sign * (2.0 * PI * k as f64 * phase).sin() / (k as f64 * k as f64);
            k += 2;
        }
        acc * (8.0 / (PI * PI))
    })
}

fn additive(size: usize, f: impl Fn(f64) -> f64) -> Vec<f64> {
    (0..size)
        .map(|i| f(i as f64 / size as f64))
        .collect()
}

static BANK: once_cell::sync::Lazy<WavetableBank> = once_cell::sync::Lazy::new(WavetableBank::build);

/// Process-lifetime shared wavetable bank.
pub fn bank() -> &'static WavetableBank {
    &BANK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_bounded() {
        let bank = bank();
        for wf in [Waveform::Sine, Waveform::Saw, Waveform::Square, Waveform::Triangle] {
            for &s in bank.table(wf) {
                assert!(s.abs() <= 1.2, "table {:?} sample out of range: {}", wf, s);
            }
        }
    }

    #[test]
    fn sine_table_matches_sin() {
        let bank = bank();
        let quarter = bank.lookup(Waveform::Sine, 0.25);
        assert!((quarter - 1.0).abs() < 1e-3);
    }

    #[test]
    fn lookup_wraps_at_one() {
        let bank = bank();
        let at_zero = bank.lookup(Waveform::Saw, 0.0);
        let at_one = bank.lookup(Waveform::Saw, 0.999999);
        assert!((at_zero - at_one).abs() < 0.05);
    }

    #[test]
    fn saw_is_antisymmetric_ish() {
        // A saw's midpoint should be close to zero-crossing (DC-free).
        let bank = bank();
        let sum: f64 = (0..WAVETABLE_SIZE)
            .map(|i| bank.table(Waveform::Saw)[i])
            .sum();
        assert!((sum / WAVETABLE_SIZE as f64).abs() < 0.05);
    }
}
