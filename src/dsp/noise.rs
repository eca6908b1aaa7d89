//! White and pink noise sources. Output is independent of pitch/envelope.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::patch::NoiseType;

/// Voss-McCartney style pink noise: a small cascade of white generators
/// updated at different rates, summed, sums to a roughly 3dB/oct rolloff.
const PINK_ROWS: usize = 7;

#[derive(Clone)]
pub struct NoiseSource {
    rng: SmallRng,
    pink_rows: [f64; PINK_ROWS],
    pink_counter: u32,
}

impl NoiseSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            pink_rows: [0.0; PINK_ROWS],
            pink_counter: 0,
        }
    }

    fn next_white(&mut self) -> f64 {
        self.rng.gen_range(-1.0..=1.0)
    }

    fn next_pink(&mut self) -> f64 {
        self.pink_counter = self.pink_counter.wrapping_add(1);
        // Update the row whose bit first flips low-to-high in the counter,
        // the classic Voss-McCartney trick for O(1) amortized updates.
        let trailing = self.pink_counter.trailing_zeros() as usize;
        if trailing < PINK_ROWS {
            self.pink_rows[trailing] = self.next_white();
        }
        let sum: f64 = self.pink_rows.iter().sum();
        sum / PINK_ROWS as f64
    }

    /// Render `out.len()` samples of `noise_type`, scaled by `level`.
    pub fn render(&mut self, noise_type: NoiseType, level: f64, out: &mut [f64]) {
        if level <= 0.0 {
            out.fill(0.0);
            return;
        }
        match noise_type {
            NoiseType::White => {
                for sample in out.iter_mut() {
                    *sample = self.next_white() * level;
                }
            }
            NoiseType::Pink => {
                for sample in out.iter_mut() {
                    *sample = self.next_pink() * level;
                }
            }
        }
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(0x5EED)
    }
}
