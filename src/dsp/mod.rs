//! Leaf signal-processing components: the per-voice building blocks.
//!
//! These are the "hard part" named in spec.md §1 — everything above
//! `voice` composes these under a hard per-block deadline.

pub mod envelope;
pub mod filter;
pub mod glide;
pub mod lfo;
pub mod noise;
pub mod oscillator;
pub mod wavetable;
