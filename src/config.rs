//! Fixed constants that size every buffer and state array in the core.
//!
//! Nothing here is read from a config file: the core is a fixed-topology
//! real-time engine, and every one of these numbers determines the size of
//! a pre-allocated array, so they are compile-time constants rather than
//! runtime configuration.

/// Audio sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Frames rendered per audio callback.
pub const BUFFER_SIZE: usize = 256;

/// Envelopes are evaluated once every `CONTROL_RATE_DIVIDER` samples and
/// linearly interpolated up to audio rate in between. See `dsp::envelope`.
pub const CONTROL_RATE_DIVIDER: usize = 16;

/// Length of each wavetable, in samples. Must be a power of two.
pub const WAVETABLE_SIZE: usize = 2048;

/// Number of harmonics summed when building the band-limited tables.
pub const WAVETABLE_HARMONICS: usize = 64;

/// Size of the voice pool per channel.
pub const MAX_VOICES: usize = 8;

/// Number of channels owned by the engine.
pub const NUM_CHANNELS: usize = 4;

/// Capacity of the engine's event ring buffer.
pub const MIDI_QUEUE_SIZE: usize = 256;

/// Minimum envelope stage time, in seconds, used to avoid division by zero.
pub const MIN_ENV_TIME: f64 = 0.001;

/// Lowest cutoff the ladder filter will accept, in Hz.
pub const FILTER_MIN_HZ: f64 = 20.0;

/// Highest cutoff the ladder filter will accept, expressed as a fraction of
/// the sample rate (Nyquist headroom).
pub const FILTER_MAX_NYQUIST_FRACTION: f64 = 0.49;

/// Returns the hard upper clamp for filter cutoff at the given sample rate.
pub fn filter_max_hz(sample_rate: u32) -> f64 {
    sample_rate as f64 * FILTER_MAX_NYQUIST_FRACTION
}

/// Maximum semitones the LFO can contribute to pitch (`destination = pitch`).
pub const LFO_PITCH_MAX_SEMITONES: f64 = 12.0;

/// Hz contributed to the filter cutoff at `lfo.depth == 1.0` when
/// `destination = filter`. The original GUI never exposed a configurable
/// range for this, so a fixed value is chosen — see DESIGN.md.
pub const LFO_FILTER_RANGE_HZ: f64 = 4000.0;
