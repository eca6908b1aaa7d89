//! A single monophonic synthesis voice: the composition of every `dsp`
//! component into one mono render call (spec.md §4.8).

use crate::config::{filter_max_hz, FILTER_MIN_HZ};
use crate::dsp::envelope::Envelope;
use crate::dsp::filter::LadderFilter;
use crate::dsp::glide::Glide;
use crate::dsp::lfo::Lfo;
use crate::dsp::noise::NoiseSource;
use crate::dsp::oscillator::{tuning_ratio, Oscillator};
use crate::dsp::wavetable;
use crate::patch::{GlideParams, LfoDestination, Patch};

/// MIDI note number to frequency in Hz (A4 = note 69 = 440 Hz).
pub fn note_to_freq(note: u8) -> f64 {
    440.0 * 2f64.powf((note as f64 - 69.0) / 12.0)
}

pub struct Voice {
    note: u8,
    velocity: u8,
    age: u64,
    sample_rate: u32,
    // Set on the first-ever `trigger`; distinguishes "this slot has never
    // played a note yet" (snap) from every later reuse of the slot, where
    // the glide mode always governs (spec.md §4.7).
    has_played: bool,

    osc: [Oscillator; 3],
    noise: NoiseSource,
    filter: LadderFilter,
    filter_env: Envelope,
    amp_env: Envelope,
    lfo: Lfo,
    glide: Glide,

    // Scratch buffers, pre-allocated to the maximum block size so render()
    // never allocates on the audio thread.
    osc_buf: Vec<f64>,
    mix_buf: Vec<f64>,
    pitch_mod_buf: Vec<f64>,
    lfo_buf: Vec<f64>,
    filter_env_buf: Vec<f64>,
    amp_env_buf: Vec<f64>,
    cutoff_buf: Vec<f64>,
}

impl Voice {
    /// `slot_seed` distinguishes this voice's noise source from every other
    /// slot in the pool (see `VoiceAllocator::new`) — without it, every
    /// voice sharing a fixed seed renders byte-identical noise, which is
    /// audible the moment two voices with `noise.level > 0` sound at once.
    pub fn new(sample_rate: u32, max_block: usize, slot_seed: u64) -> Self {
        Self {
            note: 0,
            velocity: 0,
            age: 0,
            sample_rate,
            has_played: false,
            osc: [
                Oscillator::new(sample_rate),
                Oscillator::new(sample_rate),
                Oscillator::new(sample_rate),
            ],
            noise: NoiseSource::new(0x5EED_0001 ^ slot_seed),
            filter: LadderFilter::new(sample_rate),
            filter_env: Envelope::new(sample_rate),
            amp_env: Envelope::new(sample_rate),
            lfo: Lfo::new(sample_rate),
            glide: Glide::new(sample_rate),
            osc_buf: vec![0.0; max_block],
            mix_buf: vec![0.0; max_block],
            pitch_mod_buf: vec![0.0; max_block],
            lfo_buf: vec![0.0; max_block],
            filter_env_buf: vec![0.0; max_block],
            amp_env_buf: vec![0.0; max_block],
            cutoff_buf: vec![0.0; max_block],
        }
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn is_active(&self) -> bool {
        self.amp_env.is_active()
    }

    pub fn is_releasing(&self) -> bool {
        self.amp_env.is_releasing()
    }

    pub fn envelope_level(&self) -> f64 {
        self.amp_env.level()
    }

    pub fn lfo_phase(&self) -> f64 {
        self.lfo.phase()
    }

    pub fn current_freq(&self) -> f64 {
        self.glide.current_freq()
    }

    /// Trigger this voice for `note`/`velocity`. `reset_phase` is false only
    /// for a legato retrigger, where oscillator phase is preserved. The
    /// LFO's phase resets independently, whenever `key_sync` is set
    /// (spec.md §4.5: "When `key_sync` is true, `reset_phase` is invoked on
    /// each triggered note_on"), regardless of the oscillator's own policy.
    pub fn trigger(
        &mut self,
        note: u8,
        velocity: u8,
        glide_params: &GlideParams,
        reset_phase: bool,
        key_sync: bool,
        age: u64,
    ) {
        self.note = note;
        self.velocity = velocity;
        self.age = age;

        let target_freq = note_to_freq(note);
        // Only the very first note this slot ever plays snaps unconditionally
        // — every later trigger (fresh note_on on a reused slot, retrigger of
        // a held note, or a stolen voice) is governed by `glide_params.mode`,
        // per spec.md §4.7 ("when a voice retriggers ... or starts, current_freq
        // slews toward target_freq"). `was_active` must NOT gate this: a
        // previously-idle, already-used slot handed a brand-new note is the
        // ordinary polyphonic case, and Always mode must still slew it.
        if !self.has_played {
            self.glide.snap(target_freq);
            self.has_played = true;
        } else {
            let slew = glide_params.mode != crate::patch::GlideMode::Off;
            self.glide.set_target(target_freq, glide_params.mode, slew);
        }

        if reset_phase {
            for osc in &mut self.osc {
                osc.reset_phase();
            }
        }
        if key_sync {
            self.lfo.reset_phase();
        }

        self.filter_env.gate_on();
        self.amp_env.gate_on();
    }

    pub fn release(&mut self) {
        self.filter_env.gate_off();
        self.amp_env.gate_off();
    }

    /// Force this voice fully silent and idle (used by `all_notes_off` and
    /// on engine stop).
    pub fn hard_reset(&mut self) {
        self.filter_env.reset();
        self.amp_env.reset();
        self.filter.reset();
        self.note = 0;
        self.velocity = 0;
    }

    /// Render `n` frames (n <= the `max_block` passed to `new`) into `out`,
    /// replacing its contents.
    pub fn render(&mut self, patch: &Patch, n: usize, out: &mut [f64]) {
        debug_assert!(n <= self.mix_buf.len());
        let out = &mut out[..n];
        let bank = wavetable::bank();

        // 1. Glide.
        let freq = self.glide.advance(patch.glide.time, n);

        // 2. Envelopes at control rate, interpolated to audio rate.
        let filter_env = &mut self.filter_env_buf[..n];
        self.filter_env.render(&patch.filter_adsr, filter_env);
        let amp_env = &mut self.amp_env_buf[..n];
        self.amp_env.render(&patch.amp_adsr, amp_env);

        // 3. LFO.
        let lfo_buf = &mut self.lfo_buf[..n];
        self.lfo.render(bank, &patch.lfo, lfo_buf);

        // Build the per-sample pitch modulation buffer (semitones) once; only
        // the pitch-destination LFO contributes to it.
        let pitch_mod = &mut self.pitch_mod_buf[..n];
        if patch.lfo.destination == LfoDestination::Pitch {
            pitch_mod.copy_from_slice(&self.lfo_buf[..n]);
        } else {
            pitch_mod.fill(0.0);
        }

        out.fill(0.0);

        // 4. Oscillators.
        let osc_params = [&patch.osc1, &patch.osc2, &patch.osc3];
        for (osc, params) in self.osc.iter_mut().zip(osc_params.iter()) {
            if params.level <= 0.0 {
                continue;
            }
            let ratio = tuning_ratio(params.octave, params.semitone, params.detune);
            let osc_buf = &mut self.osc_buf[..n];
            osc.render(bank, params.waveform, freq * ratio, params.level, Some(pitch_mod), osc_buf);
            for (o, s) in out.iter_mut().zip(osc_buf.iter()) {
                *o += *s;
            }
        }

        // 5. Noise.
        if patch.noise.level > 0.0 {
            let noise_buf = &mut self.mix_buf[..n];
            self.noise.render(patch.noise.noise_type, patch.noise.level, noise_buf);
            for (o, s) in out.iter_mut().zip(noise_buf.iter()) {
                *o += *s;
            }
        }

        // 6. Per-sample cutoff buffer: base + filter-env*env_amount (semitone
        // domain, scaled to Hz) + LFO (Hz, if destination=filter) +
        // key-tracking (semitone domain, scaled to Hz). See SPEC_FULL.md §5.
        let key_semitones = (self.note as f64 - 60.0) * patch.filter.key_tracking;
        let key_hz = patch.filter.cutoff * (2f64.powf(key_semitones / 12.0) - 1.0);
        let max_hz = filter_max_hz(self.sample_rate);
        let cutoff = &mut self.cutoff_buf[..n];
        for i in 0..n {
            let env_semitones = filter_env[i] * patch.filter.env_amount;
            let env_hz = patch.filter.cutoff * (2f64.powf(env_semitones / 12.0) - 1.0);
            let lfo_hz = if patch.lfo.destination == LfoDestination::Filter {
                lfo_buf[i]
            } else {
                0.0
            };
            cutoff[i] = (patch.filter.cutoff + env_hz + lfo_hz + key_hz).clamp(FILTER_MIN_HZ, max_hz);
        }

        // 7. Filter.
        self.filter.process(out, cutoff, patch.filter.resonance);

        // 8. Amp envelope, and tremolo if destination=amp.
        if patch.lfo.destination == LfoDestination::Amp {
            for i in 0..n {
                out[i] *= amp_env[i] * lfo_buf[i];
            }
        } else {
            for i in 0..n {
                out[i] *= amp_env[i];
            }
        }

        // 9. Velocity.
        let vel_scale = self.velocity as f64 / 127.0;
        for s in out.iter_mut() {
            *s *= vel_scale;
        }
    }
}
