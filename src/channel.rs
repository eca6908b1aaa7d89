//! A single synth channel: one Patch driving one voice allocator (spec.md
//! §4.10). The engine owns `NUM_CHANNELS` of these.

use crate::allocator::VoiceAllocator;
use crate::patch::{ParamValue, Patch};

pub struct Channel {
    patch: Patch,
    allocator: VoiceAllocator,
    sample_rate: u32,
    scratch: Vec<f64>,
}

impl Channel {
    pub fn new(sample_rate: u32, max_block: usize) -> Self {
        Self {
            patch: Patch::default(),
            allocator: VoiceAllocator::new(sample_rate, max_block),
            sample_rate,
            scratch: vec![0.0; max_block],
        }
    }

    pub fn patch(&self) -> &Patch {
        &self.patch
    }

    /// Replace the patch wholesale. Voices in flight pick up the new values
    /// on their next render — there is nothing to re-seed per voice.
    pub fn set_patch(&mut self, patch: Patch) {
        self.patch = patch;
        self.patch.clamp(self.sample_rate);
    }

    pub fn set_param(&mut self, path: &str, value: &ParamValue) -> Result<(), String> {
        self.patch.set_param(path, value, self.sample_rate)
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) {
        if velocity == 0 {
            // A note_on at velocity 0 is a note_off, per standard MIDI
            // convention (spec.md §6).
            self.note_off(note);
            return;
        }
        self.allocator
            .note_on(note, velocity, &self.patch.glide, self.patch.lfo.key_sync);
    }

    pub fn note_off(&mut self, note: u8) {
        self.allocator.note_off(note);
    }

    pub fn all_notes_off(&mut self) {
        self.allocator.all_notes_off();
    }

    pub fn active_voice_count(&self) -> usize {
        self.allocator.active_voice_count()
    }

    /// Render `n` frames into `out`, replacing its contents with the sum of
    /// every active voice.
    pub fn render(&mut self, n: usize, out: &mut [f64]) {
        self.allocator.render(&self.patch, n, out, &mut self.scratch);
    }
}
