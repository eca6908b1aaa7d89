//! Fixed voice pool, note-to-voice mapping, and the stealing policy that
//! keeps MAX_VOICES bounded regardless of how many notes arrive (spec.md
//! §4.9).
//!
//! Grounded on the `VoiceAllocator`/`VoiceState` shape in the retrieved
//! `earworm` allocator: a fixed array of voice slots, an `age` counter per
//! slot, and a `find_voice_to_use` → `find_voice_to_steal` priority chain.
//! The stealing priority itself (release-state first, then oldest) is
//! spec.md's own policy, not the teacher's `Oldest`/`Quietest` default.

use crate::config::MAX_VOICES;
use crate::patch::{GlideParams, Patch};
use crate::voice::Voice;

struct VoiceSlot {
    voice: Voice,
    note: Option<u8>,
    age: u64,
}

pub struct VoiceAllocator {
    slots: Vec<VoiceSlot>,
    age_counter: u64,
}

impl VoiceAllocator {
    pub fn new(sample_rate: u32, max_block: usize) -> Self {
        let slots = (0..MAX_VOICES)
            .map(|i| VoiceSlot {
                voice: Voice::new(sample_rate, max_block, i as u64),
                note: None,
                age: 0,
            })
            .collect();
        Self { slots, age_counter: 0 }
    }

    pub fn note_on(&mut self, note: u8, velocity: u8, glide: &GlideParams, lfo_key_sync: bool) {
        self.age_counter = self.age_counter.wrapping_add(1);
        let age = self.age_counter;

        if let Some(idx) = self.slots.iter().position(|s| s.note == Some(note)) {
            // Retrigger: legato keeps oscillator phase, everything else resets it.
            let slot = &mut self.slots[idx];
            slot.age = age;
            let reset_phase = glide.mode != crate::patch::GlideMode::Legato;
            slot.voice.trigger(note, velocity, glide, reset_phase, lfo_key_sync, age);
            return;
        }

        let idx = self.find_voice_to_use();
        let slot = &mut self.slots[idx];
        slot.note = Some(note);
        slot.age = age;
        slot.voice.trigger(note, velocity, glide, true, lfo_key_sync, age);
    }

    pub fn note_off(&mut self, note: u8) {
        if let Some(slot) = self.slots.iter_mut().find(|s| s.note == Some(note)) {
            slot.voice.release();
            slot.note = None;
        }
    }

    pub fn all_notes_off(&mut self) {
        for slot in &mut self.slots {
            slot.voice.release();
            slot.note = None;
        }
    }

    pub fn active_voice_count(&self) -> usize {
        self.slots.iter().filter(|s| s.voice.is_active()).count()
    }

    pub fn is_note_playing(&self, note: u8) -> bool {
        self.slots.iter().any(|s| s.note == Some(note))
    }

    /// Sum every active voice's render into `out` (which is zeroed first).
    pub fn render(&mut self, patch: &Patch, n: usize, out: &mut [f64], scratch: &mut [f64]) {
        out[..n].fill(0.0);
        for slot in &mut self.slots {
            if !slot.voice.is_active() {
                continue;
            }
            let buf = &mut scratch[..n];
            slot.voice.render(patch, n, buf);
            for (o, s) in out[..n].iter_mut().zip(buf.iter()) {
                *o += *s;
            }
        }
    }

    fn find_voice_to_use(&self) -> usize {
        if let Some(idx) = self.slots.iter().position(|s| !s.voice.is_active()) {
            return idx;
        }
        self.find_voice_to_steal()
    }

    /// Priority: (a) releasing voice with the lowest envelope level, else
    /// (b) the oldest voice by age. Ties broken by lowest index via the
    /// stable iteration order of `min_by`/`position`.
    fn find_voice_to_steal(&self) -> usize {
        let releasing = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.voice.is_releasing())
            .min_by(|(_, a), (_, b)| {
                a.voice
                    .envelope_level()
                    .partial_cmp(&b.voice.envelope_level())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        if let Some((idx, _)) = releasing {
            return idx;
        }

        self.slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.age)
            .map(|(idx, _)| idx)
            .expect("voice pool is never empty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BUFFER_SIZE, SAMPLE_RATE};

    fn alloc() -> VoiceAllocator {
        VoiceAllocator::new(SAMPLE_RATE, BUFFER_SIZE)
    }

    #[test]
    fn starts_with_no_active_voices() {
        let a = alloc();
        assert_eq!(a.active_voice_count(), 0);
    }

    #[test]
    fn note_on_then_off_keeps_voice_active_during_release() {
        let mut a = alloc();
        let glide = GlideParams::default();
        a.note_on(60, 100, &glide, false);
        assert!(a.is_note_playing(60));
        assert_eq!(a.active_voice_count(), 1);

        a.note_off(60);
        assert!(!a.is_note_playing(60));
        assert_eq!(a.active_voice_count(), 1);
    }

    #[test]
    fn chord_uses_one_voice_per_note() {
        let mut a = alloc();
        let glide = GlideParams::default();
        a.note_on(60, 100, &glide, false);
        a.note_on(64, 100, &glide, false);
        a.note_on(67, 100, &glide, false);
        assert_eq!(a.active_voice_count(), 3);
        assert!(a.is_note_playing(60) && a.is_note_playing(64) && a.is_note_playing(67));
    }

    #[test]
    fn exceeding_pool_size_steals_the_oldest_voice() {
        let mut a = alloc();
        let glide = GlideParams::default();
        for note in 60..(60 + MAX_VOICES as u8) {
            a.note_on(note, 100, &glide, false);
        }
        assert_eq!(a.active_voice_count(), MAX_VOICES);

        a.note_on(60 + MAX_VOICES as u8, 100, &glide, false);
        assert_eq!(a.active_voice_count(), MAX_VOICES);
        assert!(a.is_note_playing(60 + MAX_VOICES as u8));
        assert!(!a.is_note_playing(60));
    }

    #[test]
    fn all_notes_off_clears_the_note_map_but_voices_stay_active_during_release() {
        let mut a = alloc();
        let glide = GlideParams::default();
        a.note_on(60, 100, &glide, false);
        a.note_on(64, 100, &glide, false);
        a.all_notes_off();
        assert!(!a.is_note_playing(60));
        assert!(!a.is_note_playing(64));
    }

    #[test]
    fn render_sums_active_voices_into_a_nonzero_buffer() {
        let mut a = alloc();
        let patch = Patch::default();
        a.note_on(60, 100, &patch.glide, patch.lfo.key_sync);
        let mut out = vec![0.0; BUFFER_SIZE];
        let mut scratch = vec![0.0; BUFFER_SIZE];
        a.render(&patch, BUFFER_SIZE, &mut out, &mut scratch);
        assert!(out.iter().any(|&s| s.abs() > 1e-6));
    }

    #[test]
    fn retriggering_a_held_note_does_not_consume_a_second_voice() {
        let mut a = alloc();
        let glide = GlideParams::default();
        a.note_on(60, 100, &glide, false);
        a.note_on(60, 120, &glide, false);
        assert_eq!(a.active_voice_count(), 1);
    }
}
