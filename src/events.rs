//! Wire event shapes (spec.md §6) and the wait-free queue that carries them
//! from producer threads (UI, MIDI, patterns) to the audio callback.
//!
//! Grounded on `audio/midi/events.rs`'s `MidiEventQueue`: a `ringbuf::HeapRb`
//! split into producer/consumer halves, each side behind a
//! `parking_lot::Mutex` so the producer side tolerates multiple callers
//! without becoming lock-free-unsafe, while the consumer side — touched only
//! by the audio thread — never contends.

use parking_lot::Mutex;
use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::patch::{ParamValue, Patch};

/// A single wire event, as described in spec.md §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    AllNotesOff { channel: u8 },
    SetParam { channel: u8, path: String, value: ParamValue },
    SetPatch { channel: u8, patch: Box<Patch> },
}

impl Event {
    pub fn channel(&self) -> u8 {
        match self {
            Event::NoteOn { channel, .. }
            | Event::NoteOff { channel, .. }
            | Event::ControlChange { channel, .. }
            | Event::AllNotesOff { channel }
            | Event::SetParam { channel, .. }
            | Event::SetPatch { channel, .. } => *channel,
        }
    }
}

/// Wait-free (from the consumer's perspective) single-consumer event queue.
///
/// Producers call `push`; on a full queue the event is dropped and
/// `dropped_count` is incremented rather than blocking, per spec.md §5/§7.
/// The consumer (always the audio thread) calls `drain` once at the start
/// of every callback.
pub struct EventQueue {
    producer: Mutex<HeapProd<Event>>,
    consumer: Mutex<HeapCons<Event>>,
    dropped: AtomicU64,
}

impl EventQueue {
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::new(capacity);
        let (producer, consumer) = rb.split();
        Self {
            producer: Mutex::new(producer),
            consumer: Mutex::new(consumer),
            dropped: AtomicU64::new(0),
        }
    }

    /// Attempt to push an event. Returns `true` if it was enqueued.
    pub fn push(&self, event: Event) -> bool {
        let ok = self.producer.lock().try_push(event).is_ok();
        if !ok {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        ok
    }

    /// Drain every pending event into a caller-provided buffer, in FIFO
    /// order. Called once per audio callback.
    pub fn drain_into(&self, out: &mut Vec<Event>) {
        let mut consumer = self.consumer.lock();
        while let Some(event) = consumer.try_pop() {
            out.push(event);
        }
    }

    /// Number of events dropped since construction because the queue was full.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.lock().is_empty()
    }
}

unsafe impl Send for EventQueue {}
unsafe impl Sync for EventQueue {}

pub fn new_shared(capacity: usize) -> Arc<EventQueue> {
    Arc::new(EventQueue::new(capacity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain_preserves_fifo_order() {
        let queue = EventQueue::new(16);
        assert!(queue.push(Event::NoteOn { channel: 0, note: 60, velocity: 100 }));
        assert!(queue.push(Event::NoteOn { channel: 0, note: 64, velocity: 80 }));
        assert!(queue.push(Event::NoteOff { channel: 0, note: 60 }));

        let mut drained = Vec::new();
        queue.drain_into(&mut drained);
        assert_eq!(drained.len(), 3);
        match &drained[0] {
            Event::NoteOn { note, velocity, .. } => {
                assert_eq!(*note, 60);
                assert_eq!(*velocity, 100);
            }
            other => panic!("expected NoteOn, got {:?}", other),
        }
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let queue = EventQueue::new(2);
        assert!(queue.push(Event::AllNotesOff { channel: 0 }));
        assert!(queue.push(Event::AllNotesOff { channel: 0 }));
        assert!(!queue.push(Event::AllNotesOff { channel: 0 }));
        assert_eq!(queue.dropped_count(), 1);
    }

    #[test]
    fn drain_empties_the_queue() {
        let queue = EventQueue::new(8);
        queue.push(Event::AllNotesOff { channel: 1 });
        let mut drained = Vec::new();
        queue.drain_into(&mut drained);
        assert!(queue.is_empty());
        assert_eq!(drained.len(), 1);
    }
}
