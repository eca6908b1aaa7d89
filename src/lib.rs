//! Real-time polyphonic subtractive synthesizer core.
//!
//! Module layout follows the dependency order of the signal path: leaf DSP
//! components (`dsp`), the per-voice composition (`voice`), the voice pool
//! (`allocator`), per-channel patch+allocator pairing (`channel`), and the
//! engine that ties channels to an event queue and an audio device
//! (`engine`, `device`). `patch` and `events` are the data model shared
//! across all of it.

pub mod allocator;
pub mod channel;
pub mod config;
pub mod device;
pub mod dsp;
pub mod engine;
pub mod events;
pub mod patch;
pub mod voice;

pub use engine::{AudioEngine, EngineHandle};
pub use events::Event;
pub use patch::Patch;
