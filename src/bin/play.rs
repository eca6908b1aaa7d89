//! Minimal command-line driver: proof that the core is playable without a
//! GUI. Opens the default output device, plays a short arpeggio on channel
//! 0, and exits. Not a product surface — patch editing, MIDI input, and
//! project management are GUI/collaborator concerns (spec.md §9).

use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use polysynth::config::{BUFFER_SIZE, MIDI_QUEUE_SIZE, SAMPLE_RATE};
use polysynth::engine::AudioEngine;
use polysynth::events::Event;

fn main() {
    env_logger::init();

    let device = match polysynth::device::get_output_device(None) {
        Ok(device) => device,
        Err(err) => {
            log::error!("no output device available: {}", err);
            std::process::exit(1);
        }
    };
    let stream_config = match polysynth::device::get_stream_config(&device) {
        Ok(config) => config,
        Err(err) => {
            log::error!("no usable stream config: {}", err);
            std::process::exit(1);
        }
    };

    let mut engine = AudioEngine::new(SAMPLE_RATE, BUFFER_SIZE, MIDI_QUEUE_SIZE);
    let handle = engine.handle();

    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                engine.process_block(data);
            },
            |err| log::error!("output stream error: {}", err),
            None,
        )
        .expect("failed to build output stream");
    stream.play().expect("failed to start output stream");

    handle.set_master_volume(0.6);

    let arpeggio = [60u8, 64, 67, 72];
    for &note in &arpeggio {
        handle.push(Event::NoteOn { channel: 0, note, velocity: 100 });
        thread::sleep(Duration::from_millis(250));
        handle.push(Event::NoteOff { channel: 0, note });
    }
    thread::sleep(Duration::from_millis(500));

    log::info!(
        "done; {} events dropped over the run",
        handle.dropped_event_count()
    );
}
