//! An 8-bit function generator: keypad entry of amplitude, frequency and DC offset,
//! a button that cycles the waveform, and a sample loop that drives a parallel DAC.

pub mod audio_device;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod decoder;
pub mod error;
pub mod functions;
pub mod input;
pub mod midi_device;
pub mod oscillators;
pub mod output;
pub mod params;
pub mod quantizer;
pub mod signal;
pub mod synth;
pub mod types;
