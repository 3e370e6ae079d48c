//! Reference constants of the generator board and the runtime configuration built from them.

use std::time::Duration;

use crate::types::{Frequency, Key, Millivolts, Volts};

/// Minimum amplitude (mV).
pub const AMPLITUDE_MIN: Millivolts = 100.0;
/// Maximum amplitude (mV).
pub const AMPLITUDE_MAX: Millivolts = 2500.0;
/// Amplitude at power-on (mV).
pub const AMPLITUDE_DEFAULT: Millivolts = 100.0;

/// Minimum frequency (Hz).
pub const FREQUENCY_MIN: Frequency = 1.0;
/// Maximum frequency (Hz). Only an input bound: the sample loop cannot render anything close to it.
pub const FREQUENCY_MAX: Frequency = 12_000_000.0;
/// Frequency at power-on (Hz).
pub const FREQUENCY_DEFAULT: Frequency = 10.0;

/// Minimum DC offset (mV).
pub const DC_OFFSET_MIN: Millivolts = AMPLITUDE_MIN / 2.0;
/// Maximum DC offset (mV).
pub const DC_OFFSET_MAX: Millivolts = AMPLITUDE_MAX / 2.0;
/// Requested DC offset at power-on: the midpoint of the amplitude range. Clamped into
/// `[DC_OFFSET_MIN, DC_OFFSET_MAX]` when the parameters are built.
pub const DC_OFFSET_DEFAULT: Millivolts = (AMPLITUDE_MIN + AMPLITUDE_MAX) / 2.0;

/// Reference voltage of the 8-bit DAC.
pub const VREF: Volts = 3.3;
/// Full-scale code of the 8-bit DAC (2^8 - 1).
pub const DAC_MAX: u8 = u8::MAX;

/// Maximum number of digits collected for one entry.
pub const DIGIT_BUFFER_LEN: usize = 15;

/// Samples emitted between two input polls in the polling model.
pub const SAMPLES_PER_POLL: usize = 256;

/// Minimum interval between two accepted button edges.
pub const BUTTON_DEBOUNCE: Duration = Duration::from_millis(10);
/// Minimum interval between two accepted keypad presses.
pub const KEYPAD_DEBOUNCE: Duration = Duration::from_millis(50);

/// Keypad layout, indexed `[row][column]`.
pub const KEYPAD_LAYOUT: [[char; 4]; 4] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// What happens to already collected digits when a field key is pressed again before `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReselectPolicy {
    /// Keep the digits and commit them into the newly selected field.
    #[default]
    KeepBuffer,
    /// Discard the digits and start the new field from scratch.
    ClearBuffer,
}

/// Runtime configuration of a generator instance.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Reference voltage of the output DAC.
    pub vref: Volts,
    /// Samples emitted between input polls. Larger bursts raise the sample rate but slow
    /// down input handling in the polling model.
    pub samples_per_poll: usize,
    pub button_debounce: Duration,
    pub keypad_debounce: Duration,
    pub reselect: ReselectPolicy,
    /// Keypad key that cycles the waveform like the button does.
    pub cycle_key: Option<Key>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            vref: VREF,
            samples_per_poll: SAMPLES_PER_POLL,
            button_debounce: BUTTON_DEBOUNCE,
            keypad_debounce: KEYPAD_DEBOUNCE,
            reselect: ReselectPolicy::default(),
            cycle_key: None,
        }
    }
}
