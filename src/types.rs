//! Shared type definitions.

use std::fmt;

/// Time in seconds since the generator epoch, as fed to the waveform functions.
pub type Time = f64;

/// A monotonic timestamp in microseconds. Wraps only after the full `u64` range.
pub type Microseconds = u64;

/// A frequency in Hz.
pub type Frequency = f64;

/// A physically scaled signal value in volts.
pub type Volts = f64;

/// A millivolt quantity, as entered on the keypad.
pub type Millivolts = f64;

/// A quantized sample, as written to the 8-bit DAC.
pub type Sample = u8;

/// The four waveform shapes the generator can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveformShape {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl WaveformShape {
    /// All shapes in button cycle order.
    pub const ALL: [WaveformShape; 4] = [
        WaveformShape::Sine,
        WaveformShape::Square,
        WaveformShape::Sawtooth,
        WaveformShape::Triangle,
    ];

    /// The shape selected by the next press of the waveform button.
    pub fn next(self) -> Self {
        match self {
            WaveformShape::Sine => WaveformShape::Square,
            WaveformShape::Square => WaveformShape::Sawtooth,
            WaveformShape::Sawtooth => WaveformShape::Triangle,
            WaveformShape::Triangle => WaveformShape::Sine,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveformShape::Sine => "sine",
            WaveformShape::Square => "square",
            WaveformShape::Sawtooth => "sawtooth",
            WaveformShape::Triangle => "triangle",
        }
    }
}

impl fmt::Display for WaveformShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric parameter that can be entered on the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Amplitude,
    Frequency,
    Offset,
}

impl Field {
    /// The field selected by a command key, if any (`A`, `B`, `C`).
    pub fn from_key(key: Key) -> Option<Self> {
        match key {
            Key::A => Some(Field::Amplitude),
            Key::B => Some(Field::Frequency),
            Key::C => Some(Field::Offset),
            _ => None,
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Field::Amplitude | Field::Offset => "mV",
            Field::Frequency => "Hz",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Amplitude => "amplitude",
            Field::Frequency => "frequency",
            Field::Offset => "DC offset",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A key on the 4x4 matrix keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A decimal digit, `0..=9`.
    Digit(u8),
    A,
    B,
    C,
    D,
    Star,
    Hash,
}

impl Key {
    /// Parse a keypad symbol. Letters are accepted in either case; anything
    /// outside `{0-9, A, B, C, D, *, #}` yields `None`.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            '0'..='9' => c.to_digit(10).map(|d| Key::Digit(d as u8)),
            'A' => Some(Key::A),
            'B' => Some(Key::B),
            'C' => Some(Key::C),
            'D' => Some(Key::D),
            '*' => Some(Key::Star),
            '#' => Some(Key::Hash),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Key::Digit(d) => char::from(b'0' + d.min(9)),
            Key::A => 'A',
            Key::B => 'B',
            Key::C => 'C',
            Key::D => 'D',
            Key::Star => '*',
            Key::Hash => '#',
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A discrete event produced by an input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyPressed(Key),
    WaveformCycle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveform_cycle_has_period_four() {
        let mut shape = WaveformShape::Sine;
        for expected in [
            WaveformShape::Square,
            WaveformShape::Sawtooth,
            WaveformShape::Triangle,
            WaveformShape::Sine,
        ] {
            shape = shape.next();
            assert_eq!(shape, expected);
        }

        // Every shape returns to itself after four steps.
        for start in WaveformShape::ALL {
            assert_eq!(start.next().next().next().next(), start);
        }
    }

    #[test]
    fn test_key_symbols() {
        for c in "0123456789ABCD*#".chars() {
            let key = Key::from_char(c).unwrap();
            assert_eq!(key.as_char(), c);
        }
        assert_eq!(Key::from_char('b'), Some(Key::B));
        assert_eq!(Key::from_char('E'), None);
        assert_eq!(Key::from_char(' '), None);
        assert_eq!(Key::from_char('½'), None);
    }

    #[test]
    fn test_field_from_key() {
        assert_eq!(Field::from_key(Key::A), Some(Field::Amplitude));
        assert_eq!(Field::from_key(Key::B), Some(Field::Frequency));
        assert_eq!(Field::from_key(Key::C), Some(Field::Offset));
        assert_eq!(Field::from_key(Key::D), None);
        assert_eq!(Field::from_key(Key::Digit(1)), None);
    }
}
