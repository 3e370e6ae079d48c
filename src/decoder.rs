//! Keypad entry state machine.
//!
//! `A`, `B` and `C` select amplitude, frequency and DC offset; digits are collected into a
//! bounded buffer; `D` parses the buffer and commits it. The waveform button (or an
//! optional keypad key) cycles the shape independently of any entry in progress.

use heapless::String;

use crate::config::{GeneratorConfig, ReselectPolicy, DIGIT_BUFFER_LEN};
use crate::params::{field_range, ParameterWriter};
use crate::types::{Field, InputEvent, Key, WaveformShape};

/// Entry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecoderState {
    #[default]
    Idle,
    Collecting(Field),
}

/// Observable outcome of handling one event, for echoing back to the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// The event had no effect.
    Ignored,
    /// A field was selected and digits are now collected for it.
    FieldSelected(Field),
    /// A digit was appended to the buffer.
    DigitAccepted(char),
    /// The buffer is full and the digit was dropped.
    DigitDropped(char),
    /// An entry was terminated and the clamped value stored.
    Committed { field: Field, value: f64 },
    /// The waveform advanced to a new shape.
    ShapeChanged(WaveformShape),
}

/// The keypad entry state machine.
#[derive(Debug, Clone)]
pub struct InputDecoder {
    state: DecoderState,
    digits: String<DIGIT_BUFFER_LEN>,
    reselect: ReselectPolicy,
    cycle_key: Option<Key>,
}

impl Default for InputDecoder {
    fn default() -> Self {
        Self::new(&GeneratorConfig::default())
    }
}

impl InputDecoder {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            state: DecoderState::Idle,
            digits: String::new(),
            reselect: config.reselect,
            cycle_key: config.cycle_key,
        }
    }

    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Digits collected for the current entry.
    pub fn pending_digits(&self) -> &str {
        self.digits.as_str()
    }

    /// Apply one input event, committing into `params` when an entry completes.
    pub fn handle(&mut self, event: InputEvent, params: &mut impl ParameterWriter) -> Response {
        let response = match event {
            InputEvent::WaveformCycle => self.cycle(params),
            InputEvent::KeyPressed(key) if Some(key) == self.cycle_key => self.cycle(params),
            InputEvent::KeyPressed(key) => self.handle_key(key, params),
        };
        report(&response);
        response
    }

    fn cycle(&mut self, params: &mut impl ParameterWriter) -> Response {
        Response::ShapeChanged(params.cycle_shape())
    }

    fn handle_key(&mut self, key: Key, params: &mut impl ParameterWriter) -> Response {
        if let Some(field) = Field::from_key(key) {
            if self.reselect == ReselectPolicy::ClearBuffer
                || self.state == DecoderState::Idle
            {
                self.digits.clear();
            }
            self.state = DecoderState::Collecting(field);
            return Response::FieldSelected(field);
        }

        let DecoderState::Collecting(field) = self.state else {
            return Response::Ignored;
        };

        match key {
            Key::Digit(_) => {
                let digit = key.as_char();
                match self.digits.push(digit) {
                    Ok(()) => Response::DigitAccepted(digit),
                    Err(()) => Response::DigitDropped(digit),
                }
            }
            Key::D => {
                let value = parse_digits(&self.digits);
                self.digits.clear();
                self.state = DecoderState::Idle;
                let value = params.commit(field, value);
                Response::Committed { field, value }
            }
            _ => Response::Ignored,
        }
    }
}

/// Parse collected digits as a decimal number. Empty or unparseable input is 0.
fn parse_digits(digits: &str) -> f64 {
    digits.parse::<f64>().unwrap_or(0.0)
}

fn report(response: &Response) {
    match *response {
        Response::Ignored => {}
        Response::FieldSelected(field) => {
            let (min, max) = field_range(field);
            log::info!("Enter {field} ({}) [{min}-{max}], finish with D", field.unit());
        }
        Response::DigitAccepted(digit) => log::info!("{digit}"),
        Response::DigitDropped(digit) => {
            log::warn!("Entry is limited to {DIGIT_BUFFER_LEN} digits, dropped '{digit}'")
        }
        Response::Committed { field, value } => {
            log::info!("{field} set to {value:.1} {}", field.unit())
        }
        Response::ShapeChanged(shape) => log::info!("Waveform changed to {shape}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParameterReader, ParameterStore};
    use std::string::String;
    use std::sync::{Mutex, Once};

    /// Records every log line emitted by this module.
    struct CaptureLogger;

    static CAPTURED: Mutex<Vec<(log::Level, String)>> = Mutex::new(Vec::new());

    impl log::Log for CaptureLogger {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.target() == module_path!().trim_end_matches("::tests")
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                let line = record.args().to_string();
                CAPTURED.lock().unwrap().push((record.level(), line));
            }
        }

        fn flush(&self) {}
    }

    fn capture_logs() {
        static INIT: Once = Once::new();
        INIT.call_once(|| {
            log::set_logger(&CaptureLogger).unwrap();
            log::set_max_level(log::LevelFilter::Info);
        });
    }

    fn keys(decoder: &mut InputDecoder, store: &mut ParameterStore, symbols: &str) -> Vec<Response> {
        symbols
            .chars()
            .map(|c| {
                let key = Key::from_char(c).unwrap();
                decoder.handle(InputEvent::KeyPressed(key), store)
            })
            .collect()
    }

    #[test]
    fn test_accepted_digits_are_echoed_at_info() {
        capture_logs();
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        keys(&mut decoder, &mut store, "B7");

        let captured = CAPTURED.lock().unwrap();
        assert!(captured
            .iter()
            .any(|(level, line)| *level == log::Level::Info && line == "7"));
    }

    #[test]
    fn test_amplitude_entry() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();

        let responses = keys(&mut decoder, &mut store, "A1000D");
        assert_eq!(responses[0], Response::FieldSelected(Field::Amplitude));
        assert_eq!(responses[1], Response::DigitAccepted('1'));
        assert_eq!(
            responses[5],
            Response::Committed {
                field: Field::Amplitude,
                value: 1000.0
            }
        );
        assert_eq!(store.read().params.amplitude, 1000.0);
        assert_eq!(decoder.state(), DecoderState::Idle);
        assert_eq!(decoder.pending_digits(), "");
    }

    #[test]
    fn test_frequency_entry() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        keys(&mut decoder, &mut store, "B5D");
        assert_eq!(store.read().params.frequency, 5.0);
    }

    #[test]
    fn test_offset_entry_saturates() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        let responses = keys(&mut decoder, &mut store, "C9999D");
        assert_eq!(
            responses.last(),
            Some(&Response::Committed {
                field: Field::Offset,
                value: 1250.0
            })
        );
        assert_eq!(store.read().params.dc_offset, 1250.0);
    }

    #[test]
    fn test_empty_entry_commits_clamped_zero() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        keys(&mut decoder, &mut store, "AD");
        assert_eq!(store.read().params.amplitude, 100.0);
        keys(&mut decoder, &mut store, "BD");
        assert_eq!(store.read().params.frequency, 1.0);
    }

    #[test]
    fn test_keys_ignored_while_idle() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        let before = store.read();

        for response in keys(&mut decoder, &mut store, "123D*#") {
            assert_eq!(response, Response::Ignored);
        }
        assert_eq!(store.read(), before);
        assert_eq!(decoder.state(), DecoderState::Idle);
    }

    #[test]
    fn test_star_and_hash_ignored_while_collecting() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        let responses = keys(&mut decoder, &mut store, "B4*#4D");
        assert_eq!(responses[2], Response::Ignored);
        assert_eq!(responses[3], Response::Ignored);
        assert_eq!(store.read().params.frequency, 44.0);
    }

    #[test]
    fn test_buffer_overflow_drops_extra_digits() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();

        keys(&mut decoder, &mut store, "B");
        let responses = keys(&mut decoder, &mut store, "1234567890123456789");
        assert!(responses[..DIGIT_BUFFER_LEN]
            .iter()
            .all(|r| matches!(r, Response::DigitAccepted(_))));
        assert!(responses[DIGIT_BUFFER_LEN..]
            .iter()
            .all(|r| matches!(r, Response::DigitDropped(_))));
        assert_eq!(decoder.pending_digits(), "123456789012345");

        keys(&mut decoder, &mut store, "D");
        assert_eq!(store.read().params.frequency, 12_000_000.0);
    }

    #[test]
    fn test_reselect_keeps_buffer_by_default() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        keys(&mut decoder, &mut store, "A12B");
        assert_eq!(decoder.state(), DecoderState::Collecting(Field::Frequency));
        assert_eq!(decoder.pending_digits(), "12");
        keys(&mut decoder, &mut store, "3D");
        assert_eq!(store.read().params.frequency, 123.0);
        assert_eq!(store.read().params.amplitude, 100.0);
    }

    #[test]
    fn test_reselect_clear_policy() {
        let config = GeneratorConfig {
            reselect: ReselectPolicy::ClearBuffer,
            ..GeneratorConfig::default()
        };
        let mut decoder = InputDecoder::new(&config);
        let mut store = ParameterStore::new();
        keys(&mut decoder, &mut store, "A12B3D");
        assert_eq!(store.read().params.frequency, 3.0);
    }

    #[test]
    fn test_waveform_cycle_is_orthogonal_to_entry() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();

        keys(&mut decoder, &mut store, "A15");
        let response = decoder.handle(InputEvent::WaveformCycle, &mut store);
        assert_eq!(response, Response::ShapeChanged(WaveformShape::Square));
        assert_eq!(decoder.state(), DecoderState::Collecting(Field::Amplitude));
        assert_eq!(decoder.pending_digits(), "15");

        keys(&mut decoder, &mut store, "00D");
        let snapshot = store.read();
        assert_eq!(snapshot.params.amplitude, 1500.0);
        assert_eq!(snapshot.shape, WaveformShape::Square);
    }

    #[test]
    fn test_four_cycles_return_to_sine() {
        let mut decoder = InputDecoder::default();
        let mut store = ParameterStore::new();
        for _ in 0..4 {
            decoder.handle(InputEvent::WaveformCycle, &mut store);
        }
        assert_eq!(store.read().shape, WaveformShape::Sine);
    }

    #[test]
    fn test_cycle_key() {
        let config = GeneratorConfig {
            cycle_key: Some(Key::Hash),
            ..GeneratorConfig::default()
        };
        let mut decoder = InputDecoder::new(&config);
        let mut store = ParameterStore::new();
        let responses = keys(&mut decoder, &mut store, "#B#2D");
        assert_eq!(responses[0], Response::ShapeChanged(WaveformShape::Square));
        assert_eq!(responses[2], Response::ShapeChanged(WaveformShape::Sawtooth));
        assert_eq!(store.read().params.frequency, 2.0);
    }

    #[test]
    fn test_parse_digits() {
        assert_eq!(parse_digits(""), 0.0);
        assert_eq!(parse_digits("0042"), 42.0);
        assert_eq!(parse_digits("not a number"), 0.0);
    }
}
