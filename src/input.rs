//! Input sources: the matrix keypad, the waveform button and host-side event channels.
//!
//! Every source is polled with the current clock reading and yields at most one debounced
//! [`InputEvent`] per call. None of them ever waits: a held key or button is reported once
//! on its press edge, and nothing is reported again until it has been released.

use std::convert::Infallible;
use std::sync::mpsc::{Receiver, TryRecvError};

use embedded_hal::digital::v2::{InputPin, OutputPin};

use crate::config::{GeneratorConfig, KEYPAD_LAYOUT};
use crate::debounce::Debouncer;
use crate::types::{InputEvent, Key, Microseconds};

/// Number of rows and columns of the keypad matrix.
pub const KEYPAD_SIZE: usize = 4;

/// A source of discrete input events.
pub trait InputSource {
    /// Return the next accepted event, if any, without blocking.
    fn poll(&mut self, now: Microseconds) -> Option<InputEvent>;
}

impl<S: InputSource + ?Sized> InputSource for &mut S {
    fn poll(&mut self, now: Microseconds) -> Option<InputEvent> {
        (**self).poll(now)
    }
}

fn infallible<T>(result: Result<T, Infallible>) -> T {
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Scanner for a 4x4 matrix keypad.
///
/// Rows are outputs held high and pulled low one at a time; columns are inputs with pull-ups,
/// so a low column while a row is driven means the key at their crossing is pressed.
pub struct MatrixKeypad<R, C> {
    rows: [R; KEYPAD_SIZE],
    cols: [C; KEYPAD_SIZE],
    held: Option<Key>,
    debouncer: Debouncer,
}

impl<R, C> MatrixKeypad<R, C>
where
    R: OutputPin<Error = Infallible>,
    C: InputPin<Error = Infallible>,
{
    pub fn new(mut rows: [R; KEYPAD_SIZE], cols: [C; KEYPAD_SIZE], config: &GeneratorConfig) -> Self {
        for row in rows.iter_mut() {
            infallible(row.set_high());
        }
        Self {
            rows,
            cols,
            held: None,
            debouncer: Debouncer::new(config.keypad_debounce),
        }
    }

    /// The key currently held down, scanning rows top to bottom and columns left to right.
    pub fn scan(&mut self) -> Option<Key> {
        let mut pressed = None;
        for (r, row) in self.rows.iter_mut().enumerate() {
            infallible(row.set_low());
            for (c, col) in self.cols.iter().enumerate() {
                if pressed.is_none() && infallible(col.is_low()) {
                    pressed = Key::from_char(KEYPAD_LAYOUT[r][c]);
                }
            }
            infallible(row.set_high());
        }
        pressed
    }

    pub fn release(self) -> ([R; KEYPAD_SIZE], [C; KEYPAD_SIZE]) {
        (self.rows, self.cols)
    }
}

impl<R, C> InputSource for MatrixKeypad<R, C>
where
    R: OutputPin<Error = Infallible>,
    C: InputPin<Error = Infallible>,
{
    fn poll(&mut self, now: Microseconds) -> Option<InputEvent> {
        let pressed = self.scan();
        let edge = pressed.is_some() && pressed != self.held;
        self.held = pressed;

        match pressed {
            Some(key) if edge && self.debouncer.accept(now) => Some(InputEvent::KeyPressed(key)),
            _ => None,
        }
    }
}

/// Active-low push-button that cycles the waveform.
pub struct Button<P> {
    pin: P,
    was_pressed: bool,
    debouncer: Debouncer,
}

impl<P> Button<P>
where
    P: InputPin<Error = Infallible>,
{
    pub fn new(pin: P, config: &GeneratorConfig) -> Self {
        Self {
            pin,
            was_pressed: false,
            debouncer: Debouncer::new(config.button_debounce),
        }
    }

    /// Entry point for an edge interrupt: the pin went low at `now`.
    pub fn on_falling_edge(&mut self, now: Microseconds) -> Option<InputEvent> {
        self.was_pressed = true;
        self.debouncer
            .accept(now)
            .then_some(InputEvent::WaveformCycle)
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> InputSource for Button<P>
where
    P: InputPin<Error = Infallible>,
{
    fn poll(&mut self, now: Microseconds) -> Option<InputEvent> {
        let pressed = infallible(self.pin.is_low());
        let edge = pressed && !self.was_pressed;
        self.was_pressed = pressed;

        if edge && self.debouncer.accept(now) {
            Some(InputEvent::WaveformCycle)
        } else {
            None
        }
    }
}

/// A source that never produces events, for hosts whose button shares another source.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn poll(&mut self, _now: Microseconds) -> Option<InputEvent> {
        None
    }
}

/// Adapts the receiving end of an event channel, as fed by host input threads.
pub struct ChannelSource {
    receiver: Receiver<InputEvent>,
    disconnected: bool,
}

impl ChannelSource {
    pub fn new(receiver: Receiver<InputEvent>) -> Self {
        Self {
            receiver,
            disconnected: false,
        }
    }

    /// Whether every sender has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl InputSource for ChannelSource {
    fn poll(&mut self, _now: Microseconds) -> Option<InputEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                if !self.disconnected {
                    log::info!("Input channel closed");
                    self.disconnected = true;
                }
                None
            }
        }
    }
}

/// Typed character that presses the waveform button.
pub const TYPED_BUTTON: char = 'w';

/// Events for one line of typed input: keypad symbols are keys, [`TYPED_BUTTON`] is the
/// button, whitespace is skipped and anything else is reported and dropped.
pub fn typed_events(line: &str) -> impl Iterator<Item = InputEvent> + '_ {
    line.chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| {
            if c.eq_ignore_ascii_case(&TYPED_BUTTON) {
                Some(InputEvent::WaveformCycle)
            } else if let Some(key) = Key::from_char(c) {
                Some(InputEvent::KeyPressed(key))
            } else {
                log::warn!("'{c}' is not a keypad key");
                None
            }
        })
}

/// Debounces an event source that has no debouncing of its own. Keypad events and button
/// events count as separate sources with their own windows.
///
/// Sources that deliver discrete keystrokes (typed text, midi pads) can burst several keys
/// at once; wrap those with [`Debounced::button_only`] so only the button is debounced.
pub struct Debounced<S> {
    source: S,
    keypad: Option<Debouncer>,
    button: Debouncer,
}

impl<S: InputSource> Debounced<S> {
    pub fn new(source: S, config: &GeneratorConfig) -> Self {
        Self {
            source,
            keypad: Some(Debouncer::new(config.keypad_debounce)),
            button: Debouncer::new(config.button_debounce),
        }
    }

    /// Debounce button events only; keypad events pass through unchanged.
    pub fn button_only(source: S, config: &GeneratorConfig) -> Self {
        Self {
            source,
            keypad: None,
            button: Debouncer::new(config.button_debounce),
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.source
    }

    /// Debounce an event observed at `now` that did not come from the wrapped source.
    pub fn filter(&mut self, event: InputEvent, now: Microseconds) -> Option<InputEvent> {
        let debouncer = match event {
            InputEvent::KeyPressed(_) => match self.keypad.as_mut() {
                Some(debouncer) => debouncer,
                None => return Some(event),
            },
            InputEvent::WaveformCycle => &mut self.button,
        };
        if debouncer.accept(now) {
            Some(event)
        } else {
            log::debug!("Ignoring bounced {event:?}");
            None
        }
    }
}

/// Takes at most one event from the wrapped source per poll.
impl<S: InputSource> InputSource for Debounced<S> {
    fn poll(&mut self, now: Microseconds) -> Option<InputEvent> {
        let event = self.source.poll(now)?;
        self.filter(event, now)
    }
}
