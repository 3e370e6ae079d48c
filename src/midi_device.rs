//! A MIDI pad controller used as a stand-in for the keypad and the waveform button.

use std::{error::Error, sync::mpsc::Sender};

use midi_control::MidiMessage;

use crate::config::KEYPAD_LAYOUT;
use crate::input::KEYPAD_SIZE;
use crate::types::{InputEvent, Key};

/// Default note of the top-left keypad position.
pub const DEFAULT_BASE_NOTE: u8 = 36;

/// Translate a midi message into an input event.
///
/// The sixteen notes starting at `base_note` map onto the keypad in row-major order and the
/// note after them acts as the waveform button. Everything else is ignored.
pub fn note_event(message: &MidiMessage, base_note: u8) -> Option<InputEvent> {
    let e = match message {
        MidiMessage::NoteOn(_, e) if e.value > 0 => e,
        _ => return None,
    };

    let index = usize::from(e.key.checked_sub(base_note)?);
    let keys = KEYPAD_SIZE * KEYPAD_SIZE;
    if index < keys {
        let symbol = KEYPAD_LAYOUT[index / KEYPAD_SIZE][index % KEYPAD_SIZE];
        Key::from_char(symbol).map(InputEvent::KeyPressed)
    } else if index == keys {
        Some(InputEvent::WaveformCycle)
    } else {
        None
    }
}

/// An open connection to a midi input device whose pads are forwarded as input events.
pub struct MidiKeypad {
    connection: Option<midir::MidiInputConnection<Sender<InputEvent>>>,
}

impl MidiKeypad {
    /// Connect to a midi input device, writing input events to the specified sender
    ///
    /// The device to be connected to can be specified by passing in a value obtained from
    /// MidiKeypad::devices() to the parameter `device_name`. Events are sent until the
    /// returned value is dropped.
    pub fn connect(
        client_name: &str,
        device_name: &str,
        base_note: u8,
        sender: Sender<InputEvent>,
    ) -> Result<Self, Box<dyn Error>> {
        let midi_input = midir::MidiInput::new(client_name)?;

        let midi_ports = midi_input.ports();
        let midi_port = midi_ports
            .iter()
            .find(|port| {
                midi_input
                    .port_name(port)
                    .map_or(false, |name| name == device_name)
            })
            .ok_or(format!("Failed to find desired midi device {device_name}"))?;

        log::info!("Connecting to midi port: {}", device_name);
        let connection = midi_input.connect(
            midi_port,
            device_name,
            move |_timestamp, data, sender| {
                let msg = MidiMessage::from(data);
                if let Some(event) = note_event(&msg, base_note) {
                    log::debug!("Midi pad: {event:?}");
                    if sender.send(event).is_err() {
                        log::debug!("Input receiver gone, dropping midi event");
                    }
                }
            },
            sender,
        )?;

        log::info!("Midi port connected, keypad starts at note {base_note}");

        Ok(Self {
            connection: Some(connection),
        })
    }

    /// Get a list of all midi device names
    pub fn devices() -> Result<Vec<String>, Box<dyn Error>> {
        let midi_input = midir::MidiInput::new("siggen_enumerate_devices")?;

        let ports: Vec<String> = midi_input
            .ports()
            .iter()
            .map(|port| midi_input.port_name(port))
            .filter_map(|res| res.ok())
            .collect();

        Ok(ports)
    }
}

impl Drop for MidiKeypad {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            log::info!("Closing midi connection");
            connection.close();
        }
    }
}
