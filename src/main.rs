use std::error::Error;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use siggen::audio_device::AudioOutput;
use siggen::clock::SystemClock;
use siggen::config::{
    GeneratorConfig, ReselectPolicy, BUTTON_DEBOUNCE, KEYPAD_DEBOUNCE, SAMPLES_PER_POLL, VREF,
};
use siggen::input::{typed_events, ChannelSource, Debounced, NoInput, TYPED_BUTTON};
use siggen::midi_device::{MidiKeypad, DEFAULT_BASE_NOTE};
use siggen::output::sample_queue;
use siggen::params::{channel, ParameterStore};
use siggen::synth::{EventLoop, Generator, PollingLoop, SampleThread};
use siggen::types::{InputEvent, Key};

/// The size of the audio buffer.
const AUDIO_BUFFER_SIZE: usize = 2048;

/// How long the sample loop may be blocked by a stalled audio device.
const AUDIO_MAX_WAIT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Alternate input polls and sample bursts on one thread.
    Polling,
    /// Produce samples on a dedicated thread while input is handled on the main thread.
    Threaded,
}

#[derive(Parser, Debug)]
#[command(version, about = "8-bit function generator with keypad parameter entry", long_about = None)]
struct Args {
    /// DAC reference voltage, must be positive.
    #[arg(long, default_value_t = VREF, value_parser = parse_vref)]
    vref: f64,

    /// Samples emitted between two input polls.
    #[arg(long, default_value_t = SAMPLES_PER_POLL)]
    samples_per_poll: usize,

    #[arg(long, value_enum, default_value_t = Mode::Polling)]
    mode: Mode,

    /// Discard pending digits when a field key is pressed during entry.
    #[arg(long)]
    clear_on_reselect: bool,

    /// Keypad key that also cycles the waveform.
    #[arg(long, value_parser = parse_key)]
    cycle_key: Option<Key>,

    #[arg(long, default_value_t = BUTTON_DEBOUNCE.as_millis() as u64)]
    button_debounce_ms: u64,

    #[arg(long, default_value_t = KEYPAD_DEBOUNCE.as_millis() as u64)]
    keypad_debounce_ms: u64,

    /// Midi device to use as keypad, see --list-midi.
    #[arg(long)]
    midi_device: Option<String>,

    /// List midi devices and exit.
    #[arg(long)]
    list_midi: bool,

    /// Midi note of the top-left keypad pad.
    #[arg(long, default_value_t = DEFAULT_BASE_NOTE)]
    midi_base_note: u8,
}

impl Args {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            vref: self.vref,
            samples_per_poll: self.samples_per_poll.max(1),
            button_debounce: Duration::from_millis(self.button_debounce_ms),
            keypad_debounce: Duration::from_millis(self.keypad_debounce_ms),
            reselect: if self.clear_on_reselect {
                ReselectPolicy::ClearBuffer
            } else {
                ReselectPolicy::KeepBuffer
            },
            cycle_key: self.cycle_key,
        }
    }
}

fn parse_vref(value: &str) -> Result<f64, String> {
    let vref: f64 = value
        .parse()
        .map_err(|e| format!("invalid reference voltage '{value}': {e}"))?;
    if vref.is_finite() && vref > 0.0 {
        Ok(vref)
    } else {
        Err(format!("reference voltage must be positive, got {value}"))
    }
}

fn parse_key(value: &str) -> Result<Key, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Key::from_char(c).ok_or(format!("'{c}' is not a keypad key")),
        _ => Err(format!("expected a single keypad key, got '{value}'")),
    }
}

/// Start the command-line signal generator.
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_midi {
        log::info!("Enumerating midi devices:");
        MidiKeypad::devices()?
            .iter()
            .for_each(|device| log::info!("    {device}"));
        return Ok(());
    }

    let config = args.generator_config();
    log::info!("{config:?}");

    // Register ctrl-c handler for clean exit.
    let should_exit = Arc::new(AtomicBool::new(false));
    signal_on_ctrlc(should_exit.clone())?;

    // All host inputs feed one channel.
    let (sender, receiver) = mpsc::channel::<InputEvent>();
    let _midi_input = match &args.midi_device {
        Some(device) => Some(MidiKeypad::connect(
            "siggen",
            device,
            args.midi_base_note,
            sender.clone(),
        )?),
        None => None,
    };
    spawn_stdin_reader(sender);
    // Typed keys and midi pads are discrete keystrokes, only the button is debounced.
    let mut source = Debounced::button_only(ChannelSource::new(receiver), &config);

    let (sink, consumer) = sample_queue(AUDIO_BUFFER_SIZE, AUDIO_MAX_WAIT);
    let audio_output = AudioOutput::connect_default(consumer)?;
    log::info!(
        "Monitoring on audio device: {} Hz, {} channels",
        audio_output.sample_rate(),
        audio_output.channel_count()
    );

    let clock = SystemClock::new();
    let generator = Generator::new(clock, sink, &config);

    log::info!(
        "Running... type keys 0-9 A-D * # and press enter, '{TYPED_BUTTON}' cycles the waveform, \
         ctrl-C exits."
    );
    match args.mode {
        Mode::Polling => {
            let mut polling =
                PollingLoop::new(source, NoInput, ParameterStore::new(), generator, &config);
            polling.run(&should_exit)?;
        }
        Mode::Threaded => {
            let (publisher, subscriber) = channel(ParameterStore::new());
            let sample_thread = SampleThread::spawn(generator, subscriber, config.samples_per_poll);
            let mut events = EventLoop::new(publisher, &config);
            events.run_until(&mut source, &clock, || {
                !should_exit.load(Ordering::Relaxed) && !sample_thread.is_finished()
            });
            let samples = sample_thread.stop()?;
            log::info!("Sample thread stopped after {samples} samples");
        }
    }

    log::info!("Exit requested");
    Ok(())
}

/// Read keypad symbols from stdin on a background thread.
fn spawn_stdin_reader(sender: Sender<InputEvent>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            for event in typed_events(&line) {
                if sender.send(event).is_err() {
                    return;
                }
            }
        }
        log::debug!("Stdin closed");
    });
}

/// Adds a handler for ctrl-c that signals that it has been pressed using the given AtomicBool.
fn signal_on_ctrlc(ctrlc_sent: Arc<AtomicBool>) -> Result<(), Box<dyn Error>> {
    ctrlc_sent.store(false, Ordering::Relaxed);

    ctrlc::set_handler(move || {
        if !ctrlc_sent.load(Ordering::Relaxed) {
            // If this is the first time, signal for exit.
            ctrlc_sent.store(true, Ordering::Relaxed);
        } else {
            // If ctrl-c is sent more than once, exit immediately.
            log::info!("Immediate exit requested");
            std::process::exit(1);
        }
    })?;

    Ok(())
}
