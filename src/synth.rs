//! Sample production and the two scheduling models that drive it.
//!
//! - [`PollingLoop`]: a single loop that alternates keypad scan, button scan and a burst of
//!   samples. The parameter store is owned by the loop, so no synchronisation is involved.
//! - [`SampleThread`] + [`EventLoop`]: samples are produced continuously on their own thread
//!   from a [`ParameterSubscriber`], while input is handled elsewhere and published through
//!   the matching [`ParameterPublisher`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::clock::{duration_micros, elapsed_micros, elapsed_seconds, Clock};
use crate::config::GeneratorConfig;
use crate::decoder::{InputDecoder, Response};
use crate::error::GeneratorError;
use crate::input::InputSource;
use crate::oscillators::WaveformOscillator;
use crate::output::OutputSink;
use crate::params::{
    ParameterPublisher, ParameterReader, ParameterStore, ParameterSubscriber, Snapshot,
};
use crate::quantizer::quantize;
use crate::signal::Signal;
use crate::types::{InputEvent, Microseconds, Sample, Time, Volts};

/// The amount of time for the input thread to sleep when there is nothing to handle.
const THREAD_SLEEP: Duration = Duration::from_millis(1);

/// Minimum interval between two status lines.
const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Turns parameter snapshots into quantized samples and writes them to a sink.
///
/// Time is always measured from the epoch captured at construction, so the phase of the
/// output only depends on the clock and never on how regularly samples are requested.
pub struct Generator<C, S, O = WaveformOscillator> {
    clock: C,
    sink: S,
    oscillator: O,
    vref: Volts,
    epoch: Microseconds,
    samples_written: u64,
}

impl<C: Clock, S: OutputSink> Generator<C, S> {
    pub fn new(clock: C, sink: S, config: &GeneratorConfig) -> Self {
        Self::with_oscillator(clock, sink, WaveformOscillator::new(), config)
    }
}

impl<C, S, O> Generator<C, S, O>
where
    C: Clock,
    S: OutputSink,
    O: Signal<(Time, Snapshot), Volts>,
{
    pub fn with_oscillator(clock: C, sink: S, oscillator: O, config: &GeneratorConfig) -> Self {
        let epoch = clock.now_micros();
        Self {
            clock,
            sink,
            oscillator,
            vref: config.vref,
            epoch,
            samples_written: 0,
        }
    }

    /// Current clock reading.
    pub fn now(&self) -> Microseconds {
        self.clock.now_micros()
    }

    /// Seconds since the generator epoch.
    pub fn time(&self) -> Time {
        elapsed_seconds(self.epoch, self.now())
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Produce and write one sample from the current parameters.
    pub fn next_sample(
        &mut self,
        params: &mut impl ParameterReader,
    ) -> Result<Sample, GeneratorError> {
        let snapshot = params.read();
        let time = self.time();
        let sample = quantize(self.oscillator.evaluate((time, snapshot)), self.vref);
        self.sink.write_sample(sample)?;
        self.samples_written += 1;
        Ok(sample)
    }

    /// Produce and write `count` samples.
    pub fn emit_burst(
        &mut self,
        params: &mut impl ParameterReader,
        count: usize,
    ) -> Result<(), GeneratorError> {
        for _ in 0..count {
            self.next_sample(params)?;
        }
        Ok(())
    }
}

/// Logs the full parameter set, at most once per interval.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    interval: Microseconds,
    last: Option<Microseconds>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(STATUS_INTERVAL)
    }
}

impl StatusReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: duration_micros(interval),
            last: None,
        }
    }

    /// Report `snapshot` if the interval has passed. Returns whether a line was logged.
    pub fn maybe_report(&mut self, now: Microseconds, snapshot: &Snapshot) -> bool {
        if let Some(last) = self.last {
            if elapsed_micros(last, now) < self.interval {
                return false;
            }
        }
        self.last = Some(now);
        let params = &snapshot.params;
        log::info!(
            "Amplitude: {} mV, DC offset: {} mV, frequency: {} Hz, waveform: {}",
            params.amplitude,
            params.dc_offset,
            params.frequency,
            snapshot.shape
        );
        true
    }
}

/// Single-threaded driver: input polls and sample bursts take turns.
///
/// The configured `samples_per_poll` sets the trade-off: more samples per burst means a
/// higher sample rate but slower reaction to keys and the button.
pub struct PollingLoop<K, B, C, S> {
    keypad: K,
    button: B,
    decoder: InputDecoder,
    store: ParameterStore,
    generator: Generator<C, S>,
    samples_per_poll: usize,
    status: StatusReporter,
}

impl<K, B, C, S> PollingLoop<K, B, C, S>
where
    K: InputSource,
    B: InputSource,
    C: Clock,
    S: OutputSink,
{
    pub fn new(
        keypad: K,
        button: B,
        store: ParameterStore,
        generator: Generator<C, S>,
        config: &GeneratorConfig,
    ) -> Self {
        Self {
            keypad,
            button,
            decoder: InputDecoder::new(config),
            store,
            generator,
            samples_per_poll: config.samples_per_poll,
            status: StatusReporter::default(),
        }
    }

    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    pub fn decoder(&self) -> &InputDecoder {
        &self.decoder
    }

    pub fn generator(&self) -> &Generator<C, S> {
        &self.generator
    }

    /// One loop iteration: poll the keypad, poll the button, emit a burst of samples.
    /// Returns the decoder responses to any accepted events.
    pub fn step(&mut self) -> Result<[Option<Response>; 2], GeneratorError> {
        let now = self.generator.now();

        let mut responses = [None, None];
        let sources: [&mut dyn InputSource; 2] = [&mut self.keypad, &mut self.button];
        for (response, source) in responses.iter_mut().zip(sources) {
            if let Some(event) = source.poll(now) {
                *response = Some(self.decoder.handle(event, &mut self.store));
            }
        }

        self.generator
            .emit_burst(&mut self.store, self.samples_per_poll)?;
        self.status.maybe_report(now, &self.store.snapshot());
        Ok(responses)
    }

    /// Run until `stop` is set or the sink fails.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<(), GeneratorError> {
        log::info!(
            "Running polling loop, {} samples per input poll",
            self.samples_per_poll
        );
        while !stop.load(Ordering::Relaxed) {
            self.step()?;
        }
        log::info!(
            "Polling loop stopped after {} samples",
            self.generator.samples_written()
        );
        Ok(())
    }
}

/// Continuous sample production on a dedicated thread.
pub struct SampleThread {
    thread_run: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<Result<u64, GeneratorError>>>,
}

impl SampleThread {
    /// Start producing samples from `subscriber`, checking for a stop request after every
    /// `burst` samples.
    pub fn spawn<C, S, O>(
        mut generator: Generator<C, S, O>,
        mut subscriber: ParameterSubscriber,
        burst: usize,
    ) -> Self
    where
        C: Clock + Send + 'static,
        S: OutputSink + Send + 'static,
        O: Signal<(Time, Snapshot), Volts> + 'static,
    {
        log::info!("Starting sample thread");

        let thread_run = Arc::new(AtomicBool::new(true));
        let thread_run_clone = thread_run.clone();
        let burst = burst.max(1);

        let thread_handle = std::thread::spawn(move || {
            while thread_run_clone.load(Ordering::Relaxed) {
                if let Err(e) = generator.emit_burst(&mut subscriber, burst) {
                    log::warn!("Sample thread failed: {e}");
                    return Err(e);
                }
            }
            Ok(generator.samples_written())
        });

        Self {
            thread_run,
            thread_handle: Some(thread_handle),
        }
    }

    /// Whether the thread has exited, either on request or because of an error.
    pub fn is_finished(&self) -> bool {
        self.thread_handle
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    /// Ask the thread to exit after its current burst without waiting for it.
    pub fn request_stop(&self) {
        self.thread_run.store(false, Ordering::SeqCst);
    }

    /// Stop the thread and return the number of samples written, or the error that ended it.
    pub fn stop(mut self) -> Result<u64, GeneratorError> {
        self.request_stop();
        self.join()
    }

    fn join(&mut self) -> Result<u64, GeneratorError> {
        match self.thread_handle.take() {
            Some(handle) => handle.join().unwrap_or(Err(GeneratorError::ThreadPanicked)),
            None => Ok(0),
        }
    }
}

impl Drop for SampleThread {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            log::info!("Waiting for sample thread to exit...");
            self.request_stop();
            if let Err(e) = self.join() {
                log::warn!("Sample thread ended with an error: {e}");
            }
        }
    }
}

/// Input side of the threaded model: decodes events and publishes parameter snapshots.
pub struct EventLoop {
    decoder: InputDecoder,
    publisher: ParameterPublisher,
    status: StatusReporter,
}

impl EventLoop {
    pub fn new(publisher: ParameterPublisher, config: &GeneratorConfig) -> Self {
        Self {
            decoder: InputDecoder::new(config),
            publisher,
            status: StatusReporter::default(),
        }
    }

    pub fn decoder(&self) -> &InputDecoder {
        &self.decoder
    }

    pub fn snapshot(&mut self) -> Snapshot {
        self.publisher.read()
    }

    /// Apply one event, as an interrupt handler or input thread would.
    pub fn handle(&mut self, event: InputEvent) -> Response {
        self.decoder.handle(event, &mut self.publisher)
    }

    /// Poll `source` until `keep_running` returns false, sleeping briefly when idle.
    pub fn run_until(
        &mut self,
        source: &mut impl InputSource,
        clock: &impl Clock,
        mut keep_running: impl FnMut() -> bool,
    ) {
        while keep_running() {
            self.publisher.flush();
            let now = clock.now_micros();
            match source.poll(now) {
                Some(event) => {
                    self.handle(event);
                }
                None => std::thread::sleep(THREAD_SLEEP),
            }
            let snapshot = self.publisher.read();
            self.status.maybe_report(now, &snapshot);
        }
    }
}
