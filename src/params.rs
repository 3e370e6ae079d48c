//! Waveform parameter storage.
//!
//! [`ParameterStore`] is the single owner of the waveform shape and the numeric signal
//! parameters. In the polling model it is used directly: the loop alternates between
//! feeding it input and reading it for synthesis, so no synchronisation is needed.
//!
//! In the interrupt/event-driven model, [`channel()`] splits ownership in two:
//!
//! ```text
//! input thread                                   sample thread
//! ParameterPublisher ──[Snapshot]──ringbuf──▶ ParameterSubscriber
//!   (owns the store)                              (latest snapshot)
//! ```
//!
//! Every mutation publishes a complete, immutable [`Snapshot`]. The subscriber swaps in
//! the newest one it has received, so the synthesizer never observes a mix of old and
//! new fields and never takes a lock.

use std::mem::MaybeUninit;
use std::sync::Arc;

use ringbuf::{Consumer, HeapRb, Producer, SharedRb};

use crate::config::{
    AMPLITUDE_DEFAULT, AMPLITUDE_MAX, AMPLITUDE_MIN, DC_OFFSET_DEFAULT, DC_OFFSET_MAX,
    DC_OFFSET_MIN, FREQUENCY_DEFAULT, FREQUENCY_MAX, FREQUENCY_MIN,
};
use crate::types::{Field, Frequency, Millivolts, WaveformShape};

/// Number of snapshots that can be in flight between publisher and subscriber.
const SNAPSHOT_QUEUE_SIZE: usize = 16;

type SnapshotRb = SharedRb<Snapshot, Vec<MaybeUninit<Snapshot>>>;

/// Numeric signal parameters. Always within their field ranges once built by a store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalParameters {
    pub amplitude: Millivolts,
    pub frequency: Frequency,
    pub dc_offset: Millivolts,
}

impl Default for SignalParameters {
    fn default() -> Self {
        Self {
            amplitude: clamp_field(Field::Amplitude, AMPLITUDE_DEFAULT),
            frequency: clamp_field(Field::Frequency, FREQUENCY_DEFAULT),
            dc_offset: clamp_field(Field::Offset, DC_OFFSET_DEFAULT),
        }
    }
}

/// Everything the synthesizer needs for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Snapshot {
    pub shape: WaveformShape,
    pub params: SignalParameters,
}

/// Valid `[min, max]` range of a field.
pub fn field_range(field: Field) -> (f64, f64) {
    match field {
        Field::Amplitude => (AMPLITUDE_MIN, AMPLITUDE_MAX),
        Field::Frequency => (FREQUENCY_MIN, FREQUENCY_MAX),
        Field::Offset => (DC_OFFSET_MIN, DC_OFFSET_MAX),
    }
}

/// Clamp a value into a field's range. NaN resolves to the lower bound.
pub fn clamp_field(field: Field, value: f64) -> f64 {
    let (min, max) = field_range(field);
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

/// Read access to the current parameter set.
pub trait ParameterReader {
    /// A self-consistent snapshot of shape and parameters.
    fn read(&mut self) -> Snapshot;
}

/// Write access to the parameter set, used by the input decoder.
pub trait ParameterWriter {
    /// Clamp `value` into the field's range and store it, leaving the other fields alone.
    /// Returns the value actually stored.
    fn commit(&mut self, field: Field, value: f64) -> f64;

    /// Advance to the next waveform shape and return it.
    fn cycle_shape(&mut self) -> WaveformShape;
}

/// The owned parameter set.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    current: Snapshot,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let mut store = Self::new();
        store.current.shape = snapshot.shape;
        store.commit(Field::Amplitude, snapshot.params.amplitude);
        store.commit(Field::Frequency, snapshot.params.frequency);
        store.commit(Field::Offset, snapshot.params.dc_offset);
        store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.current
    }
}

impl ParameterReader for ParameterStore {
    fn read(&mut self) -> Snapshot {
        self.current
    }
}

impl ParameterWriter for ParameterStore {
    fn commit(&mut self, field: Field, value: f64) -> f64 {
        let clamped = clamp_field(field, value);
        let params = &mut self.current.params;
        match field {
            Field::Amplitude => params.amplitude = clamped,
            Field::Frequency => params.frequency = clamped,
            Field::Offset => params.dc_offset = clamped,
        }
        clamped
    }

    fn cycle_shape(&mut self) -> WaveformShape {
        self.current.shape = self.current.shape.next();
        self.current.shape
    }
}

/// Split a store into a writer half for the input side and a lock-free reader half for
/// the sample side. The subscriber starts out with the store's current snapshot.
pub fn channel(store: ParameterStore) -> (ParameterPublisher, ParameterSubscriber) {
    let initial = store.snapshot();
    let (producer, consumer) = HeapRb::<Snapshot>::new(SNAPSHOT_QUEUE_SIZE).split();

    let publisher = ParameterPublisher {
        store,
        producer,
        backlog: None,
    };
    let subscriber = ParameterSubscriber {
        consumer,
        latest: initial,
    };
    (publisher, subscriber)
}

/// Writer half of a [`channel`]. Owns the authoritative [`ParameterStore`].
pub struct ParameterPublisher {
    store: ParameterStore,
    producer: Producer<Snapshot, Arc<SnapshotRb>>,
    /// Newest snapshot that did not fit into the queue yet.
    backlog: Option<Snapshot>,
}

impl ParameterPublisher {
    /// Retry a snapshot that did not fit into the queue earlier.
    /// Returns `true` once nothing is left to deliver.
    pub fn flush(&mut self) -> bool {
        if let Some(snapshot) = self.backlog.take() {
            if let Err(snapshot) = self.producer.push(snapshot) {
                self.backlog = Some(snapshot);
                return false;
            }
        }
        true
    }

    pub fn has_backlog(&self) -> bool {
        self.backlog.is_some()
    }

    fn publish(&mut self) {
        let snapshot = self.store.snapshot();
        // Only the newest snapshot matters, so an older undelivered one is simply replaced.
        self.backlog = None;
        if let Err(snapshot) = self.producer.push(snapshot) {
            log::warn!("Parameter queue full, delaying update until the sampler catches up");
            self.backlog = Some(snapshot);
        }
    }
}

impl ParameterReader for ParameterPublisher {
    fn read(&mut self) -> Snapshot {
        self.store.snapshot()
    }
}

impl ParameterWriter for ParameterPublisher {
    fn commit(&mut self, field: Field, value: f64) -> f64 {
        let stored = self.store.commit(field, value);
        self.publish();
        stored
    }

    fn cycle_shape(&mut self) -> WaveformShape {
        let shape = self.store.cycle_shape();
        self.publish();
        shape
    }
}

/// Reader half of a [`channel`], owned by the sample loop.
pub struct ParameterSubscriber {
    consumer: Consumer<Snapshot, Arc<SnapshotRb>>,
    latest: Snapshot,
}

impl ParameterReader for ParameterSubscriber {
    fn read(&mut self) -> Snapshot {
        while let Some(snapshot) = self.consumer.pop() {
            self.latest = snapshot;
        }
        self.latest
    }
}
