//! Output sinks for quantized samples.

use std::convert::Infallible;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use embedded_hal::digital::v2::OutputPin;
use ringbuf::{Consumer, HeapRb, Producer, SharedRb};

use crate::error::SinkError;
use crate::types::Sample;

/// How long a full sample queue is left alone before trying again.
const QUEUE_RETRY_SLEEP: Duration = Duration::from_micros(200);

/// Something that consumes one quantized sample per call.
pub trait OutputSink {
    fn write_sample(&mut self, sample: Sample) -> Result<(), SinkError>;
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write_sample(&mut self, sample: Sample) -> Result<(), SinkError> {
        (**self).write_sample(sample)
    }
}

/// Collects samples in memory.
impl OutputSink for Vec<Sample> {
    fn write_sample(&mut self, sample: Sample) -> Result<(), SinkError> {
        self.push(sample);
        Ok(())
    }
}

/// An 8-bit parallel DAC driven by eight GPIO outputs, least significant bit first.
pub struct ParallelDac<P> {
    pins: [P; 8],
}

impl<P> ParallelDac<P>
where
    P: OutputPin<Error = Infallible>,
{
    pub fn new(pins: [P; 8]) -> Self {
        Self { pins }
    }

    pub fn release(self) -> [P; 8] {
        self.pins
    }
}

impl<P> OutputSink for ParallelDac<P>
where
    P: OutputPin<Error = Infallible>,
{
    fn write_sample(&mut self, sample: Sample) -> Result<(), SinkError> {
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            let result = if (sample >> bit) & 1 == 1 {
                pin.set_high()
            } else {
                pin.set_low()
            };
            match result {
                Ok(()) => {}
                Err(never) => match never {},
            }
        }
        Ok(())
    }
}

type SampleRb = SharedRb<Sample, Vec<MaybeUninit<Sample>>>;

/// Create a lock-free sample queue: the sink end for the generator, the consumer end for
/// whatever plays the samples back.
///
/// A write to a full queue waits in short sleeps for up to `max_wait` before failing.
pub fn sample_queue(capacity: usize, max_wait: Duration) -> (RingBufferSink, SampleConsumer) {
    let (producer, consumer) = HeapRb::<Sample>::new(capacity).split();
    let open = Arc::new(AtomicBool::new(true));

    let sink = RingBufferSink {
        producer,
        open: open.clone(),
        max_wait,
    };
    let consumer = SampleConsumer { consumer, open };
    (sink, consumer)
}

/// Producer end of a [`sample_queue`].
pub struct RingBufferSink {
    producer: Producer<Sample, Arc<SampleRb>>,
    open: Arc<AtomicBool>,
    max_wait: Duration,
}

impl OutputSink for RingBufferSink {
    fn write_sample(&mut self, sample: Sample) -> Result<(), SinkError> {
        let mut started: Option<Instant> = None;
        loop {
            if !self.open.load(Ordering::Relaxed) {
                return Err(SinkError::Disconnected);
            }
            if self.producer.push(sample).is_ok() {
                return Ok(());
            }

            let started = *started.get_or_insert_with(Instant::now);
            let waited = started.elapsed();
            if waited >= self.max_wait {
                return Err(SinkError::Stalled { waited });
            }
            std::thread::sleep(QUEUE_RETRY_SLEEP);
        }
    }
}

/// Consumer end of a [`sample_queue`]. Dropping it disconnects the sink.
pub struct SampleConsumer {
    consumer: Consumer<Sample, Arc<SampleRb>>,
    open: Arc<AtomicBool>,
}

impl SampleConsumer {
    pub fn pop(&mut self) -> Option<Sample> {
        self.consumer.pop()
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }
}

impl Drop for SampleConsumer {
    fn drop(&mut self) {
        self.open.store(false, Ordering::Relaxed);
    }
}
