//! Monitoring of the DAC sample stream on a host audio device.

use std::error::Error;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::output::SampleConsumer;
use crate::types::Sample;

/// Map an unsigned DAC code onto the signed audio range, mid-scale being silence.
pub fn sample_to_audio(sample: Sample) -> f32 {
    f32::from(sample) / 127.5 - 1.0
}

/// An open audio output that plays back whatever arrives on a sample queue.
pub struct AudioOutput {
    config: cpal::StreamConfig,
    stream: cpal::Stream,
}

impl AudioOutput {
    /// Connect to the default audio device with the maximum sample rate and start draining
    /// `consumer` into it. Every channel of a frame receives the same sample; when the queue
    /// runs dry the last sample is held.
    pub fn connect_default(mut consumer: SampleConsumer) -> Result<Self, Box<dyn Error>> {
        log::info!("Connecting to default audio device");

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or("Failed to get default output device")?;

        let config = device
            .supported_output_configs()?
            .find(|config| config.sample_format() == cpal::SampleFormat::F32)
            .ok_or("No supported f32 output configs")?
            .with_max_sample_rate()
            .config();

        let channels = usize::from(config.channels).max(1);
        let mut held = sample_to_audio(Sample::MAX / 2);

        log::info!("Building output stream");
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    if let Some(next_sample) = consumer.pop() {
                        held = sample_to_audio(next_sample);
                    }
                    frame.fill(held);
                }
            },
            move |err| {
                log::warn!("Stream error: {:?}", err);
            },
        )?;

        log::info!("Starting output stream...");
        stream.play()?;

        Ok(Self { config, stream })
    }

    /// Get the sample rate of the device.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Get the number of channels the device has.
    pub fn channel_count(&self) -> u16 {
        self.config.channels
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        log::info!("Closing audio device...");
        if let Err(e) = self.stream.pause() {
            log::warn!("Failed to pause output stream: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_to_audio_range() {
        assert_relative_eq!(sample_to_audio(0), -1.0);
        assert_relative_eq!(sample_to_audio(255), 1.0);
        assert!(sample_to_audio(127) < 0.0);
        assert!(sample_to_audio(128) > 0.0);
    }
}
