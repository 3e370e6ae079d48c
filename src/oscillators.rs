//! Oscillators that turn a parameter snapshot and a point in time into an output voltage.

use crate::functions;
use crate::params::Snapshot;
use crate::signal::Signal;
use crate::types::{Time, Volts};

/// The generator's oscillator: one of the four fixed shapes, as selected by the snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaveformOscillator;

impl WaveformOscillator {
    pub fn new() -> Self {
        Self
    }
}

impl Signal<(Time, Snapshot), Volts> for WaveformOscillator {
    fn evaluate(&mut self, (time, snapshot): (Time, Snapshot)) -> Volts {
        functions::evaluate(snapshot.shape, &snapshot.params, time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SignalParameters;
    use crate::types::WaveformShape;
    use approx::assert_relative_eq;

    #[test]
    fn test_oscillator_follows_snapshot_shape() {
        let mut oscillator = WaveformOscillator::new();
        let params = SignalParameters {
            amplitude: 2000.0,
            frequency: 1.0,
            dc_offset: 1000.0,
        };

        let sine = Snapshot {
            shape: WaveformShape::Sine,
            params,
        };
        let saw = Snapshot {
            shape: WaveformShape::Sawtooth,
            params,
        };
        assert_relative_eq!(oscillator.evaluate((0.25, sine)), 3.0);
        assert_relative_eq!(oscillator.evaluate((0.0, saw)), -1.0);
    }

    #[test]
    fn test_closures_are_signals() {
        let mut flat = |(_, snapshot): (Time, Snapshot)| snapshot.params.dc_offset / 1000.0;
        assert_relative_eq!(flat.evaluate((1.0, Snapshot::default())), 1.25);
    }
}
