//! Waveform shape generators and the synthesizer built from them.
//!
//! The shape functions take absolute time in seconds and a frequency and return a value in
//! `[-1, 1]`. [`evaluate`] scales that by the amplitude and shifts it by the DC offset.

use std::f64::consts::PI;

use crate::params::SignalParameters;
use crate::types::{Frequency, Time, Volts, WaveformShape};

/// Fractional part of `x`, always in `[0, 1)`.
fn frac(x: f64) -> f64 {
    x - f64::floor(x)
}

/// Generate a sine wave of a given frequency at a given time.
pub fn sine_wave(time: Time, frequency: Frequency) -> f64 {
    let ft = frequency * time;
    f64::sin(2.0 * PI * ft)
}

/// Generate a square wave of a given frequency at a given time: the sign of the sine wave,
/// with zero crossings resolved to +1.
pub fn square_wave(time: Time, frequency: Frequency) -> f64 {
    if sine_wave(time, frequency) >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Generate a sawtooth wave of a given frequency at a given time, rising from -1 to 1 over
/// each period.
pub fn saw_wave(time: Time, frequency: Frequency) -> f64 {
    2.0 * frac(frequency * time) - 1.0
}

/// Generate a triangle wave of a given frequency at a given time, peaking together with the
/// sine wave.
pub fn triangle_wave(time: Time, frequency: Frequency) -> f64 {
    let ft = frequency * time;
    1.0 - 2.0 * f64::abs(2.0 * frac(ft + 0.25) - 1.0)
}

/// Normalized value of `shape` at `time`, in `[-1, 1]`.
pub fn shape_value(shape: WaveformShape, time: Time, frequency: Frequency) -> f64 {
    match shape {
        WaveformShape::Sine => sine_wave(time, frequency),
        WaveformShape::Square => square_wave(time, frequency),
        WaveformShape::Sawtooth => saw_wave(time, frequency),
        WaveformShape::Triangle => triangle_wave(time, frequency),
    }
}

/// Output voltage of the generator at absolute time `time` (seconds since the generator
/// epoch). Lies in `[O - A, O + A]` with amplitude and offset converted to volts.
pub fn evaluate(shape: WaveformShape, params: &SignalParameters, time: Time) -> Volts {
    let amplitude = params.amplitude / 1000.0;
    let offset = params.dc_offset / 1000.0;
    amplitude * shape_value(shape, time, params.frequency) + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_relative_eq, relative_ne};

    fn params(amplitude: f64, frequency: f64, dc_offset: f64) -> SignalParameters {
        SignalParameters {
            amplitude,
            frequency,
            dc_offset,
        }
    }

    #[test]
    fn test_sine_wave() {
        const ONE_OVER_2_PI: f64 = 1.0 / (2.0 * PI);

        // A sine wave of frequency 1/(2PI) (aka with a period of 2PI) should just be a normal sine function.
        for i in 0..100 {
            let time = f64::from(i) * 0.1;
            assert_relative_eq!(sine_wave(time, ONE_OVER_2_PI), f64::sin(time), epsilon = 10e-10);
        }

        assert_eq!(sine_wave(0.0, ONE_OVER_2_PI), 0.0);
        assert_eq!(sine_wave(PI / 2.0, ONE_OVER_2_PI), 1.0);
        assert_eq!(sine_wave(PI * 3.0 / 2.0, ONE_OVER_2_PI), -1.0);
    }

    #[test]
    fn test_square_wave() {
        for i in 0..5000 {
            const FREQUENCY: f64 = 100.0;
            let time = f64::from(i) * 0.001;

            // Away from the crossings the square wave is the sign of the sine wave.
            let sine = sine_wave(time, FREQUENCY);
            if relative_ne!(sine, 0.0, epsilon = 1e-6) {
                assert_eq!(square_wave(time, FREQUENCY), sine.signum());
            }
        }

        // The crossing at t = 0 resolves high.
        assert_eq!(square_wave(0.0, 100.0), 1.0);
    }

    #[test]
    fn test_saw_wave() {
        assert_relative_eq!(saw_wave(0.0, 10.0), -1.0);
        assert_relative_eq!(saw_wave(0.05, 10.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(saw_wave(0.025, 10.0), -0.5, epsilon = 1e-12);
        // Just before the reset it is close to the top.
        assert!(saw_wave(0.0999, 10.0) > 0.99);
        // And resets at the period boundary.
        assert_relative_eq!(saw_wave(0.1, 10.0), -1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_triangle_wave_tracks_sine_peaks() {
        let f = 2.0;
        // Quarter period: both at the top. Three quarters: both at the bottom.
        assert_relative_eq!(triangle_wave(0.125, f), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sine_wave(0.125, f), 1.0, epsilon = 1e-12);
        assert_relative_eq!(triangle_wave(0.375, f), -1.0, epsilon = 1e-12);
        assert_relative_eq!(sine_wave(0.375, f), -1.0, epsilon = 1e-12);
        // Zero crossings line up too.
        assert_relative_eq!(triangle_wave(0.0, f), 0.0, epsilon = 1e-12);
        assert_relative_eq!(triangle_wave(0.25, f), 0.0, epsilon = 1e-12);

        // Linear between peak and trough.
        assert_relative_eq!(triangle_wave(0.1875, f), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_evaluate_stays_within_offset_plus_minus_amplitude() {
        let cases = [
            params(100.0, 1.0, 50.0),
            params(1000.0, 10.0, 500.0),
            params(2500.0, 440.0, 1250.0),
            params(1234.0, 12_000_000.0, 777.0),
        ];

        for p in cases {
            let a = p.amplitude / 1000.0;
            let o = p.dc_offset / 1000.0;
            for shape in WaveformShape::ALL {
                for i in 0..2000 {
                    let time = f64::from(i) * 0.000_37 + 12.5;
                    let v = evaluate(shape, &p, time);
                    assert!(v.is_finite());
                    assert!(v >= o - a - 1e-9, "{shape} {v} below {}", o - a);
                    assert!(v <= o + a + 1e-9, "{shape} {v} above {}", o + a);
                }
            }
        }
    }

    #[test]
    fn test_evaluate_square_scenario() {
        let p = params(1000.0, 10.0, 500.0);
        // A fortieth of the period into the cycle the sine is positive.
        let v = evaluate(WaveformShape::Square, &p, 0.0025);
        assert_relative_eq!(v, 1.5);
        // Second half of the period: low level.
        let v = evaluate(WaveformShape::Square, &p, 0.075);
        assert_relative_eq!(v, -0.5);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let p = params(800.0, 123.0, 300.0);
        for shape in WaveformShape::ALL {
            assert_eq!(evaluate(shape, &p, 3.21), evaluate(shape, &p, 3.21));
        }
    }
}
