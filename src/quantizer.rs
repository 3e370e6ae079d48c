//! Mapping of output voltages onto DAC codes.

use crate::config::DAC_MAX;
use crate::types::{Sample, Volts};

/// Map a voltage onto the 8-bit DAC range for reference voltage `vref`.
///
/// `round(value / vref * 255)`, saturating at 0 and 255. Non-finite input saturates the
/// same way, with NaN mapping to 0.
pub fn quantize(value: Volts, vref: Volts) -> Sample {
    let full_scale = f64::from(DAC_MAX);
    let code = (value / vref * full_scale).round();
    if code.is_nan() {
        return 0;
    }
    code.clamp(0.0, full_scale) as Sample
}

/// Voltage represented by a DAC code.
pub fn dequantize(sample: Sample, vref: Volts) -> Volts {
    f64::from(sample) / f64::from(DAC_MAX) * vref
}
