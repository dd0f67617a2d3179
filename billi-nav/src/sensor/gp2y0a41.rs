//! Sharp GP2Y0A41SK0F IR distance sensor (4-30cm).
//!
//! The sensor's output voltage is read through a 10-bit ADC. Over its rated
//! range the response is close to `cm = 2076 / (raw - 11)`; below the offset
//! there is no usable echo and the conversion yields the "no echo" sentinel.

/// Hyperbolic fit numerator
pub const SCALE: f32 = 2076.0;

/// ADC counts reported with nothing in range
pub const OFFSET: u16 = 11;

/// Largest value the 10-bit ADC can report
pub const ADC_MAX: u16 = 1023;

/// Reading returned when there is no echo
pub const NO_ECHO: f32 = -1.0;

/// Convert a raw ADC sample to centimeters.
///
/// Returns [`NO_ECHO`] when the sample is at or below the sensor offset.
#[inline]
pub fn adc_to_cm(raw: u16) -> f32 {
    if raw <= OFFSET {
        return NO_ECHO;
    }
    SCALE / (raw - OFFSET) as f32
}

/// Inverse of [`adc_to_cm`], clamped to the ADC range.
///
/// Non-positive distances saturate at [`ADC_MAX`] (object touching the lens).
pub fn cm_to_adc(cm: f32) -> u16 {
    if cm.is_nan() || cm <= 0.0 {
        return ADC_MAX;
    }
    let raw = SCALE / cm + OFFSET as f32;
    raw.round().clamp(0.0, ADC_MAX as f32) as u16
}
