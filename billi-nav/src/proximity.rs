//! Look-window averaging of proximity readings.
//!
//! The IR sensor is noisy and occasionally reports nothing at all, so a
//! single sample is a poor basis for comparing two headings. During a look
//! window every sample is collected and the window reduces to one mean.

/// Map a raw reading onto the physical range.
///
/// Non-positive and non-finite values mean "no echo" and become `max_cm`,
/// so an empty view counts as far away rather than being dropped.
#[inline]
pub fn normalize(reading_cm: f32, max_cm: f32) -> f32 {
    if reading_cm.is_finite() && reading_cm > 0.0 {
        reading_cm
    } else {
        max_cm
    }
}

/// True if the reading is an actual echo distance
#[inline]
pub fn is_valid(reading_cm: f32) -> bool {
    reading_cm.is_finite() && reading_cm > 0.0
}

/// Collects readings during a look window and reduces them to a mean.
#[derive(Debug, Clone)]
pub struct ProximitySampler {
    max_cm: f32,
    recording: bool,
    samples: Vec<f32>,
}

impl ProximitySampler {
    pub fn new(max_cm: f32) -> Self {
        Self {
            max_cm,
            recording: false,
            samples: Vec::new(),
        }
    }

    /// Start a new window, discarding anything left from the previous one
    pub fn begin_recording(&mut self) {
        self.samples.clear();
        self.recording = true;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Add a reading to the current window.
    ///
    /// Returns false (and drops the reading) when no window is open.
    pub fn record(&mut self, reading_cm: f32) -> bool {
        if !self.recording {
            return false;
        }
        self.samples.push(normalize(reading_cm, self.max_cm));
        true
    }

    /// Close the window and return its mean (0 for an empty window)
    pub fn end_recording(&mut self) -> f32 {
        self.recording = false;
        let mean = average(&self.samples);
        self.samples.clear();
        mean
    }

    /// Close the window without reducing it
    pub fn cancel(&mut self) {
        self.recording = false;
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Arithmetic mean, 0 for no samples
pub fn average(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f32>() / samples.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(12.5, 25.0), 12.5);
        assert_eq!(normalize(-3.0, 25.0), 25.0);
        assert_eq!(normalize(0.0, 25.0), 25.0);
        assert_eq!(normalize(f32::NAN, 25.0), 25.0);
        assert_eq!(normalize(f32::INFINITY, 25.0), 25.0);
    }

    #[test]
    fn test_mean_of_window() {
        let mut sampler = ProximitySampler::new(25.0);
        sampler.begin_recording();
        for r in [20.0, 25.0, 23.0] {
            assert!(sampler.record(r));
        }

        assert_relative_eq!(sampler.end_recording(), 68.0 / 3.0, epsilon = 1e-5);
        assert!(sampler.is_empty());
        assert!(!sampler.is_recording());
    }

    #[test]
    fn test_no_echo_counts_as_far() {
        let mut sampler = ProximitySampler::new(25.0);
        sampler.begin_recording();
        sampler.record(15.0);
        sampler.record(-1.0);

        assert_relative_eq!(sampler.end_recording(), 20.0);
    }

    #[test]
    fn test_empty_window_is_zero() {
        let mut sampler = ProximitySampler::new(25.0);
        sampler.begin_recording();
        assert_eq!(sampler.end_recording(), 0.0);
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn test_readings_outside_window_dropped() {
        let mut sampler = ProximitySampler::new(25.0);
        assert!(!sampler.record(10.0));
        assert!(sampler.is_empty());

        sampler.begin_recording();
        sampler.record(10.0);
        sampler.end_recording();

        assert!(!sampler.record(30.0));
        assert!(sampler.is_empty());
    }

    #[test]
    fn test_begin_discards_stale_samples() {
        let mut sampler = ProximitySampler::new(25.0);
        sampler.begin_recording();
        sampler.record(3.0);
        sampler.begin_recording();
        sampler.record(9.0);

        assert_eq!(sampler.end_recording(), 9.0);
    }

    #[test]
    fn test_cancel_clears_window() {
        let mut sampler = ProximitySampler::new(25.0);
        sampler.begin_recording();
        sampler.record(3.0);
        sampler.cancel();

        assert!(!sampler.is_recording());
        assert_eq!(sampler.len(), 0);
    }
}
