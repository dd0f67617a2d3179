//! ADC noise for the simulated ranger.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, StandardNormal, Uniform};

/// Seedable noise source (seed 0 = entropy)
pub(crate) struct AdcNoise {
    rng: SmallRng,
}

impl AdcNoise {
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }

    /// Zero-mean Gaussian jitter in ADC counts
    pub fn jitter(&mut self, stddev: f32) -> f32 {
        if stddev <= 0.0 {
            return 0.0;
        }
        let n: f32 = self.rng.sample(StandardNormal);
        n * stddev
    }

    /// Returns true with the given probability
    pub fn dropout(&mut self, rate: f32) -> bool {
        rate > 0.0 && Uniform::new(0.0f32, 1.0).sample(&mut self.rng) < rate
    }

    /// Uniform distance in `[low, high)`
    pub fn distance(&mut self, low: f32, high: f32) -> f32 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}
