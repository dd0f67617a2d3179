//! Single-bit randomness for left/right choices.
//!
//! The navigator never calls a global RNG; it owns a [`CoinFlip`] so tests
//! can pin every choice.

use rand::prelude::*;
use rand::rngs::SmallRng;

/// Source of one random bit per call
pub trait CoinFlip: Send {
    fn flip(&mut self) -> bool;
}

/// Seedable coin backed by `SmallRng`
pub struct RandomCoin {
    rng: SmallRng,
}

impl RandomCoin {
    /// Create a new coin
    ///
    /// If seed is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }
}

impl CoinFlip for RandomCoin {
    fn flip(&mut self) -> bool {
        self.rng.gen_bool(0.5)
    }
}

/// Coin that always lands the same way
#[derive(Clone, Copy, Debug)]
pub struct FixedCoin(pub bool);

impl CoinFlip for FixedCoin {
    fn flip(&mut self) -> bool {
        self.0
    }
}

impl<F> CoinFlip for F
where
    F: FnMut() -> bool + Send,
{
    fn flip(&mut self) -> bool {
        self()
    }
}
