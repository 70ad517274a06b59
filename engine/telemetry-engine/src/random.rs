//! Injectable randomness
//!
//! Every random draw the engine makes goes through [`RandomSource`], so a
//! run seeded with a fixed value replays exactly and tests can force the
//! outcome of individual draws.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Source of randomness for the simulation
pub trait RandomSource: Send {
    /// Uniform float in `[low, high]`
    fn uniform(&mut self, low: f64, high: f64) -> f64;

    /// `true` with probability `p`
    fn chance(&mut self, p: f64) -> bool;

    /// Uniform integer in `[low, high]`
    fn integer(&mut self, low: u32, high: u32) -> u32;

    /// Normally distributed sample with mean 0
    fn gaussian(&mut self, std_dev: f64) -> f64;
}

/// [`RandomSource`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

/// The generator the engine uses unless told otherwise
pub type StdRandom = RngSource<StdRng>;

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Replayable generator
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Generator seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Seeded when a seed is given, otherwise from entropy
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn chance(&mut self, p: f64) -> bool {
        if p <= 0.0 {
            false
        } else if p >= 1.0 {
            true
        } else {
            self.rng.gen_bool(p)
        }
    }

    fn integer(&mut self, low: u32, high: u32) -> u32 {
        if low >= high {
            return low;
        }
        self.rng.gen_range(low..=high)
    }

    fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev <= 0.0 {
            return 0.0;
        }
        let z: f64 = self.rng.sample(StandardNormal);
        z * std_dev
    }
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sources_replay() {
        let mut a = RngSource::seeded(42);
        let mut b = RngSource::seeded(42);

        for _ in 0..100 {
            assert_eq!(a.uniform(-5.0, 5.0), b.uniform(-5.0, 5.0));
            assert_eq!(a.integer(0, 5), b.integer(0, 5));
        }
    }

    #[test]
    fn test_bounds() {
        let mut rng = RngSource::seeded(7);

        for _ in 0..1000 {
            let value = rng.uniform(18.0, 85.0);
            assert!((18.0..=85.0).contains(&value));
            assert!(rng.integer(0, 5) <= 5);
        }

        assert_eq!(rng.uniform(3.0, 3.0), 3.0);
        assert!(!rng.chance(0.0));
        assert!(rng.chance(1.0));
        assert_eq!(rng.gaussian(0.0), 0.0);
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(54.96), 55.0);
        assert_eq!(round1(-2.34), -2.3);
        assert_eq!(round1(50.0), 50.0);
    }
}
