//! Deterministic random streams.
//!
//! Every stochastic decision in a trial (class assignment, send intervals,
//! start jitter) is drawn from a `RandomStream` seeded from the trial's
//! `(seed, run)` pair, so that two trials with the same pair and the same
//! call sequence make identical draws. This is load-bearing: protocol
//! comparisons are only meaningful when the workload is reproducible.

use rand::{Rng, SeedableRng, XorShiftRng};
use rand::distributions::{Exp, IndependentSample};

use error::Error;

/// A reproducible pseudo-random stream.
pub struct RandomStream {
    rng: XorShiftRng,
}

impl RandomStream {
    /// Build a stream from a `(seed, run)` pair.
    ///
    /// Distinct runs with the same seed give independent but reproducible
    /// substreams, so a replication only has to bump the run index.
    pub fn new(seed: u64, run: u64) -> Self {
        RandomStream { rng: XorShiftRng::from_seed(seed_words(seed, run)) }
    }

    /// Uniform draw from `[low, high)`. Returns `low` if the range is empty.
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low, high)
    }

    /// Uniform integer draw from `[low, high]` (inclusive, `high < u64::MAX`).
    pub fn uniform_int(&mut self, low: u64, high: u64) -> u64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low, high + 1)
    }

    /// Exponential draw with the given mean.
    pub fn exponential(&mut self, mean: f64) -> Result<f64, Error> {
        if mean <= 0.0 {
            return Err(Error::InvalidParameter(
                format!("exponential mean must be > 0, got {}", mean),
            ));
        }
        let exp = Exp::new(1.0 / mean);
        Ok(exp.ind_sample(&mut self.rng))
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, values: &mut [T]) {
        self.rng.shuffle(values);
    }

    /// Split off an independent stream, seeded from a single draw of this one.
    ///
    /// Used to decorrelate the sender shuffle from the interval draws while
    /// keeping both reproducible under the master seed.
    pub fn fork(&mut self) -> RandomStream {
        let seed = self.uniform_int(0, 0xffff_ffff);
        RandomStream::new(seed, 0)
    }
}

/// Mix `(seed, run)` into a non-zero xorshift seed (splitmix-style finaliser).
fn seed_words(seed: u64, run: u64) -> [u32; 4] {
    let mut x = seed ^ run.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    let mut words = [0u32; 4];
    for word in words.iter_mut() {
        x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = x;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        *word = (z as u32) ^ ((z >> 32) as u32);
    }
    if words == [0, 0, 0, 0] {
        words[0] = 1;
    }
    words
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = RandomStream::new(12345, 1);
        let mut b = RandomStream::new(12345, 1);
        for _ in 0..100 {
            assert_eq!(a.uniform(0.0, 1.0), b.uniform(0.0, 1.0));
            assert_eq!(a.uniform_int(0, 1000), b.uniform_int(0, 1000));
        }
    }

    #[test]
    fn different_run_different_sequence() {
        let mut a = RandomStream::new(12345, 1);
        let mut b = RandomStream::new(12345, 2);
        let draws_a: Vec<u64> = (0..16).map(|_| a.uniform_int(0, 1 << 60)).collect();
        let draws_b: Vec<u64> = (0..16).map(|_| b.uniform_int(0, 1 << 60)).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn exponential_rejects_non_positive_mean() {
        let mut rng = RandomStream::new(1, 1);
        assert!(rng.exponential(0.0).is_err());
        assert!(rng.exponential(-1.0).is_err());
    }

    #[test]
    fn exponential_mean_roughly_matches() {
        let mut rng = RandomStream::new(99, 7);
        let n = 20_000;
        let mut sum = 0.0;
        for _ in 0..n {
            sum += rng.exponential(2.0).unwrap();
        }
        let mean = sum / n as f64;
        assert!((mean - 2.0).abs() < 0.1, "sample mean {} too far from 2.0", mean);
    }

    #[test]
    fn uniform_bounds_respected() {
        let mut rng = RandomStream::new(4, 4);
        for _ in 0..1000 {
            let x = rng.uniform(0.25, 0.75);
            assert!(x >= 0.25 && x < 0.75);
        }
        assert_eq!(rng.uniform(1.0, 1.0), 1.0);
    }

    #[test]
    fn fork_is_reproducible() {
        let mut a = RandomStream::new(8, 8);
        let mut b = RandomStream::new(8, 8);
        let mut fa = a.fork();
        let mut fb = b.fork();
        assert_eq!(fa.uniform_int(0, 1 << 40), fb.uniform_int(0, 1 << 40));
    }
}
