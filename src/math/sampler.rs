//! Error and secret distributions
//!
//! - [`GaussianSampler`]: discrete Gaussian over Z by rejection sampling,
//!   truncated at 6σ
//! - [`TernarySampler`]: uniform over {-1, 0, 1}

use rand::Rng;

use super::elem::Elem;

/// Tailcut in standard deviations
pub const TAILCUT_SIGMAS: f64 = 6.0;

/// Discrete Gaussian sampler over Z using rejection sampling
///
/// Samples never exceed `⌈6σ⌉` in absolute value; noise bounds in
/// [`HintParams`](crate::params::HintParams) rely on that.
#[derive(Debug, Clone, Copy)]
pub struct GaussianSampler {
    sigma: f64,
    tailcut: i64,
}

impl GaussianSampler {
    /// Create a sampler with standard deviation `sigma`
    pub fn new(sigma: f64) -> Self {
        Self {
            sigma,
            tailcut: (sigma * TAILCUT_SIGMAS).ceil() as i64,
        }
    }

    /// Largest magnitude this sampler can return
    pub fn tailcut(&self) -> i64 {
        self.tailcut
    }

    /// Sample one value from D_σ in centered representation
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        if self.tailcut == 0 {
            return 0;
        }
        let sigma_sq_2 = 2.0 * self.sigma * self.sigma;
        let bound = self.tailcut;

        loop {
            let x = rng.gen_range(-bound..=bound);

            // Accept with probability exp(-x²/(2σ²))
            let x_sq = (x as f64) * (x as f64);
            let prob = (-x_sq / sigma_sq_2).exp();

            let u: f64 = rng.gen();
            if u < prob {
                return x;
            }
        }
    }

    /// Sample a vector mapped into Z_q for a prime q
    pub fn sample_vec_centered<R: Rng + ?Sized>(&self, len: usize, q: u64, rng: &mut R) -> Vec<u64> {
        (0..len)
            .map(|_| super::ModQ::from_signed(self.sample(rng), q))
            .collect()
    }

    /// Sample a vector in the wrapping ring of `T`
    pub fn sample_elems<T: Elem, R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<T> {
        (0..len).map(|_| T::from_i64(self.sample(rng))).collect()
    }
}

/// Uniform ternary sampler over {-1, 0, 1}
#[derive(Debug, Clone, Copy, Default)]
pub struct TernarySampler;

impl TernarySampler {
    /// One ternary value
    #[inline]
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> i64 {
        rng.gen_range(-1..=1)
    }

    /// Ternary vector in the wrapping ring of `T`
    pub fn sample_elems<T: Elem, R: Rng + ?Sized>(&self, len: usize, rng: &mut R) -> Vec<T> {
        (0..len).map(|_| T::from_i64(self.sample(rng))).collect()
    }
}
