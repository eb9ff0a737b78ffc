//! Number-Theoretic Transform over R_Q = Z_Q[X]/(X^N + 1)
//!
//! Cooley-Tukey forward / Gentleman-Sande inverse transforms for negacyclic
//! convolution, with Montgomery arithmetic (R = 2^64) in the evaluation domain.
//!
//! The modulus must satisfy Q ≡ 1 (mod 2N) so that a primitive 2N-th root of
//! unity ψ exists. [`DEFAULT_Q`] supports N up to 8192.
//!
//! # Example
//!
//! ```
//! use hintless_pir::math::NttContext;
//!
//! let ctx = NttContext::with_default_q(256);
//!
//! let mut coeffs = vec![1u64; 256];
//! ctx.forward(&mut coeffs);
//! ctx.inverse(&mut coeffs);
//! assert_eq!(coeffs[0], 1);
//! ```

use super::modular::{ModQ, DEFAULT_Q};
use crate::error::{invalid_params, Result};

/// Precomputed twiddle factors and Montgomery constants
///
/// Create once per (N, Q) and share; every [`Poly`](super::Poly) operation in
/// the evaluation domain takes a reference to it.
#[derive(Clone)]
pub struct NttContext {
    n: usize,
    q: u64,
    /// -q^(-1) mod 2^64
    q_inv_neg: u64,
    /// 2^128 mod q
    r_squared: u64,
    /// Forward twiddles ψ^bitrev(i), Montgomery form
    psi_powers: Vec<u64>,
    /// Inverse twiddles ψ^-bitrev(i), Montgomery form
    psi_inv_powers: Vec<u64>,
    /// n^(-1) mod q, Montgomery form
    n_inv: u64,
}

impl NttContext {
    /// Creates an NTT context for the given dimension and modulus.
    ///
    /// # Arguments
    ///
    /// * `n` - Ring dimension (must be a power of two)
    /// * `q` - Prime modulus with q ≡ 1 (mod 2n), below 2^62
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`](crate::Error::InvalidParams) if `n` is
    /// not a power of two or `q` does not admit a primitive 2n-th root of unity.
    pub fn new(n: usize, q: u64) -> Result<Self> {
        if !n.is_power_of_two() || n < 2 {
            return Err(invalid_params!("NTT dimension {} is not a power of two", n));
        }
        if q >= 1 << 62 || q % (2 * n as u64) != 1 {
            return Err(invalid_params!("modulus {} is not NTT-friendly for n = {}", q, n));
        }

        let q_inv_neg = Self::compute_q_inv_neg(q);
        let r_squared = Self::compute_r_squared(q);

        let psi = Self::find_primitive_root(2 * n as u64, q)
            .ok_or_else(|| invalid_params!("no primitive {}-th root of unity mod {}", 2 * n, q))?;
        let psi_mont = Self::to_montgomery(psi, q, r_squared, q_inv_neg);
        let psi_powers = Self::compute_twiddle_factors(n, psi_mont, q, q_inv_neg, r_squared);

        let psi_inv = ModQ::inv(psi, q);
        let psi_inv_mont = Self::to_montgomery(psi_inv, q, r_squared, q_inv_neg);
        let psi_inv_powers =
            Self::compute_twiddle_factors(n, psi_inv_mont, q, q_inv_neg, r_squared);

        let n_inv = Self::to_montgomery(ModQ::inv(n as u64, q), q, r_squared, q_inv_neg);

        Ok(Self {
            n,
            q,
            q_inv_neg,
            r_squared,
            psi_powers,
            psi_inv_powers,
            n_inv,
        })
    }

    /// Creates an NTT context with [`DEFAULT_Q`].
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two in `2..=8192`.
    pub fn with_default_q(n: usize) -> Self {
        match Self::new(n, DEFAULT_Q) {
            Ok(ctx) => ctx,
            Err(e) => panic!("{}", e),
        }
    }

    /// Ring dimension N
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Modulus Q
    pub fn modulus(&self) -> u64 {
        self.q
    }

    /// Forward NTT in place
    ///
    /// Input is in standard representation; output is in evaluation form with
    /// Montgomery representation.
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != n`.
    pub fn forward(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");

        for c in coeffs.iter_mut() {
            *c = Self::to_montgomery(*c, self.q, self.r_squared, self.q_inv_neg);
        }

        let n = self.n;
        let q = self.q;
        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let j2 = j1 + t;
                let w = self.psi_powers[m + i];

                for j in j1..j2 {
                    let u = coeffs[j];
                    let v = self.montgomery_mul(coeffs[j + t], w);

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    coeffs[j + t] = if u >= v { u - v } else { q - v + u };
                }
            }
            m <<= 1;
        }
    }

    /// Inverse NTT in place, returning to standard representation
    ///
    /// # Panics
    ///
    /// Panics if `coeffs.len() != n`.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        assert_eq!(coeffs.len(), self.n, "Input length must match dimension");

        let n = self.n;
        let q = self.q;
        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j1 = i * 2 * t;
                let w = self.psi_inv_powers[m + i];

                for j in j1..(j1 + t) {
                    let u = coeffs[j];
                    let v = coeffs[j + t];

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    let diff = if u >= v { u - v } else { q - v + u };
                    coeffs[j + t] = self.montgomery_mul(diff, w);
                }
            }
            t <<= 1;
        }

        // Scale by n^(-1), then leave Montgomery form
        for c in coeffs.iter_mut() {
            *c = self.montgomery_mul(self.montgomery_mul(*c, self.n_inv), 1);
        }
    }

    /// Pointwise product of two evaluation-form vectors
    ///
    /// # Panics
    ///
    /// Panics if any length differs from n.
    pub fn pointwise_mul(&self, a: &[u64], b: &[u64], result: &mut [u64]) {
        assert_eq!(a.len(), self.n, "Input length must match dimension");
        assert_eq!(b.len(), self.n, "Input length must match dimension");
        assert_eq!(result.len(), self.n, "Output length must match dimension");

        for ((r, &x), &y) in result.iter_mut().zip(a).zip(b) {
            *r = self.montgomery_mul(x, y);
        }
    }

    /// Pointwise multiply-accumulate: `acc += a * b`
    pub fn pointwise_mul_acc(&self, acc: &mut [u64], a: &[u64], b: &[u64]) {
        assert_eq!(acc.len(), self.n, "Accumulator length must match dimension");
        assert_eq!(a.len(), self.n, "Input length must match dimension");
        assert_eq!(b.len(), self.n, "Input length must match dimension");

        let q = self.q;
        for ((r, &x), &y) in acc.iter_mut().zip(a).zip(b) {
            let sum = *r + self.montgomery_mul(x, y);
            *r = if sum >= q { sum - q } else { sum };
        }
    }

    #[inline]
    fn montgomery_mul(&self, a: u64, b: u64) -> u64 {
        let ab = (a as u128) * (b as u128);
        let m = ((ab as u64).wrapping_mul(self.q_inv_neg)) as u128;
        let t = ((ab + m * (self.q as u128)) >> 64) as u64;
        if t >= self.q {
            t - self.q
        } else {
            t
        }
    }

    fn to_montgomery(a: u64, q: u64, r_squared: u64, q_inv_neg: u64) -> u64 {
        let ab = (a as u128) * (r_squared as u128);
        let m = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn compute_q_inv_neg(q: u64) -> u64 {
        let mut y: u64 = 1;
        for i in 1..64 {
            let yi = y.wrapping_mul(q) & (1u64 << i);
            y |= yi;
        }
        y.wrapping_neg()
    }

    fn compute_r_squared(q: u64) -> u64 {
        let r_mod_q = (1u128 << 64) % (q as u128);
        ((r_mod_q * r_mod_q) % (q as u128)) as u64
    }

    /// Primitive `order`-th root of unity modulo q
    fn find_primitive_root(order: u64, q: u64) -> Option<u64> {
        let exp = (q - 1) / order;
        (2..q.min(1 << 20)).map(|g| ModQ::pow(g, exp, q)).find(|&candidate| {
            ModQ::pow(candidate, order, q) == 1 && ModQ::pow(candidate, order / 2, q) != 1
        })
    }

    /// Twiddle factors in bit-reversed order: `factors[k] = ψ^bitrev(k)`
    fn compute_twiddle_factors(
        n: usize,
        psi: u64,
        q: u64,
        q_inv_neg: u64,
        r_squared: u64,
    ) -> Vec<u64> {
        let mont_mul = |a: u64, b: u64| -> u64 {
            let ab = (a as u128) * (b as u128);
            let mm = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
            let t = ((ab + mm * (q as u128)) >> 64) as u64;
            if t >= q {
                t - q
            } else {
                t
            }
        };

        let one = Self::to_montgomery(1, q, r_squared, q_inv_neg);
        let mut factors = vec![0u64; n];
        factors[0] = one;

        for m in 1..n {
            if m.is_power_of_two() {
                // ψ^(n / 2m)
                let mut pow = one;
                for _ in 0..n / (2 * m) {
                    pow = mont_mul(pow, psi);
                }
                factors[m] = pow;
            } else {
                // Product over set bits of m
                let prev = m & (m - 1);
                let lowest = m & m.wrapping_neg();
                factors[m] = mont_mul(factors[prev], factors[lowest]);
            }
        }

        factors
    }
}
