//! Polynomials over R_q = Z_q[X]/(X^N + 1)
//!
//! A [`Poly`] is either in coefficient form or in NTT (evaluation) form; the
//! `is_ntt` flag tracks which. Additions work in both forms, products need
//! the evaluation form and an [`NttContext`] with the same dimension and modulus.

use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::modular::ModQ;
use super::ntt::NttContext;
use super::sampler::GaussianSampler;

/// Polynomial in R_q = Z_q[X]/(X^N + 1)
///
/// # Example
///
/// ```
/// use hintless_pir::math::{Poly, DEFAULT_Q};
///
/// let poly = Poly::constant(42, 256, DEFAULT_Q);
/// assert_eq!(poly.coeff(0), 42);
/// assert_eq!(poly.dimension(), 256);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poly {
    /// Coefficients in coefficient or NTT domain.
    coeffs: Vec<u64>,
    /// Modulus q.
    q: u64,
    /// Whether coefficients are in NTT domain.
    is_ntt: bool,
}

impl Poly {
    /// Zero polynomial in coefficient form
    pub fn zero(dim: usize, q: u64) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
            is_ntt: false,
        }
    }

    /// Zero polynomial already flagged as evaluation form
    pub fn zero_ntt(dim: usize, q: u64) -> Self {
        Self {
            coeffs: vec![0; dim],
            q,
            is_ntt: true,
        }
    }

    /// Polynomial from coefficients, reduced modulo q
    pub fn from_coeffs(mut coeffs: Vec<u64>, q: u64) -> Self {
        for c in &mut coeffs {
            *c %= q;
        }
        Self {
            coeffs,
            q,
            is_ntt: false,
        }
    }

    /// Polynomial from signed coefficients
    pub fn from_signed(coeffs: &[i64], q: u64) -> Self {
        Self {
            coeffs: coeffs.iter().map(|&c| ModQ::from_signed(c, q)).collect(),
            q,
            is_ntt: false,
        }
    }

    /// Constant polynomial
    pub fn constant(value: u64, dim: usize, q: u64) -> Self {
        let mut p = Self::zero(dim, q);
        p.coeffs[0] = value % q;
        p
    }

    /// Uniformly random polynomial
    pub fn random<R: Rng + ?Sized>(dim: usize, q: u64, rng: &mut R) -> Self {
        Self {
            coeffs: (0..dim).map(|_| rng.gen_range(0..q)).collect(),
            q,
            is_ntt: false,
        }
    }

    /// Polynomial with discrete Gaussian coefficients
    pub fn sample_gaussian<R: Rng + ?Sized>(
        dim: usize,
        q: u64,
        sampler: &GaussianSampler,
        rng: &mut R,
    ) -> Self {
        Self {
            coeffs: sampler.sample_vec_centered(dim, q, rng),
            q,
            is_ntt: false,
        }
    }

    pub fn dimension(&self) -> usize {
        self.coeffs.len()
    }

    pub fn modulus(&self) -> u64 {
        self.q
    }

    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    pub fn coeff(&self, i: usize) -> u64 {
        self.coeffs[i]
    }

    pub fn set_coeff(&mut self, i: usize, value: u64) {
        self.coeffs[i] = value % self.q;
    }

    pub fn coeffs(&self) -> &[u64] {
        &self.coeffs
    }

    /// Convert to NTT domain
    pub fn to_ntt(&mut self, ctx: &NttContext) {
        if !self.is_ntt {
            ctx.forward(&mut self.coeffs);
            self.is_ntt = true;
        }
    }

    /// Convert from NTT domain to coefficient domain
    pub fn from_ntt(&mut self, ctx: &NttContext) {
        if self.is_ntt {
            ctx.inverse(&mut self.coeffs);
            self.is_ntt = false;
        }
    }

    /// Polynomial multiplication (negacyclic), result in coefficient form
    pub fn mul_ntt(&self, other: &Self, ctx: &NttContext) -> Self {
        assert_eq!(self.q, other.q, "Moduli must match");
        assert_eq!(self.coeffs.len(), other.coeffs.len(), "Dimensions must match");

        let mut a = self.clone();
        let mut b = other.clone();
        a.to_ntt(ctx);
        b.to_ntt(ctx);

        let mut poly = Self::zero_ntt(self.coeffs.len(), self.q);
        ctx.pointwise_mul(&a.coeffs, &b.coeffs, &mut poly.coeffs);
        poly.from_ntt(ctx);
        poly
    }

    /// In-place multiply-accumulate in NTT domain: self += a * b
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, ctx: &NttContext) {
        assert!(
            self.is_ntt && a.is_ntt && b.is_ntt,
            "All polynomials must be in NTT domain"
        );
        assert_eq!(self.q, a.q, "Moduli must match");
        assert_eq!(self.q, b.q, "Moduli must match");

        ctx.pointwise_mul_acc(&mut self.coeffs, &a.coeffs, &b.coeffs);
    }

    /// Multiply every coefficient by a scalar
    pub fn scalar_mul(&self, scalar: u64) -> Self {
        let q = self.q;
        Self {
            coeffs: self.coeffs.iter().map(|&c| ModQ::mul(c, scalar, q)).collect(),
            q,
            is_ntt: self.is_ntt,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0)
    }

    /// Largest centered coefficient magnitude
    pub fn linf_norm(&self) -> u64 {
        assert!(!self.is_ntt, "Cannot compute norm in NTT domain");
        self.coeffs
            .iter()
            .map(|&c| if c <= self.q / 2 { c } else { self.q - c })
            .max()
            .unwrap_or(0)
    }
}

impl Zeroize for Poly {
    fn zeroize(&mut self) {
        self.coeffs.zeroize();
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Self::Output {
        let mut out = self.clone();
        out += rhs;
        out
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Poly) {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let q = self.q;
        for (a, &b) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            let sum = *a + b;
            *a = if sum >= q { sum - q } else { sum };
        }
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Self::Output {
        let mut out = self.clone();
        out -= rhs;
        out
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Poly) {
        assert_eq!(self.q, rhs.q, "Moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let q = self.q;
        for (a, &b) in self.coeffs.iter_mut().zip(&rhs.coeffs) {
            *a = if *a >= b { *a - b } else { q - b + *a };
        }
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Self::Output {
        Poly {
            coeffs: self.coeffs.iter().map(|&c| ModQ::negate(c, self.q)).collect(),
            q: self.q,
            is_ntt: self.is_ntt,
        }
    }
}
