//! RLWE encryption, decryption and plaintext multiply-accumulate

use rand::Rng;

use crate::math::{GaussianSampler, ModQ, NttContext, Poly, TernarySampler};

use super::types::{RlweCiphertext, RlweSecretKey};

impl RlweSecretKey {
    /// Generate a ternary secret key
    pub fn generate<R: Rng + ?Sized>(ring_dim: usize, q: u64, rng: &mut R) -> Self {
        let coeffs: Vec<i64> = (0..ring_dim).map(|_| TernarySampler.sample(rng)).collect();
        Self {
            poly: Poly::from_signed(&coeffs, q),
        }
    }
}

impl RlweCiphertext {
    /// Encrypt a message polynomial with coefficients in Z_t
    ///
    /// Computes (a, b) with b = -a·s + e + Δ·m. Message coefficients are
    /// lifted to their centered representative before scaling, so small
    /// negative plaintexts do not pick up the Q mod t rounding error.
    ///
    /// # Arguments
    /// * `sk` - Secret key
    /// * `message` - Message polynomial (modulus t, coefficients in [0, t))
    /// * `t` - Plaintext modulus
    /// * `sampler` - Error distribution
    /// * `ctx` - NTT context for polynomial multiplication
    /// * `rng` - Randomness for `a` and `e`
    pub fn encrypt<R: Rng + ?Sized>(
        sk: &RlweSecretKey,
        message: &Poly,
        t: u64,
        sampler: &GaussianSampler,
        ctx: &NttContext,
        rng: &mut R,
    ) -> Self {
        let q = ctx.modulus();
        let n = ctx.dimension();
        let delta = q / t;

        let a = Poly::random(n, q, rng);
        let error = Poly::sample_gaussian(n, q, sampler, rng);

        // Δ·m on the centered lift of m
        let scaled: Vec<u64> = message
            .coeffs()
            .iter()
            .map(|&m| {
                let centered = ModQ::to_signed(m % t, t);
                ModQ::from_signed(centered, q)
            })
            .collect();
        let scaled_msg = Poly::from_coeffs(scaled, q).scalar_mul(delta);

        // b = -a·s + e + Δ·m
        let neg_a_s = -&a.mul_ntt(&sk.poly, ctx);
        let b = &(&neg_a_s + &error) + &scaled_msg;

        Self { a, b }
    }

    /// Decrypt to a message polynomial with coefficients in [0, t)
    ///
    /// Computes m = ⌊t·(b + a·s) / Q⌉ mod t. Works on ciphertexts in either
    /// domain.
    pub fn decrypt(&self, sk: &RlweSecretKey, t: u64, ctx: &NttContext) -> Poly {
        let q = ctx.modulus();
        let mut ct = self.clone();
        ct.from_ntt(ctx);

        // b + a·s = e + Δ·m
        let a_s = ct.a.mul_ntt(&sk.poly, ctx);
        let noisy = &a_s + &ct.b;

        let coeffs: Vec<u64> = noisy
            .coeffs()
            .iter()
            .map(|&x| {
                let scaled = (x as u128 * t as u128 + q as u128 / 2) / q as u128;
                (scaled % t as u128) as u64
            })
            .collect();

        Poly::from_coeffs(coeffs, t)
    }

    /// Encryption of zero with zero error, in NTT form
    ///
    /// Identity for [`mul_acc_plain`](Self::mul_acc_plain).
    pub fn zero_ntt(ring_dim: usize, q: u64) -> Self {
        Self {
            a: Poly::zero_ntt(ring_dim, q),
            b: Poly::zero_ntt(ring_dim, q),
        }
    }

    /// Convert both parts to the NTT domain
    pub fn to_ntt(&mut self, ctx: &NttContext) {
        self.a.to_ntt(ctx);
        self.b.to_ntt(ctx);
    }

    /// Convert both parts to the coefficient domain
    pub fn from_ntt(&mut self, ctx: &NttContext) {
        self.a.from_ntt(ctx);
        self.b.from_ntt(ctx);
    }

    /// Plaintext multiply-accumulate: `self += plaintext · ct`
    ///
    /// All three operands must already be in the NTT domain. The plaintext is
    /// an unscaled polynomial over Z_Q, so the result encrypts the product
    /// `plaintext · m` with noise grown by `plaintext · e`.
    pub fn mul_acc_plain(&mut self, plaintext: &Poly, ct: &RlweCiphertext, ctx: &NttContext) {
        self.a.mul_acc_ntt_domain(plaintext, &ct.a, ctx);
        self.b.mul_acc_ntt_domain(plaintext, &ct.b, ctx);
    }
}
