//! Parameter context: RLWE configuration, NTT tables and the outer key
//!
//! One context per session owner. Resources are released deterministically
//! by [`ParameterContext::release`] (also run on drop); afterwards every
//! operation fails with [`Error::Released`].

use rand::Rng;
use rayon::prelude::*;
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{mismatch, Error, Result};
use crate::math::{Elem, GaussianSampler, ModQ, NttContext, Poly};
use crate::params::HintParams;
use crate::rlwe::{RlweCiphertext, RlweSecretKey};

use super::decompose::DecomposedHint;

struct ContextState {
    ntt: NttContext,
    outer_key: Option<RlweSecretKey>,
}

/// Owner of the RLWE machinery used to evaluate the hint
pub struct ParameterContext {
    params: HintParams,
    sampler: GaussianSampler,
    state: Option<ContextState>,
}

impl ParameterContext {
    /// Validate parameters and build the NTT tables
    pub fn new(params: HintParams) -> Result<Self> {
        params.validate()?;
        let ntt = NttContext::new(params.ring_dim, params.q)?;
        Ok(Self {
            sampler: GaussianSampler::new(params.sigma),
            params,
            state: Some(ContextState {
                ntt,
                outer_key: None,
            }),
        })
    }

    pub fn params(&self) -> &HintParams {
        &self.params
    }

    pub fn is_released(&self) -> bool {
        self.state.is_none()
    }

    fn state(&self) -> Result<&ContextState> {
        self.state.as_ref().ok_or(Error::Released)
    }

    pub fn ntt(&self) -> Result<&NttContext> {
        Ok(&self.state()?.ntt)
    }

    /// Sample a fresh outer key, replacing any previous one
    pub fn generate_outer_key<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<()> {
        let key = RlweSecretKey::generate(self.params.ring_dim, self.params.q, rng);
        self.set_outer_key(key)
    }

    pub fn outer_key(&self) -> Result<&RlweSecretKey> {
        self.state()?
            .outer_key
            .as_ref()
            .ok_or(Error::MissingState("outer key not generated"))
    }

    /// Install an outer key, e.g. one copied from another client
    pub fn set_outer_key(&mut self, key: RlweSecretKey) -> Result<()> {
        if key.ring_dim() != self.params.ring_dim || key.modulus() != self.params.q {
            return Err(mismatch!(
                "outer key lives in ring (N = {}, Q = {}), context uses (N = {}, Q = {})",
                key.ring_dim(),
                key.modulus(),
                self.params.ring_dim,
                self.params.q
            ));
        }
        let state = self.state.as_mut().ok_or(Error::Released)?;
        state.outer_key = Some(key);
        Ok(())
    }

    /// Encrypt a plaintext polynomial (coefficients mod t) under the outer key
    pub fn encrypt<R: Rng + ?Sized>(&self, message: &Poly, rng: &mut R) -> Result<RlweCiphertext> {
        let state = self.state()?;
        let key = self.outer_key()?;
        Ok(RlweCiphertext::encrypt(
            key,
            message,
            self.params.plaintext_modulus,
            &self.sampler,
            &state.ntt,
            rng,
        ))
    }

    /// Reject ciphertexts from another ring or with mismatched parts
    fn check_ciphertext(&self, ct: &RlweCiphertext) -> Result<()> {
        let (n, q) = (self.params.ring_dim, self.params.q);
        if ct.ring_dim() != n || ct.modulus() != q {
            return Err(mismatch!(
                "ciphertext in ring (N = {}, Q = {}), expected (N = {}, Q = {})",
                ct.ring_dim(),
                ct.modulus(),
                n,
                q
            ));
        }
        if !ct.is_well_formed() {
            return Err(mismatch!("ciphertext parts disagree on dimension, modulus or domain"));
        }
        Ok(())
    }

    /// Decrypt to a polynomial with coefficients mod t
    pub fn decrypt(&self, ct: &RlweCiphertext) -> Result<Poly> {
        let state = self.state()?;
        let key = self.outer_key()?;
        self.check_ciphertext(ct)?;
        Ok(ct.decrypt(key, self.params.plaintext_modulus, &state.ntt))
    }

    /// Evaluate the packed hint against an encrypted secret
    ///
    /// Returns ciphertexts indexed `[digit][block]`; block `b` of digit `i`
    /// encrypts `H_i · s` for rows `b·(N/c) ..` at coefficients `k·c + c - 1`.
    /// Every (digit, block) unit is independent and runs on the rayon pool.
    pub fn apply_hint(
        &self,
        hint: &DecomposedHint,
        encrypted: &[RlweCiphertext],
    ) -> Result<Vec<Vec<RlweCiphertext>>> {
        let state = self.state()?;
        let ntt = &state.ntt;
        let n = self.params.ring_dim;
        let q = self.params.q;

        if encrypted.len() != hint.num_chunks() {
            return Err(mismatch!(
                "encrypted secret has {} ciphertexts, hint expects {}",
                encrypted.len(),
                hint.num_chunks()
            ));
        }
        if hint.ring_dim() != n {
            return Err(mismatch!(
                "hint packed for N = {}, context uses N = {}",
                hint.ring_dim(),
                n
            ));
        }
        encrypted.iter().try_for_each(|ct| self.check_ciphertext(ct))?;

        let start = std::time::Instant::now();
        let secret_ntt: Vec<RlweCiphertext> = encrypted
            .par_iter()
            .map(|ct| {
                let mut ct = ct.clone();
                ct.to_ntt(ntt);
                ct
            })
            .collect();

        let num_blocks = hint.num_blocks();
        let flat: Vec<RlweCiphertext> = (0..hint.num_digits() * num_blocks)
            .into_par_iter()
            .map(|unit| {
                let (digit, block) = (unit / num_blocks, unit % num_blocks);
                let mut acc = RlweCiphertext::zero_ntt(n, q);
                for (chunk, ct) in secret_ntt.iter().enumerate() {
                    acc.mul_acc_plain(hint.plaintext(digit, block, chunk), ct, ntt);
                }
                acc.from_ntt(ntt);
                acc
            })
            .collect();

        let mut out = Vec::with_capacity(hint.num_digits());
        let mut iter = flat.into_iter();
        for _ in 0..hint.num_digits() {
            out.push(iter.by_ref().take(num_blocks).collect());
        }
        debug!(
            digits = hint.num_digits(),
            blocks = num_blocks,
            elapsed = ?start.elapsed(),
            "applied hint to encrypted secret"
        );
        Ok(out)
    }

    /// Decrypt a `[digit][block]` hint answer and recombine `H·s = Σ B^i (H_i·s)`
    ///
    /// Every ciphertext is checked against this context's ring before
    /// decryption, so an answer from a server on other parameters is an error.
    pub fn recover_hint_product<T: Elem>(
        &self,
        cts: &[Vec<RlweCiphertext>],
        rows: usize,
    ) -> Result<Vec<T>> {
        let num_digits = self.params.num_digits(T::BITS);
        let num_blocks = self.params.num_blocks(rows);
        if cts.len() != num_digits || cts.iter().any(|d| d.len() != num_blocks) {
            return Err(mismatch!(
                "hint answer shape does not match {} digits x {} blocks",
                num_digits,
                num_blocks
            ));
        }

        let t = self.params.plaintext_modulus;
        let c = self.params.chunk_len;
        let rows_per_block = self.params.rows_per_block();
        let mut out = vec![T::ZERO; rows];

        for (i, digit) in cts.iter().enumerate() {
            let scale = T::from_u128(1u128 << (self.params.digit_bits as usize * i));
            for (b, ct) in digit.iter().enumerate() {
                let plain = self.decrypt(ct)?;
                for k in 0..rows_per_block {
                    let row = b * rows_per_block + k;
                    if row >= rows {
                        break;
                    }
                    let v = ModQ::to_signed(plain.coeff(k * c + c - 1), t);
                    out[row] = out[row].wrapping_add(T::from_i64(v).wrapping_mul(scale));
                }
            }
        }
        Ok(out)
    }

    /// Wipe key material and drop the NTT tables
    ///
    /// Idempotent: a second call does nothing.
    pub fn release(&mut self) {
        if let Some(mut state) = self.state.take() {
            if let Some(key) = state.outer_key.as_mut() {
                key.zeroize();
            }
            debug!(ring_dim = self.params.ring_dim, "released parameter context");
        }
    }
}

impl Drop for ParameterContext {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ParameterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterContext")
            .field("params", &self.params)
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lwe::{Matrix, MatrixSeed};
    use crate::math::TernarySampler;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn toy_params() -> HintParams {
        HintParams {
            ring_dim: 256,
            chunk_len: 64,
            plaintext_modulus: 1 << 16,
            ..HintParams::default_32()
        }
    }

    fn encrypt_chunks(ctx: &ParameterContext, secret: &[u32], rng: &mut ChaCha20Rng) -> Vec<RlweCiphertext> {
        let p = ctx.params();
        let t = p.plaintext_modulus;
        secret
            .chunks(p.chunk_len)
            .map(|chunk| {
                let mut m = Poly::zero(p.ring_dim, t);
                for (j, &s) in chunk.iter().enumerate() {
                    m.set_coeff(j, ModQ::from_signed(s.to_i64(), t));
                }
                ctx.encrypt(&m, rng).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_apply_hint_recovers_product() {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let mut ctx = ParameterContext::new(toy_params()).unwrap();
        ctx.generate_outer_key(&mut rng).unwrap();

        // 10 rows, n = 100 (two chunks, second one partial)
        let hint: Matrix<u32> = MatrixSeed([9u8; 32]).expand(10, 100);
        let packed = DecomposedHint::build(&hint, ctx.params(), ctx.ntt().unwrap()).unwrap();

        let secret: Vec<u32> = TernarySampler.sample_elems(100, &mut rng);
        let encrypted = encrypt_chunks(&ctx, &secret, &mut rng);

        let answer = ctx.apply_hint(&packed, &encrypted).unwrap();
        let recovered: Vec<u32> = ctx.recover_hint_product(&answer, hint.rows()).unwrap();
        assert_eq!(recovered, hint.mul_vec(&secret).unwrap());
    }

    #[test]
    fn test_wrong_chunk_count() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let mut ctx = ParameterContext::new(toy_params()).unwrap();
        ctx.generate_outer_key(&mut rng).unwrap();

        let hint: Matrix<u32> = MatrixSeed([1u8; 32]).expand(4, 128);
        let packed = DecomposedHint::build(&hint, ctx.params(), ctx.ntt().unwrap()).unwrap();
        let secret: Vec<u32> = TernarySampler.sample_elems(64, &mut rng);
        let encrypted = encrypt_chunks(&ctx, &secret, &mut rng);

        assert!(matches!(
            ctx.apply_hint(&packed, &encrypted),
            Err(Error::ParameterMismatch(_))
        ));
    }

    #[test]
    fn test_answer_from_other_ring_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let mut ours = ParameterContext::new(toy_params()).unwrap();
        ours.generate_outer_key(&mut rng).unwrap();
        let mut theirs = ParameterContext::new(HintParams {
            ring_dim: 512,
            chunk_len: 128,
            ..toy_params()
        })
        .unwrap();
        theirs.generate_outer_key(&mut rng).unwrap();

        // Same digit and block counts in both contexts: 8 rows, 4 rows per block
        let hint: Matrix<u32> = MatrixSeed([3u8; 32]).expand(8, 64);
        let packed = DecomposedHint::build(&hint, theirs.params(), theirs.ntt().unwrap()).unwrap();
        let secret: Vec<u32> = TernarySampler.sample_elems(64, &mut rng);
        let encrypted = encrypt_chunks(&theirs, &secret, &mut rng);
        let answer = theirs.apply_hint(&packed, &encrypted).unwrap();

        assert!(matches!(
            ours.recover_hint_product::<u32>(&answer, 8),
            Err(Error::ParameterMismatch(_))
        ));
        assert!(matches!(
            ours.apply_hint(&packed, &encrypted),
            Err(Error::ParameterMismatch(_))
        ));
    }

    #[test]
    fn test_malformed_ciphertext_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let mut ctx = ParameterContext::new(toy_params()).unwrap();
        ctx.generate_outer_key(&mut rng).unwrap();
        let q = ctx.params().q;

        let short_b = RlweCiphertext {
            a: Poly::zero(256, q),
            b: Poly::zero(128, q),
        };
        assert!(matches!(ctx.decrypt(&short_b), Err(Error::ParameterMismatch(_))));

        let other_modulus = RlweCiphertext {
            a: Poly::zero(256, q),
            b: Poly::zero(256, 1 << 16),
        };
        assert!(matches!(ctx.decrypt(&other_modulus), Err(Error::ParameterMismatch(_))));
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let mut ctx = ParameterContext::new(toy_params()).unwrap();
        ctx.generate_outer_key(&mut rng).unwrap();

        ctx.release();
        assert!(ctx.is_released());
        ctx.release();
        assert!(ctx.is_released());

        assert!(matches!(ctx.ntt(), Err(Error::Released)));
        assert!(matches!(ctx.outer_key(), Err(Error::Released)));
        let m = Poly::zero(256, 1 << 16);
        assert!(matches!(ctx.encrypt(&m, &mut rng), Err(Error::Released)));
    }

    #[test]
    fn test_missing_outer_key() {
        let ctx = ParameterContext::new(toy_params()).unwrap();
        let m = Poly::zero(256, 1 << 16);
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        assert!(matches!(ctx.encrypt(&m, &mut rng), Err(Error::MissingState(_))));
    }

    #[test]
    fn test_foreign_outer_key_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut ctx = ParameterContext::new(toy_params()).unwrap();
        let key = RlweSecretKey::generate(512, toy_params().q, &mut rng);
        assert!(matches!(ctx.set_outer_key(key), Err(Error::ParameterMismatch(_))));
    }
}
