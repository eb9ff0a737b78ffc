//! RLWE encryption over R_Q = Z_Q[X]/(X^N + 1)
//!
//! The homomorphic primitive used to evaluate the hint against an encrypted
//! LWE secret:
//! - Secret key s: ternary polynomial
//! - Ciphertext (a, b) encrypts m ∈ R_t as b = -a·s + e + Δ·m, Δ = ⌊Q/t⌋
//! - Plaintext × ciphertext products are accumulated in the NTT domain
//!
//! # Example
//!
//! ```
//! use hintless_pir::math::{GaussianSampler, NttContext, Poly, DEFAULT_Q};
//! use hintless_pir::rlwe::{RlweCiphertext, RlweSecretKey};
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(1);
//! let ctx = NttContext::with_default_q(256);
//! let sampler = GaussianSampler::new(3.2);
//! let t = 1 << 16;
//!
//! let sk = RlweSecretKey::generate(256, DEFAULT_Q, &mut rng);
//! let msg = Poly::constant(5, 256, t);
//! let ct = RlweCiphertext::encrypt(&sk, &msg, t, &sampler, &ctx, &mut rng);
//! assert_eq!(ct.decrypt(&sk, t, &ctx).coeff(0), 5);
//! ```

mod enc;
mod types;

pub use types::{RlweCiphertext, RlweSecretKey};
