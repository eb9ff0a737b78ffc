//! Secret manager: generate, encrypt and derive LWE secrets
//!
//! A [`Secret`] is tagged with the security level of its element type.
//! Deriving a secret for another client compares the two (level, dimension)
//! tags and resolves a [`Derivation`]; only same-level copies and
//! downgrades are possible.

use rand::Rng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::{Error, Result};
use crate::hint::ParameterContext;
use crate::math::{Elem, ModQ, Poly, TernarySampler};
use crate::params::SecurityLevel;
use crate::rlwe::RlweCiphertext;

/// Ternary LWE secret, wiped on drop
#[derive(Clone, PartialEq, Eq)]
pub struct Secret<T: Elem> {
    coeffs: Vec<T>,
}

impl<T: Elem> Secret<T> {
    /// Fresh uniform ternary secret
    pub fn generate<R: Rng + ?Sized>(dim: usize, rng: &mut R) -> Self {
        Self {
            coeffs: TernarySampler.sample_elems(dim, rng),
        }
    }

    pub fn from_coeffs(coeffs: Vec<T>) -> Self {
        Self { coeffs }
    }

    pub fn level(&self) -> SecurityLevel {
        T::LEVEL
    }

    pub fn dim(&self) -> usize {
        self.coeffs.len()
    }

    pub fn coeffs(&self) -> &[T] {
        &self.coeffs
    }

    /// Derive a secret of dimension `target_dim` at this type's level from `source`
    ///
    /// # Errors
    ///
    /// [`Error::InvalidOperation`] if the target is wider or longer than the source.
    pub fn derive_from<U: Elem>(source: &Secret<U>, target_dim: usize) -> Result<Self> {
        let derivation =
            Derivation::resolve((U::LEVEL, source.dim()), (T::LEVEL, target_dim))?;
        let coeffs = match derivation {
            Derivation::SameLevel => source
                .coeffs
                .iter()
                .map(|&x| T::from_u64(x.to_u64()))
                .collect(),
            Derivation::Downgrade { drop } => source.coeffs[..source.dim() - drop]
                .iter()
                .map(|&x| T::from_u64(x.to_u64()))
                .collect(),
        };
        Ok(Self { coeffs })
    }
}

impl<T: Elem> std::fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("level", &T::LEVEL)
            .field("dim", &self.coeffs.len())
            .finish_non_exhaustive()
    }
}

impl<T: Elem> Drop for Secret<T> {
    fn drop(&mut self) {
        self.coeffs.zeroize();
    }
}

/// How a secret moves from one (level, dimension) to another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Same width and dimension: verbatim copy
    SameLevel,
    /// Narrower width and/or smaller dimension: truncate each coordinate to
    /// the target width and drop `drop` trailing coordinates
    Downgrade { drop: usize },
}

impl Derivation {
    /// Compare (level, dimension) tags of source and target
    pub fn resolve(source: (SecurityLevel, usize), target: (SecurityLevel, usize)) -> Result<Self> {
        let (src_level, src_dim) = source;
        let (dst_level, dst_dim) = target;

        if dst_level > src_level || dst_dim > src_dim {
            return Err(Error::InvalidOperation(format!(
                "cannot derive a {:?} secret of dimension {} from a {:?} secret of dimension {}",
                dst_level, dst_dim, src_level, src_dim
            )));
        }
        if dst_level == src_level && dst_dim == src_dim {
            Ok(Derivation::SameLevel)
        } else {
            Ok(Derivation::Downgrade {
                drop: src_dim - dst_dim,
            })
        }
    }
}

/// LWE secret encrypted chunk by chunk under the outer RLWE key
///
/// Ciphertext `k` encrypts `Σ_{j<c} s[k·c + j] X^j`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedSecret {
    /// Dimension n of the encrypted secret
    pub secret_dim: usize,
    pub ciphertexts: Vec<RlweCiphertext>,
}

/// Encrypt an existing secret under the context's outer key
pub fn encrypt_secret<T: Elem, R: Rng + ?Sized>(
    secret: &Secret<T>,
    ctx: &ParameterContext,
    rng: &mut R,
) -> Result<EncryptedSecret> {
    let params = ctx.params();
    let t = params.plaintext_modulus;

    let ciphertexts = secret
        .coeffs()
        .chunks(params.chunk_len)
        .map(|chunk| {
            let mut message = Poly::zero(params.ring_dim, t);
            for (j, &s) in chunk.iter().enumerate() {
                message.set_coeff(j, ModQ::from_signed(s.to_i64(), t));
            }
            let ct = ctx.encrypt(&message, rng);
            message.zeroize();
            ct
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(EncryptedSecret {
        secret_dim: secret.dim(),
        ciphertexts,
    })
}

/// Fresh secret plus fresh outer key; returns the secret and its encryption
pub fn generate_and_encrypt<T: Elem, R: Rng + ?Sized>(
    dim: usize,
    ctx: &mut ParameterContext,
    rng: &mut R,
) -> Result<(Secret<T>, EncryptedSecret)> {
    ctx.generate_outer_key(rng)?;
    let secret = Secret::generate(dim, rng);
    let encrypted = encrypt_secret(&secret, ctx, rng)?;
    Ok((secret, encrypted))
}
