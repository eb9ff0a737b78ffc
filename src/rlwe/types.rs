//! RLWE ciphertext and key types.

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::math::Poly;

/// RLWE secret key: ternary polynomial in R_Q
///
/// Key material is wiped on drop.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RlweSecretKey {
    /// Secret polynomial in R_Q, coefficient form.
    pub poly: Poly,
}

/// RLWE ciphertext: (a, b) ∈ R_Q × R_Q where b = -a·s + e + Δ·m.
///
/// Both parts are always in the same domain (coefficient or NTT).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RlweCiphertext {
    /// Random polynomial in R_Q.
    pub a: Poly,
    /// Encrypted polynomial: b = -a·s + e + Δ·m.
    pub b: Poly,
}

impl RlweSecretKey {
    /// Creates a secret key from a polynomial.
    pub fn from_poly(poly: Poly) -> Self {
        Self { poly }
    }

    /// Returns the ring dimension.
    pub fn ring_dim(&self) -> usize {
        self.poly.dimension()
    }

    /// Returns the modulus Q.
    pub fn modulus(&self) -> u64 {
        self.poly.modulus()
    }
}

impl Zeroize for RlweSecretKey {
    fn zeroize(&mut self) {
        self.poly.zeroize();
    }
}

impl Drop for RlweSecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl RlweCiphertext {
    /// Returns the ring dimension.
    pub fn ring_dim(&self) -> usize {
        self.a.dimension()
    }

    /// Returns the modulus Q.
    pub fn modulus(&self) -> u64 {
        self.a.modulus()
    }

    pub fn is_ntt(&self) -> bool {
        self.a.is_ntt()
    }

    /// Both parts share dimension, modulus and domain
    ///
    /// Deserialized ciphertexts are not checked on construction.
    pub fn is_well_formed(&self) -> bool {
        self.a.dimension() == self.b.dimension()
            && self.a.modulus() == self.b.modulus()
            && self.a.is_ntt() == self.b.is_ntt()
    }
}
