//! Parameter sets for the LWE engine and the hint-evaluation scheme
//!
//! Two independent parameter families live here:
//! - [`LweParams`]: the base LWE-PIR scheme (secret dimension, error width,
//!   ring width `2^logq`, plaintext modulus `p`)
//! - [`HintParams`]: the RLWE scheme that evaluates the hint homomorphically
//!   (ring dimension, modulus, plaintext modulus, digit base, chunking)

use serde::{Deserialize, Serialize};

use crate::error::{invalid_params, Result};
use crate::math::DEFAULT_Q;

/// Width of the LWE ring, used as the security-level tag of secrets and clients
///
/// Levels are ordered by width: `Lwe32 < Lwe64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SecurityLevel {
    /// Ciphertext modulus 2^32
    Lwe32,
    /// Ciphertext modulus 2^64
    Lwe64,
}

impl SecurityLevel {
    /// Bit width of ring elements at this level
    pub fn bits(self) -> u32 {
        match self {
            SecurityLevel::Lwe32 => 32,
            SecurityLevel::Lwe64 => 64,
        }
    }

    /// Level for a given element width
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            32 => Some(SecurityLevel::Lwe32),
            64 => Some(SecurityLevel::Lwe64),
            _ => None,
        }
    }

    /// Secret dimension chosen for ternary secrets at this level
    pub fn secret_dim(self) -> usize {
        match self {
            SecurityLevel::Lwe32 => 1408,
            SecurityLevel::Lwe64 => 2048,
        }
    }

    /// LWE error standard deviation at this level
    pub fn sigma(self) -> f64 {
        match self {
            SecurityLevel::Lwe32 => 6.4,
            SecurityLevel::Lwe64 => 81920.0,
        }
    }

    /// Plaintext modulus table: (log2 of the number of LWE samples, p)
    fn plaintext_table(self) -> &'static [(u32, u64)] {
        match self {
            SecurityLevel::Lwe32 => &PLAINTEXT_MODULUS_32,
            SecurityLevel::Lwe64 => &PLAINTEXT_MODULUS_64,
        }
    }
}

/// Largest safe plaintext modulus for 2^k samples at q = 2^32
const PLAINTEXT_MODULUS_32: [(u32, u64); 8] = [
    (13, 991),
    (14, 833),
    (15, 701),
    (16, 589),
    (17, 495),
    (18, 416),
    (19, 350),
    (20, 294),
];

/// Largest safe plaintext modulus for 2^k samples at q = 2^64
const PLAINTEXT_MODULUS_64: [(u32, u64); 9] = [
    (13, 574457),
    (14, 483058),
    (15, 406202),
    (16, 341574),
    (17, 287228),
    (18, 241529),
    (19, 203101),
    (20, 170787),
    (21, 143614),
];

/// Parameters of the base LWE-PIR scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LweParams {
    /// LWE secret dimension n
    pub secret_dim: usize,

    /// Standard deviation of the LWE error
    pub sigma: f64,

    /// log2 of the ciphertext modulus (32 or 64)
    pub logq: u32,

    /// Plaintext modulus p
    pub p: u64,
}

impl LweParams {
    /// Level defaults (n, σ) with a fixed plaintext modulus
    pub fn for_level(level: SecurityLevel, p: u64) -> Self {
        Self {
            secret_dim: level.secret_dim(),
            sigma: level.sigma(),
            logq: level.bits(),
            p,
        }
    }

    /// 32-bit defaults with a fixed plaintext modulus
    pub fn default_32(p: u64) -> Self {
        Self::for_level(SecurityLevel::Lwe32, p)
    }

    /// 64-bit defaults with a fixed plaintext modulus
    pub fn default_64(p: u64) -> Self {
        Self::for_level(SecurityLevel::Lwe64, p)
    }

    /// Level defaults with p looked up from the sample-count table
    ///
    /// `samples` is the number of LWE samples the client publishes, i.e. the
    /// database width M. Counts between table rows round up to the next row.
    pub fn for_samples(level: SecurityLevel, samples: u64) -> Result<Self> {
        let log_samples = samples.max(1).next_power_of_two().trailing_zeros();
        let table = level.plaintext_table();
        let (_, p) = table
            .iter()
            .find(|(log_m, _)| *log_m >= log_samples)
            .ok_or_else(|| {
                invalid_params!("no plaintext modulus known for 2^{} samples", log_samples)
            })?;
        Ok(Self::for_level(level, *p))
    }

    /// Override the secret dimension
    pub fn with_secret_dim(mut self, secret_dim: usize) -> Self {
        self.secret_dim = secret_dim;
        self
    }

    /// Security level tag implied by `logq`
    pub fn level(&self) -> Result<SecurityLevel> {
        SecurityLevel::from_bits(self.logq)
            .ok_or_else(|| invalid_params!("logq must be 32 or 64, got {}", self.logq))
    }

    /// Scaling factor Δ = ⌊2^logq / p⌋
    pub fn delta(&self) -> u64 {
        ((1u128 << self.logq) / self.p as u128) as u64
    }

    /// Bits of an entry carried by one Z_p element: ⌊log2 p⌋
    pub fn bits_per_elem(&self) -> u32 {
        63 - self.p.leading_zeros()
    }

    /// Check that parameters are usable
    pub fn validate(&self) -> Result<()> {
        self.level()?;
        if self.secret_dim == 0 {
            return Err(invalid_params!("secret dimension must be positive"));
        }
        if self.p < 2 {
            return Err(invalid_params!("plaintext modulus must be >= 2"));
        }
        if self.logq < 64 && self.p >= (1u64 << (self.logq / 2)) {
            return Err(invalid_params!(
                "plaintext modulus {} too large for q = 2^{}",
                self.p,
                self.logq
            ));
        }
        if !(self.sigma >= 0.0) {
            return Err(invalid_params!("sigma must be non-negative"));
        }
        Ok(())
    }
}

/// Parameters of the RLWE scheme used to evaluate the hint
///
/// The hint is split into base-`B` digits (`B = 2^digit_bits`); each digit
/// matrix is packed into plaintext polynomials and multiplied into the
/// encrypted secret. The secret is encrypted in chunks of `chunk_len`
/// coordinates, so one plaintext polynomial carries `ring_dim / chunk_len`
/// hint rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HintParams {
    /// Ring dimension N (power of two)
    pub ring_dim: usize,

    /// Ciphertext modulus Q, must satisfy Q ≡ 1 (mod 2N)
    pub q: u64,

    /// Plaintext modulus t
    pub plaintext_modulus: u64,

    /// log2 of the digit base B
    pub digit_bits: u32,

    /// Secret coordinates per ciphertext (power of two dividing N)
    pub chunk_len: usize,

    /// Standard deviation of the RLWE error
    pub sigma: f64,
}

impl HintParams {
    /// Parameters sized for 32-bit LWE secrets of dimension up to 2048
    pub fn default_32() -> Self {
        Self {
            ring_dim: 2048,
            q: DEFAULT_Q,
            plaintext_modulus: 1 << 20,
            digit_bits: 8,
            chunk_len: 128,
            sigma: 3.2,
        }
    }

    /// Parameters sized for 64-bit LWE secrets of dimension up to 2048
    pub fn default_64() -> Self {
        Self {
            plaintext_modulus: 1 << 21,
            ..Self::default_32()
        }
    }

    /// Defaults for a security level
    pub fn for_level(level: SecurityLevel) -> Self {
        match level {
            SecurityLevel::Lwe32 => Self::default_32(),
            SecurityLevel::Lwe64 => Self::default_64(),
        }
    }

    /// Digit base B
    pub fn digit_base(&self) -> u64 {
        1u64 << self.digit_bits
    }

    /// Number of digits needed for `elem_bits`-bit hint entries
    pub fn num_digits(&self, elem_bits: u32) -> usize {
        elem_bits.div_ceil(self.digit_bits) as usize
    }

    /// Scaling factor Δ = ⌊Q/t⌋
    pub fn delta(&self) -> u64 {
        self.q / self.plaintext_modulus
    }

    /// Hint rows packed into one plaintext polynomial
    pub fn rows_per_block(&self) -> usize {
        self.ring_dim / self.chunk_len
    }

    /// Number of ciphertexts needed to encrypt a secret of `secret_dim`
    pub fn num_chunks(&self, secret_dim: usize) -> usize {
        secret_dim.div_ceil(self.chunk_len)
    }

    /// Number of plaintext blocks covering `rows` hint rows
    pub fn num_blocks(&self, rows: usize) -> usize {
        rows.div_ceil(self.rows_per_block())
    }

    /// Worst-case noise after one multiply-accumulate over all chunks
    ///
    /// Every chunk contributes at most N·(B-1)·⌈6σ⌉ (the sampler's tailcut).
    pub fn worst_case_noise(&self, secret_dim: usize) -> u128 {
        let tail = (self.sigma * 6.0).ceil() as u128;
        self.num_chunks(secret_dim) as u128
            * self.ring_dim as u128
            * (self.digit_base() as u128 - 1)
            * tail
    }

    /// Structural checks independent of the secret dimension
    pub fn validate(&self) -> Result<()> {
        if !self.ring_dim.is_power_of_two() {
            return Err(invalid_params!("ring_dim must be a power of two"));
        }
        if self.q % (2 * self.ring_dim as u64) != 1 {
            return Err(invalid_params!("q must be ≡ 1 (mod 2N) for NTT"));
        }
        if !self.chunk_len.is_power_of_two() || self.chunk_len > self.ring_dim {
            return Err(invalid_params!(
                "chunk_len {} must be a power of two no larger than N = {}",
                self.chunk_len,
                self.ring_dim
            ));
        }
        if self.digit_bits == 0 || self.digit_bits > 32 {
            return Err(invalid_params!("digit_bits must be in 1..=32"));
        }
        if self.plaintext_modulus < 2 || self.plaintext_modulus >= self.q {
            return Err(invalid_params!("plaintext modulus must be in [2, q)"));
        }
        Ok(())
    }

    /// Check that hint evaluation against a ternary secret of `secret_dim`
    /// coordinates stays inside the exact-recovery envelope
    ///
    /// Two conditions:
    /// - every recovered inner product `H_i · s` lies in `[-n(B-1), n(B-1)]`,
    ///   which must fit strictly inside `(-t/2, t/2)`
    /// - worst-case noise stays below Δ/2
    pub fn validate_envelope(&self, secret_dim: usize) -> Result<()> {
        self.validate()?;

        let max_inner = secret_dim as u128 * (self.digit_base() as u128 - 1);
        if 2 * max_inner >= self.plaintext_modulus as u128 {
            return Err(invalid_params!(
                "n(B-1) = {} does not fit in plaintext modulus t = {}; lower digit_bits or raise t",
                max_inner,
                self.plaintext_modulus
            ));
        }

        let noise = self.worst_case_noise(secret_dim);
        if 2 * noise >= self.delta() as u128 {
            return Err(invalid_params!(
                "worst-case noise {} exceeds Δ/2 = {}; lower digit_bits or raise Q/t",
                noise,
                self.delta() / 2
            ));
        }
        Ok(())
    }
}

impl Default for HintParams {
    fn default() -> Self {
        Self::default_32()
    }
}
