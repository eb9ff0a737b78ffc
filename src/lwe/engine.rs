//! SimplePIR-style query, answer and decode
//!
//! Client side: `qu = A·s + e + Δ·u_col`, split into a secret-dependent
//! preprocessing step and a cheap index-dependent step.
//! Server side: `ans = Db·qu` and the hint `H = Db·A`.
//! Decoding `ans - H·s = Db·e + Δ·Db[·][col]` rounds away the noise.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid_params, mismatch, Result};
use crate::math::{Elem, GaussianSampler, TernarySampler};
use crate::params::LweParams;

use super::database::{Database, DbInfo};
use super::matrix::{Matrix, MatrixSeed};

/// Encrypted unit vector selecting one database column (length M)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Query<T: Elem> {
    pub data: Vec<T>,
}

/// Server answer: one ciphertext per database row (length L)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Answer<T: Elem> {
    pub data: Vec<T>,
}

/// `A·s + e` for one secret, waiting for an index
///
/// Consumed by [`LweClient::query_preprocessed`]; reusing it for two indices
/// would leak their difference.
#[derive(Debug)]
pub struct PreprocessedQuery<T: Elem> {
    masked: Vec<T>,
}

/// Client half of the base engine
pub struct LweClient<T: Elem> {
    info: DbInfo,
    a: Matrix<T>,
}

impl<T: Elem> LweClient<T> {
    /// Expand A (M × n) from the shared seed
    pub fn new(seed: &MatrixSeed, info: &DbInfo) -> Result<Self> {
        info.params.validate()?;
        if info.params.logq != T::BITS {
            return Err(mismatch!(
                "database encoded for q = 2^{}, client uses {}-bit elements",
                info.params.logq,
                T::BITS
            ));
        }
        Ok(Self {
            info: info.clone(),
            a: seed.expand(info.cols, info.params.secret_dim),
        })
    }

    pub fn info(&self) -> &DbInfo {
        &self.info
    }

    pub fn params(&self) -> &LweParams {
        &self.info.params
    }

    /// Fresh ternary secret of dimension n
    pub fn generate_secret<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<T> {
        TernarySampler.sample_elems(self.info.params.secret_dim, rng)
    }

    /// Compute `A·s + e`
    pub fn preprocess_query<R: Rng + ?Sized>(
        &self,
        secret: &[T],
        rng: &mut R,
    ) -> Result<PreprocessedQuery<T>> {
        let mut masked = self.a.mul_vec(secret)?;
        let noise: Vec<T> =
            GaussianSampler::new(self.info.params.sigma).sample_elems(masked.len(), rng);
        for (m, e) in masked.iter_mut().zip(noise) {
            *m = m.wrapping_add(e);
        }
        Ok(PreprocessedQuery { masked })
    }

    /// Add `Δ` at the column holding entry `index`
    pub fn query_preprocessed(&self, index: u64, pre: PreprocessedQuery<T>) -> Result<Query<T>> {
        let (_, col) = self.info.locate(index)?;
        self.query_column(col, pre)
    }

    /// Add `Δ` at column `col`
    pub fn query_column(&self, col: usize, pre: PreprocessedQuery<T>) -> Result<Query<T>> {
        let mut data = pre.masked;
        if col >= data.len() {
            return Err(mismatch!("column {} outside {} columns", col, data.len()));
        }
        data[col] = data[col].wrapping_add(T::from_u64(self.info.params.delta()));
        Ok(Query { data })
    }

    /// Add `Δ·v` for an arbitrary plaintext vector `v ∈ Z_p^M`
    ///
    /// The answer then carries `Δ·(Db·v)`. Wrapping sums stay exact only when
    /// `Δ·p = 2^w`, so p must be a power of two.
    pub fn query_linear(&self, vector: &[u64], pre: PreprocessedQuery<T>) -> Result<Query<T>> {
        let params = &self.info.params;
        if !params.p.is_power_of_two() {
            return Err(invalid_params!(
                "linear queries need a power-of-two plaintext modulus, got {}",
                params.p
            ));
        }
        let mut data = pre.masked;
        if vector.len() != data.len() {
            return Err(mismatch!(
                "linear query vector has {} elements, database has {} columns",
                vector.len(),
                data.len()
            ));
        }
        let delta = T::from_u64(params.delta());
        for (d, &v) in data.iter_mut().zip(vector) {
            *d = d.wrapping_add(delta.wrapping_mul(T::from_u64(v % params.p)));
        }
        Ok(Query { data })
    }

    /// Decode `ans - H·s` of a linear query to `Db·v mod p`
    ///
    /// The database is stored centered, so the raw rounding yields
    /// `Db·v - (p/2)·Σv`; the offset is added back here.
    pub fn decode_linear(&self, values: &[T], vector: &[u64]) -> Vec<u64> {
        let params = &self.info.params;
        let p = params.p as u128;
        let delta = params.delta() as u128;
        let weight = vector.iter().fold(0u128, |acc, &v| (acc + v as u128 % p) % p);
        let offset = (p / 2) * weight % p;
        values
            .iter()
            .map(|&x| {
                let rounded = ((x.to_u64() as u128 + delta / 2) / delta) % p;
                ((rounded + offset) % p) as u64
            })
            .collect()
    }

    /// Round `Δ·v + noise` to `v ∈ Z_p`, undoing the centering
    pub fn decode(&self, x: T) -> u64 {
        let params = &self.info.params;
        let delta = params.delta() as u128;
        let p = params.p as u128;
        let rounded = ((x.to_u64() as u128 + delta / 2) / delta) % p;
        ((rounded + p / 2) % p) as u64
    }

    /// Decode every row of `ans - H·s`
    pub fn decode_many(&self, values: &[T]) -> Vec<u64> {
        values.iter().map(|&x| self.decode(x)).collect()
    }
}

/// `ans = Db · qu`
pub fn answer<T: Elem>(db: &Database<T>, query: &Query<T>) -> Result<Answer<T>> {
    let start = std::time::Instant::now();
    let data = db.matrix().mul_vec(&query.data)?;
    debug!(rows = data.len(), elapsed = ?start.elapsed(), "answered PIR query");
    Ok(Answer { data })
}

/// `H = Db · A`
pub fn compute_hint<T: Elem>(db: &Database<T>, seed: &MatrixSeed) -> Result<Matrix<T>> {
    let info = db.info();
    let start = std::time::Instant::now();
    let a: Matrix<T> = seed.expand(info.cols, info.params.secret_dim);
    let hint = db.matrix().mul(&a)?;
    debug!(
        rows = hint.rows(),
        cols = hint.cols(),
        elapsed = ?start.elapsed(),
        "computed raw hint"
    );
    Ok(hint)
}
