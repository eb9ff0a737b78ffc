//! Dense matrices over the wrapping ring and the seeded matrix A

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{mismatch, Result};
use crate::math::elem::{dot, Elem};

/// Row-major matrix over Z_{2^w}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Matrix<T: Elem> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Elem> Matrix<T> {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::ZERO; rows * cols],
        }
    }

    /// Wrap row-major data
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(mismatch!(
                "matrix data has {} elements, expected {}x{}",
                data.len(),
                rows,
                cols
            ));
        }
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn get(&self, r: usize, c: usize) -> T {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: T) {
        self.data[r * self.cols + c] = value;
    }

    /// Matrix-vector product, rows computed in parallel
    pub fn mul_vec(&self, v: &[T]) -> Result<Vec<T>> {
        if v.len() != self.cols {
            return Err(mismatch!(
                "vector of length {} against {} columns",
                v.len(),
                self.cols
            ));
        }
        Ok(self
            .data
            .par_chunks(self.cols.max(1))
            .map(|row| dot(row, v))
            .collect())
    }

    /// Matrix product `self × other`, rows of the result computed in parallel
    pub fn mul(&self, other: &Matrix<T>) -> Result<Matrix<T>> {
        if self.cols != other.rows {
            return Err(mismatch!(
                "cannot multiply {}x{} by {}x{}",
                self.rows,
                self.cols,
                other.rows,
                other.cols
            ));
        }
        let n = other.cols;
        let mut out = vec![T::ZERO; self.rows * n];
        out.par_chunks_mut(n.max(1))
            .zip(self.data.par_chunks(self.cols.max(1)))
            .for_each(|(out_row, lhs_row)| {
                for (k, &x) in lhs_row.iter().enumerate() {
                    if x == T::ZERO {
                        continue;
                    }
                    for (o, &y) in out_row.iter_mut().zip(other.row(k)) {
                        *o = o.wrapping_add(x.wrapping_mul(y));
                    }
                }
            });
        Ok(Matrix {
            rows: self.rows,
            cols: n,
            data: out,
        })
    }
}

/// 32-byte seed from which both parties expand the public matrix A
///
/// Client and server must use the same seed; nothing checks this, a
/// mismatch only shows up as garbage decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixSeed(pub [u8; 32]);

impl MatrixSeed {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        Self(seed)
    }

    /// Expand into a uniform `rows × cols` matrix with ChaCha20
    pub fn expand<T: Elem>(&self, rows: usize, cols: usize) -> Matrix<T> {
        let mut rng = ChaCha20Rng::from_seed(self.0);
        let data = (0..rows * cols).map(|_| T::from_u64(rng.next_u64())).collect();
        Matrix { rows, cols, data }
    }
}
