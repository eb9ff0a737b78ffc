//! Base-B digit decomposition of the hint and packing into plaintexts
//!
//! `H = Σ_i B^i H_i` with `0 ≤ H_i[r][j] < B`. Each digit matrix is packed so
//! that a single plaintext × ciphertext product computes `N / c` row inner
//! products at once:
//!
//! ```text
//! slot k of block b holds row r = b·(N/c) + k
//! coefficient k·c + (c-1-j)  ←  H_i[r][m·c + j]     (plaintext for chunk m)
//! ```
//!
//! Multiplying by chunk m's secret polynomial `Σ_j s[m·c + j] X^j` puts
//! `Σ_j H_i[r][m·c + j]·s[m·c + j]` at coefficient `k·c + c - 1`. Negacyclic
//! wraparound only reaches positions below `c - 1`, so the slots never collide.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid_params, mismatch, Result};
use crate::lwe::Matrix;
use crate::math::{Elem, NttContext, Poly};
use crate::params::HintParams;

/// Digit matrices of a hint, least significant digit first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitMatrices {
    pub rows: usize,
    pub cols: usize,
    pub digit_bits: u32,
    /// `digits[i]` is `H_i` in row-major order
    pub digits: Vec<Vec<u64>>,
}

/// Split every hint entry into base-`2^digit_bits` digits
///
/// The base is a power of two, which is why it is given as a bit count.
/// Digits are then plain shift-and-mask slices of the entry, and
/// `Σ 2^(k·i)·H_i` recombines exactly under wrapping arithmetic mod 2^w.
/// The top digit may be narrower than `digit_bits` when `k` does not divide `w`.
pub fn decompose<T: Elem>(hint: &Matrix<T>, digit_bits: u32) -> DigitMatrices {
    let num_digits = T::BITS.div_ceil(digit_bits) as usize;
    let mask = if digit_bits >= 64 {
        u64::MAX
    } else {
        (1u64 << digit_bits) - 1
    };

    let digits = (0..num_digits)
        .into_par_iter()
        .map(|i| {
            let shift = digit_bits * i as u32;
            hint.data()
                .iter()
                .map(|&x| (x.to_u64() >> shift) & mask)
                .collect::<Vec<u64>>()
        })
        .collect();

    DigitMatrices {
        rows: hint.rows(),
        cols: hint.cols(),
        digit_bits,
        digits,
    }
}

/// Inverse of [`decompose`]: `Σ_i B^i H_i` in the wrapping ring
pub fn recombine<T: Elem>(digits: &DigitMatrices) -> Result<Matrix<T>> {
    let len = digits.rows * digits.cols;
    let mut out = vec![T::ZERO; len];
    for (i, digit) in digits.digits.iter().enumerate() {
        if digit.len() != len {
            return Err(mismatch!("digit {} has {} entries, expected {}", i, digit.len(), len));
        }
        let scale = T::from_u128(1u128 << (digits.digit_bits as usize * i).min(127));
        for (o, &d) in out.iter_mut().zip(digit) {
            *o = o.wrapping_add(T::from_u64(d).wrapping_mul(scale));
        }
    }
    Matrix::from_vec(digits.rows, digits.cols, out)
}

/// Hint digits packed into NTT-form plaintexts, ready for [`ParameterContext::apply_hint`]
///
/// [`ParameterContext::apply_hint`]: super::ParameterContext::apply_hint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposedHint {
    rows: usize,
    secret_dim: usize,
    num_digits: usize,
    num_blocks: usize,
    num_chunks: usize,
    /// Indexed `(digit, block, chunk)` in row-major order
    plaintexts: Vec<Poly>,
}

impl DecomposedHint {
    /// Decompose and pack a raw hint `H` (L × n)
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParams`](crate::Error::InvalidParams) if `n`
    /// falls outside the exact-recovery envelope of `params`, or
    /// [`Error::ParameterMismatch`](crate::Error::ParameterMismatch) if the
    /// NTT context does not match `params`.
    pub fn build<T: Elem>(hint: &Matrix<T>, params: &HintParams, ntt: &NttContext) -> Result<Self> {
        params.validate_envelope(hint.cols())?;
        if ntt.dimension() != params.ring_dim || ntt.modulus() != params.q {
            return Err(mismatch!(
                "NTT context (N = {}, Q = {}) does not match hint parameters",
                ntt.dimension(),
                ntt.modulus()
            ));
        }
        if hint.rows() == 0 {
            return Err(invalid_params!("hint has no rows"));
        }

        let start = std::time::Instant::now();
        let digits = decompose(hint, params.digit_bits);
        let packed = Self::pack(&digits, params, ntt);
        debug!(
            rows = hint.rows(),
            digits = packed.num_digits,
            blocks = packed.num_blocks,
            chunks = packed.num_chunks,
            elapsed = ?start.elapsed(),
            "decomposed hint"
        );
        Ok(packed)
    }

    fn pack(digits: &DigitMatrices, params: &HintParams, ntt: &NttContext) -> Self {
        let n = params.ring_dim;
        let c = params.chunk_len;
        let q = params.q;
        let rows_per_block = params.rows_per_block();
        let num_digits = digits.digits.len();
        let num_blocks = params.num_blocks(digits.rows);
        let num_chunks = params.num_chunks(digits.cols);

        let plaintexts = (0..num_digits * num_blocks)
            .into_par_iter()
            .flat_map_iter(|unit| {
                let digit = &digits.digits[unit / num_blocks];
                let block = unit % num_blocks;
                (0..num_chunks).map(move |m| {
                    let mut coeffs = vec![0u64; n];
                    for k in 0..rows_per_block {
                        let row = block * rows_per_block + k;
                        if row >= digits.rows {
                            break;
                        }
                        let row_data = &digit[row * digits.cols..(row + 1) * digits.cols];
                        for j in 0..c {
                            let col = m * c + j;
                            if col >= digits.cols {
                                break;
                            }
                            coeffs[k * c + (c - 1 - j)] = row_data[col];
                        }
                    }
                    let mut pt = Poly::from_coeffs(coeffs, q);
                    pt.to_ntt(ntt);
                    pt
                })
            })
            .collect();

        Self {
            rows: digits.rows,
            secret_dim: digits.cols,
            num_digits,
            num_blocks,
            num_chunks,
            plaintexts,
        }
    }

    /// Hint rows L
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Secret dimension n the hint was computed for
    pub fn secret_dim(&self) -> usize {
        self.secret_dim
    }

    /// Ring dimension of the packed plaintexts
    pub fn ring_dim(&self) -> usize {
        self.plaintexts.first().map_or(0, Poly::dimension)
    }

    pub fn num_digits(&self) -> usize {
        self.num_digits
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    /// Plaintext for one (digit, block, chunk)
    pub fn plaintext(&self, digit: usize, block: usize, chunk: usize) -> &Poly {
        &self.plaintexts[(digit * self.num_blocks + block) * self.num_chunks + chunk]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lwe::MatrixSeed;

    #[test]
    fn test_recombination_law() {
        let hint32: Matrix<u32> = MatrixSeed([3u8; 32]).expand(9, 13);
        for bits in [1, 5, 8, 12, 32] {
            let digits = decompose(&hint32, bits);
            assert_eq!(digits.digits.len(), 32usize.div_ceil(bits as usize));
            assert!(digits.digits.iter().flatten().all(|&d| d < (1u64 << bits)));
            assert_eq!(recombine::<u32>(&digits).unwrap(), hint32);
        }

        let hint64: Matrix<u64> = MatrixSeed([4u8; 32]).expand(9, 13);
        for bits in [7, 8, 16] {
            let digits = decompose(&hint64, bits);
            assert_eq!(recombine::<u64>(&digits).unwrap(), hint64);
        }
    }

    #[test]
    fn test_top_digit_is_narrow() {
        // 32 = 12 + 12 + 8
        let hint: Matrix<u32> = Matrix::from_vec(1, 2, vec![u32::MAX, 0x8000_0001]).unwrap();
        let digits = decompose(&hint, 12);
        assert_eq!(digits.digits.len(), 3);
        assert_eq!(digits.digits[0], vec![0xfff, 0x001]);
        assert_eq!(digits.digits[2], vec![0xff, 0x80]);
        assert_eq!(recombine::<u32>(&digits).unwrap(), hint);
    }

    #[test]
    fn test_packing_layout() {
        let params = HintParams {
            ring_dim: 16,
            chunk_len: 4,
            plaintext_modulus: 1 << 12,
            ..HintParams::default_32()
        };
        let ntt = NttContext::new(16, params.q).unwrap();
        // 6 rows, 6 cols: 2 blocks of 4 slots, 2 chunks
        let data: Vec<u32> = (0..36).collect();
        let hint = Matrix::from_vec(6, 6, data).unwrap();

        let packed = DecomposedHint::build(&hint, &params, &ntt).unwrap();
        assert_eq!(packed.num_digits(), 4);
        assert_eq!(packed.num_blocks(), 2);
        assert_eq!(packed.num_chunks(), 2);

        // Row 5 sits in block 1, slot 1; chunk 1 covers cols 4, 5
        let mut pt = packed.plaintext(0, 1, 1).clone();
        pt.from_ntt(&ntt);
        assert_eq!(pt.coeff(4 + 3), 5 * 6 + 4);
        assert_eq!(pt.coeff(4 + 2), 5 * 6 + 5);
        assert_eq!(pt.coeff(4 + 1), 0);
        // Slots 2, 3 of block 1 are padding
        assert!(pt.coeffs()[8..].iter().all(|&x| x == 0));
    }

    #[test]
    fn test_build_rejects_envelope_violation() {
        let params = HintParams {
            digit_bits: 16,
            ..HintParams::default_32()
        };
        let ntt = NttContext::new(params.ring_dim, params.q).unwrap();
        let hint: Matrix<u32> = MatrixSeed([0u8; 32]).expand(4, 1408);
        assert!(DecomposedHint::build(&hint, &params, &ntt).is_err());
    }
}
