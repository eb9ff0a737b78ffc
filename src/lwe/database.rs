//! Database layout
//!
//! Entries are stored as Z_p elements in an `L × M` matrix. An entry of
//! `bits` bits occupies `ne = ⌈bits / ⌊log2 p⌋⌉` consecutive rows of one
//! column: entry `i` lives in column `i mod M`, rows `(i / M)·ne ..`, least
//! significant digit first. Elements are stored centered (`v - p/2`).

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{invalid_params, mismatch, Error, Result};
use crate::math::Elem;
use crate::params::LweParams;

use super::matrix::Matrix;

/// Shape and encoding of a database, shared with clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbInfo {
    /// Number of logical entries
    pub num_entries: u64,
    /// Bits per entry
    pub bits_per_entry: u32,
    /// Z_p elements per entry
    pub elems_per_entry: usize,
    /// Matrix rows L
    pub rows: usize,
    /// Matrix columns M
    pub cols: usize,
    /// LWE parameters the database was encoded for
    pub params: LweParams,
}

impl DbInfo {
    /// Near-square layout for `num_entries` entries of `bits_per_entry` bits
    pub fn new(num_entries: u64, bits_per_entry: u32, params: &LweParams) -> Result<Self> {
        params.validate()?;
        if num_entries == 0 {
            return Err(invalid_params!("database must hold at least one entry"));
        }
        if bits_per_entry == 0 || bits_per_entry > 64 {
            return Err(invalid_params!("bits per entry must be in 1..=64"));
        }

        let logp = params.bits_per_elem();
        let ne = bits_per_entry.div_ceil(logp) as u64;
        let total = num_entries * ne;

        let mut rows = (total as f64).sqrt().floor() as u64;
        if rows % ne != 0 {
            rows += ne - rows % ne;
        }
        let cols = total.div_ceil(rows);

        Ok(Self {
            num_entries,
            bits_per_entry,
            elems_per_entry: ne as usize,
            rows: rows as usize,
            cols: cols as usize,
            params: params.clone(),
        })
    }

    /// (first row, column) of an entry
    pub fn locate(&self, index: u64) -> Result<(usize, usize)> {
        if index >= self.num_entries {
            return Err(Error::IndexOutOfRange {
                index,
                num: self.num_entries,
            });
        }
        let cols = self.cols as u64;
        let row = (index / cols) as usize * self.elems_per_entry;
        Ok((row, (index % cols) as usize))
    }

    /// Reassemble entry `index` from the decoded column that contains it
    ///
    /// `column` is what a client recovers: one Z_p value per matrix row.
    pub fn entry_from_column(&self, column: &[u64], index: u64) -> Result<u64> {
        if column.len() != self.rows {
            return Err(mismatch!(
                "column has {} values, database has {} rows",
                column.len(),
                self.rows
            ));
        }
        let (row, _) = self.locate(index)?;
        Ok(self.join_digits(&column[row..row + self.elems_per_entry]))
    }

    fn digit_mask(&self) -> u64 {
        (1u64 << self.params.bits_per_elem()) - 1
    }

    fn split_digits(&self, value: u64) -> impl Iterator<Item = u64> + '_ {
        let logp = self.params.bits_per_elem();
        let mask = self.digit_mask();
        (0..self.elems_per_entry).map(move |k| {
            let shift = k as u32 * logp;
            if shift >= 64 {
                0
            } else {
                (value >> shift) & mask
            }
        })
    }

    fn join_digits(&self, digits: &[u64]) -> u64 {
        let logp = self.params.bits_per_elem();
        digits.iter().enumerate().fold(0u64, |acc, (k, &d)| {
            let shift = k as u32 * logp;
            if shift >= 64 {
                acc
            } else {
                acc | ((d & self.digit_mask()) << shift)
            }
        })
    }
}

/// Database matrix in centered Z_p representation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Database<T: Elem> {
    info: DbInfo,
    data: Matrix<T>,
}

impl<T: Elem> Database<T> {
    /// Encode entries into a database
    pub fn from_entries(entries: &[u64], bits_per_entry: u32, params: &LweParams) -> Result<Self> {
        if params.logq != T::BITS {
            return Err(mismatch!(
                "parameters for q = 2^{} used with {}-bit elements",
                params.logq,
                T::BITS
            ));
        }
        let info = DbInfo::new(entries.len() as u64, bits_per_entry, params)?;

        let half_p = T::from_u64(params.p / 2);
        let centered_zero = T::ZERO.wrapping_sub(half_p);
        let mut data = Matrix::from_vec(
            info.rows,
            info.cols,
            vec![centered_zero; info.rows * info.cols],
        )?;

        for (i, &value) in entries.iter().enumerate() {
            if bits_per_entry < 64 && value >> bits_per_entry != 0 {
                return Err(invalid_params!(
                    "entry {} does not fit in {} bits",
                    i,
                    bits_per_entry
                ));
            }
            let (row, col) = info.locate(i as u64)?;
            for (k, digit) in info.split_digits(value).enumerate() {
                data.set(row + k, col, T::from_u64(digit).wrapping_sub(half_p));
            }
        }

        Ok(Self { info, data })
    }

    /// Database of uniformly random entries
    pub fn random<R: Rng + ?Sized>(
        num_entries: u64,
        bits_per_entry: u32,
        params: &LweParams,
        rng: &mut R,
    ) -> Result<Self> {
        let entries: Vec<u64> = (0..num_entries)
            .map(|_| {
                let v: u64 = rng.gen();
                if bits_per_entry >= 64 {
                    v
                } else {
                    v & ((1u64 << bits_per_entry) - 1)
                }
            })
            .collect();
        Self::from_entries(&entries, bits_per_entry, params)
    }

    pub fn info(&self) -> &DbInfo {
        &self.info
    }

    pub fn matrix(&self) -> &Matrix<T> {
        &self.data
    }

    /// Read back entry `index`
    pub fn get(&self, index: u64) -> Result<u64> {
        let (row, col) = self.info.locate(index)?;
        let half_p = T::from_u64(self.info.params.p / 2);
        let digits: Vec<u64> = (0..self.info.elems_per_entry)
            .map(|k| self.data.get(row + k, col).wrapping_add(half_p).to_u64())
            .collect();
        Ok(self.info.join_digits(&digits))
    }

    /// Z_p value at a matrix cell, un-centered
    pub fn elem(&self, row: usize, col: usize) -> u64 {
        let half_p = T::from_u64(self.info.params.p / 2);
        self.data.get(row, col).wrapping_add(half_p).to_u64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_square_layout() {
        let info = DbInfo::new(1 << 20, 9, &LweParams::default_32(512)).unwrap();
        assert_eq!(info.elems_per_entry, 1);
        assert_eq!((info.rows, info.cols), (1024, 1024));
    }

    #[test]
    fn test_wide_entries_span_rows() {
        let params = LweParams::default_32(512);
        let info = DbInfo::new(100, 32, &params).unwrap();
        assert_eq!(info.elems_per_entry, 4);
        assert_eq!(info.rows % 4, 0);
        assert!((info.rows / 4) * info.cols >= 100);
    }

    #[test]
    fn test_get_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let params = LweParams::default_32(512);
        for bits in [1, 9, 20, 64] {
            let entries: Vec<u64> = (0..300u64)
                .map(|_| {
                    let v: u64 = rng.gen();
                    if bits == 64 { v } else { v & ((1 << bits) - 1) }
                })
                .collect();
            let db = Database::<u32>::from_entries(&entries, bits, &params).unwrap();
            for (i, &e) in entries.iter().enumerate() {
                assert_eq!(db.get(i as u64).unwrap(), e);
            }
        }
    }

    #[test]
    fn test_entry_from_column() {
        let params = LweParams::default_64(1 << 16);
        let entries: Vec<u64> = (0..50u64).map(|i| i * 0x0101_0101_0101).collect();
        let db = Database::<u64>::from_entries(&entries, 48, &params).unwrap();
        let info = db.info();

        let index = 17;
        let (_, col) = info.locate(index).unwrap();
        let column: Vec<u64> = (0..info.rows).map(|r| db.elem(r, col)).collect();
        assert_eq!(info.entry_from_column(&column, index).unwrap(), entries[17]);
    }

    #[test]
    fn test_rejects_bad_input() {
        let params = LweParams::default_32(512);
        assert!(Database::<u32>::from_entries(&[1 << 9], 9, &params).is_err());
        assert!(Database::<u64>::from_entries(&[1], 9, &params).is_err());
        assert!(matches!(
            DbInfo::new(10, 9, &params).unwrap().locate(10),
            Err(Error::IndexOutOfRange { index: 10, num: 10 })
        ));
    }
}
