//! Messages exchanged between client and server, with size accounting

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::lwe::{Answer, Query};
use crate::math::Elem;
use crate::rlwe::RlweCiphertext;

use super::secret::EncryptedSecret;

/// PIR query bundled with the encrypted secret it was built from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct QueryWithEncryptedSecret<T: Elem> {
    pub query: Query<T>,
    pub encrypted_secret: EncryptedSecret,
}

/// Encrypted `H_i · s`, indexed `[digit][block]`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintAnswer {
    /// Number of hint rows L covered by the blocks
    pub rows: usize,
    pub ciphertexts: Vec<Vec<RlweCiphertext>>,
}

/// PIR answer together with the hint answer for the same secret
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ServerResponse<T: Elem> {
    pub answer: Answer<T>,
    pub hint_answer: HintAnswer,
}

/// Encoded sizes of the two halves of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeReport {
    /// Bytes of the PIR query or answer
    pub pir_bytes: u64,
    /// Bytes of the encrypted secret or hint ciphertexts
    pub hint_bytes: u64,
}

impl SizeReport {
    pub fn total_bytes(&self) -> u64 {
        self.pir_bytes + self.hint_bytes
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PIR={:.1} KB, hint={:.1} KB, total={:.1} KB",
            self.pir_bytes as f64 / 1024.0,
            self.hint_bytes as f64 / 1024.0,
            self.total_bytes() as f64 / 1024.0
        )
    }
}

impl<T: Elem> QueryWithEncryptedSecret<T> {
    /// bincode-encoded size of the query and of the encrypted secret
    pub fn size_report(&self) -> Result<SizeReport> {
        Ok(SizeReport {
            pir_bytes: bincode::serialized_size(&self.query)?,
            hint_bytes: bincode::serialized_size(&self.encrypted_secret)?,
        })
    }
}

impl<T: Elem> ServerResponse<T> {
    /// bincode-encoded size of the answer and of the hint ciphertexts
    pub fn size_report(&self) -> Result<SizeReport> {
        Ok(SizeReport {
            pir_bytes: bincode::serialized_size(&self.answer)?,
            hint_bytes: bincode::serialized_size(&self.hint_answer)?,
        })
    }
}
