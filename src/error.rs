//! Error type shared by every protocol layer
//!
//! Only failures the protocol can actually observe are represented here.
//! Mismatched matrix seeds, a hint answer recovered for a different session,
//! or a stale secret are NOT detected: they surface as wrong decoded values.
//! Callers must keep the pairing of secret, query and hint answer themselves.

use thiserror::Error;

/// Errors raised by the hint-compression protocol
#[derive(Debug, Error)]
pub enum Error {
    /// Operation that can never succeed, e.g. deriving a secret for a larger
    /// security level than its source
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Parameters rejected by validation
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Shapes that do not line up (ciphertext counts, dimensions, rings)
    #[error("parameter mismatch: {0}")]
    ParameterMismatch(String),

    /// A protocol step was invoked before the step it depends on
    #[error("missing state: {0}")]
    MissingState(&'static str),

    /// The parameter context was already torn down
    #[error("parameter context has been released")]
    Released,

    /// Database index outside the addressable range
    #[error("index {index} out of range (database holds {num} entries)")]
    IndexOutOfRange { index: u64, num: u64 },

    /// Encoding failure while measuring artifact sizes
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Build an [`Error::InvalidParams`] with format string support
macro_rules! invalid_params {
    ($($arg:tt)*) => {
        $crate::error::Error::InvalidParams(format!($($arg)*))
    };
}

/// Build an [`Error::ParameterMismatch`] with format string support
macro_rules! mismatch {
    ($($arg:tt)*) => {
        $crate::error::Error::ParameterMismatch(format!($($arg)*))
    };
}

pub(crate) use invalid_params;
pub(crate) use mismatch;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macro_formats_message() {
        let err = invalid_params!("digit base {} is not a power of two", 6);
        assert_eq!(
            err.to_string(),
            "invalid parameters: digit base 6 is not a power of two"
        );

        let err = mismatch!("expected {} ciphertexts, got {}", 4, 3);
        assert!(matches!(err, Error::ParameterMismatch(_)));
    }

    #[test]
    fn test_index_error_display() {
        let err = Error::IndexOutOfRange { index: 10, num: 8 };
        assert_eq!(
            err.to_string(),
            "index 10 out of range (database holds 8 entries)"
        );
    }
}
