//! Homomorphic hint evaluation
//!
//! The server never sends `H = Db·A`. Instead it splits `H` into small
//! base-B digits ([`decompose`]), packs them into RLWE plaintexts and
//! multiplies them into the client's encrypted secret
//! ([`ParameterContext::apply_hint`]). The client decrypts one small value
//! per (digit, row) and recombines `H·s`.

pub mod context;
pub mod decompose;

pub use context::ParameterContext;
pub use decompose::{decompose, recombine, DecomposedHint, DigitMatrices};
