//! Arithmetic primitives
//!
//! Two arithmetic worlds meet in this crate:
//!
//! - **Wrapping rings** Z_{2^32} and Z_{2^64} for the LWE engine, abstracted by [`Elem`]
//! - **Prime-modulus rings** R_Q = Z_Q[X]/(X^N + 1) for the RLWE scheme that
//!   evaluates the hint, with NTT-based multiplication
//!
//! # Example
//!
//! ```
//! use hintless_pir::math::{NttContext, Poly, DEFAULT_Q};
//!
//! let ctx = NttContext::with_default_q(256);
//! let mut poly = Poly::constant(7, 256, DEFAULT_Q);
//! poly.to_ntt(&ctx);
//! poly.from_ntt(&ctx);
//! assert_eq!(poly.coeff(0), 7);
//! ```

pub mod elem;
pub mod modular;
pub mod ntt;
pub mod poly;
pub mod sampler;

pub use elem::Elem;
pub use modular::{ModQ, DEFAULT_Q};
pub use ntt::NttContext;
pub use poly::Poly;
pub use sampler::{GaussianSampler, TernarySampler};
