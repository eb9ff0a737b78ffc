//! Base LWE-PIR engine
//!
//! A single-server PIR over an `L × M` database matrix in the style of
//! SimplePIR. The public matrix `A` is expanded from a [`MatrixSeed`] on
//! both sides; the server's hint `H = Db·A` is what the rest of the crate
//! keeps off the wire.
//!
//! # Example
//!
//! ```
//! use hintless_pir::lwe::{answer, compute_hint, Database, LweClient, MatrixSeed};
//! use hintless_pir::params::LweParams;
//! use rand::SeedableRng;
//!
//! let mut rng = rand_chacha::ChaCha20Rng::seed_from_u64(3);
//! let params = LweParams::default_32(512).with_secret_dim(64);
//! let db = Database::<u32>::random(64, 9, &params, &mut rng).unwrap();
//! let seed = MatrixSeed::random(&mut rng);
//!
//! let client = LweClient::<u32>::new(&seed, db.info()).unwrap();
//! let secret = client.generate_secret(&mut rng);
//! let pre = client.preprocess_query(&secret, &mut rng).unwrap();
//! let query = client.query_preprocessed(5, pre).unwrap();
//! let ans = answer(&db, &query).unwrap();
//! # let _ = (ans, compute_hint(&db, &seed));
//! ```

mod database;
mod engine;
mod matrix;

pub use database::{Database, DbInfo};
pub use engine::{answer, compute_hint, Answer, LweClient, PreprocessedQuery, Query};
pub use matrix::{Matrix, MatrixSeed};
