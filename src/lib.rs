//! Hintless PIR: LWE-based PIR with homomorphically compressed hints
//!
//! SimplePIR-style retrieval normally requires the client to download the
//! server's hint `H = Db × A` before it can decode any answer. This crate
//! replaces that download: the client encrypts its LWE secret `s` under an
//! RLWE scheme, the server evaluates `H × s` homomorphically over a
//! digit-decomposed copy of its hint, and the client decrypts the result to
//! cancel the structured part of the PIR answer.
//!
//! Key components:
//! - `lwe`: base LWE-PIR engine (seeded matrix A, database, query/answer/decode)
//! - `rlwe`: RLWE encryption with plaintext × ciphertext multiply-accumulate
//! - `hint`: digit decomposition of the hint and the parameter context that
//!   evaluates it against an encrypted secret
//! - `protocol`: client and server orchestration, secret management
//! - `distributed`: one secret fanned out over independently seeded shards
//!
//! # Example
//!
//! ```ignore
//! use hintless_pir::lwe::{Database, MatrixSeed};
//! use hintless_pir::params::{HintParams, LweParams};
//! use hintless_pir::protocol::{Client, Server};
//!
//! let lwe = LweParams::default_32(512);
//! let db = Database::<u32>::random(1 << 12, 9, &lwe, &mut rng)?;
//! let seed = MatrixSeed::random(&mut rng);
//!
//! let mut client = Client::<u32>::new(&seed, db.info(), HintParams::default_32())?;
//! let server = Server::new(db, &seed, HintParams::default_32())?;
//!
//! let query = client.query_with_encrypted_secret(7)?;
//! let response = server.answer_with_hint(&query)?;
//! let column = client.recover_with_hint(&response)?;
//! ```

pub mod error;
pub mod params;
pub mod math;
pub mod lwe;
pub mod rlwe;
pub mod hint;
pub mod protocol;
pub mod distributed;

pub use error::{Error, Result};
pub use params::{HintParams, LweParams, SecurityLevel};
pub use math::Elem;
pub use lwe::{Database, DbInfo, MatrixSeed};
pub use hint::{DecomposedHint, ParameterContext};
pub use protocol::{
    Client, EncryptedSecret, HintAnswer, QueryWithEncryptedSecret, Secret, Server,
    ServerResponse, SizeReport,
};
pub use distributed::{DistributedClient, DistributedQuery, ShardServers, ShardSpec, ShardTable};
