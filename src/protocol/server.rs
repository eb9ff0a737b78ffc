//! Server orchestration
//!
//! The raw hint is computed and decomposed once at setup. A server built
//! with [`Server::hint_only`] holds no database and only evaluates hints.

use tracing::info;

use crate::error::{mismatch, Error, Result};
use crate::hint::{DecomposedHint, ParameterContext};
use crate::lwe::{self, Answer, Database, DbInfo, Matrix, MatrixSeed, Query};
use crate::math::Elem;
use crate::params::HintParams;

use super::messages::{HintAnswer, QueryWithEncryptedSecret, ServerResponse};
use super::secret::EncryptedSecret;

struct ServerState<T: Elem> {
    db: Option<Database<T>>,
    hint: DecomposedHint,
}

/// PIR server answering queries and hint requests
pub struct Server<T: Elem> {
    context: ParameterContext,
    state: Option<ServerState<T>>,
}

impl<T: Elem> Server<T> {
    /// Full server: computes `H = Db·A`, decomposes it and keeps the database
    pub fn new(db: Database<T>, seed: &MatrixSeed, hint_params: HintParams) -> Result<Self> {
        let start = std::time::Instant::now();
        let raw_hint = lwe::compute_hint(&db, seed)?;
        let mut server = Self::hint_only(&raw_hint, hint_params)?;

        let info = db.info();
        info!(
            entries = info.num_entries,
            rows = info.rows,
            cols = info.cols,
            secret_dim = info.params.secret_dim,
            elapsed = ?start.elapsed(),
            "server ready"
        );
        if let Some(state) = server.state.as_mut() {
            state.db = Some(db);
        }
        Ok(server)
    }

    /// Hint-serving tier: decomposes a raw hint, holds no database
    pub fn hint_only(raw_hint: &Matrix<T>, hint_params: HintParams) -> Result<Self> {
        let context = ParameterContext::new(hint_params)?;
        let hint = DecomposedHint::build(raw_hint, context.params(), context.ntt()?)?;
        Ok(Self {
            context,
            state: Some(ServerState { db: None, hint }),
        })
    }

    fn state(&self) -> Result<&ServerState<T>> {
        self.state.as_ref().ok_or(Error::Released)
    }

    /// Database layout, if this server holds a database
    pub fn info(&self) -> Option<&DbInfo> {
        self.state.as_ref()?.db.as_ref().map(Database::info)
    }

    pub fn decomposed_hint(&self) -> Result<&DecomposedHint> {
        Ok(&self.state()?.hint)
    }

    /// `Db · qu`
    pub fn answer(&self, query: &Query<T>) -> Result<Answer<T>> {
        let db = self
            .state()?
            .db
            .as_ref()
            .ok_or(Error::MissingState("hint-only server holds no database"))?;
        if query.data.len() != db.info().cols {
            return Err(mismatch!(
                "query has {} elements, database has {} columns",
                query.data.len(),
                db.info().cols
            ));
        }
        lwe::answer(db, query)
    }

    /// Evaluate the decomposed hint against an encrypted secret
    pub fn hint_answer(&self, encrypted: &EncryptedSecret) -> Result<HintAnswer> {
        let hint = &self.state()?.hint;
        if encrypted.secret_dim != hint.secret_dim() {
            return Err(mismatch!(
                "encrypted secret has dimension {}, hint was built for {}",
                encrypted.secret_dim,
                hint.secret_dim()
            ));
        }
        let ciphertexts = self.context.apply_hint(hint, &encrypted.ciphertexts)?;
        Ok(HintAnswer {
            rows: hint.rows(),
            ciphertexts,
        })
    }

    /// Answer the PIR query and the hint request together
    pub fn answer_with_hint(&self, query: &QueryWithEncryptedSecret<T>) -> Result<ServerResponse<T>> {
        Ok(ServerResponse {
            answer: self.answer(&query.query)?,
            hint_answer: self.hint_answer(&query.encrypted_secret)?,
        })
    }

    /// Drop the database copy, the decomposed hint and the NTT tables
    ///
    /// Idempotent.
    pub fn release(&mut self) {
        self.state = None;
        self.context.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::LweParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn toy_hint_params() -> HintParams {
        HintParams {
            ring_dim: 256,
            chunk_len: 64,
            plaintext_modulus: 1 << 16,
            ..HintParams::default_32()
        }
    }

    #[test]
    fn test_hint_only_refuses_queries() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let params = LweParams::default_32(512).with_secret_dim(64);
        let db = Database::<u32>::random(100, 9, &params, &mut rng).unwrap();
        let seed = MatrixSeed::random(&mut rng);

        let raw = lwe::compute_hint(&db, &seed).unwrap();
        let server = Server::hint_only(&raw, toy_hint_params()).unwrap();
        assert!(server.info().is_none());

        let query = Query {
            data: vec![0u32; db.info().cols],
        };
        assert!(matches!(server.answer(&query), Err(Error::MissingState(_))));
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let params = LweParams::default_32(512).with_secret_dim(64);
        let db = Database::<u32>::random(100, 9, &params, &mut rng).unwrap();
        let server = Server::new(db, &MatrixSeed::random(&mut rng), toy_hint_params()).unwrap();

        let short = Query { data: vec![0u32; 3] };
        assert!(matches!(server.answer(&short), Err(Error::ParameterMismatch(_))));

        let wrong_dim = EncryptedSecret {
            secret_dim: 128,
            ciphertexts: vec![],
        };
        assert!(matches!(
            server.hint_answer(&wrong_dim),
            Err(Error::ParameterMismatch(_))
        ));
    }

    #[test]
    fn test_release_twice() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let params = LweParams::default_32(512).with_secret_dim(64);
        let db = Database::<u32>::random(100, 9, &params, &mut rng).unwrap();
        let mut server = Server::new(db, &MatrixSeed::random(&mut rng), toy_hint_params()).unwrap();

        server.release();
        server.release();
        assert!(matches!(server.decomposed_hint(), Err(Error::Released)));
    }
}
