//! Client orchestration
//!
//! Session order:
//! 1. a secret is generated (and encrypted) by [`Client::query_with_encrypted_secret`]
//!    or [`Client::hint_query`], or copied with [`Client::copy_secret_from`]
//! 2. [`Client::preprocess_query`] then [`Client::query`] build the PIR query
//! 3. [`Client::recover_hint`] stores `H·s`, [`Client::recover`] decodes
//!
//! Linear queries follow the same order with [`Client::preprocess_query_lhe`],
//! [`Client::query_lhe`] and [`Client::recover_lhe`], and return `Db·v mod p`
//! for a plaintext vector `v` instead of one column.
//!
//! Steps taken out of order fail with [`Error::MissingState`]. Mixing the
//! secret of one session with the query or hint answer of another is not
//! detected and decodes to garbage.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use tracing::debug;

use crate::error::{invalid_params, mismatch, Error, Result};
use crate::hint::ParameterContext;
use crate::lwe::{Answer, DbInfo, LweClient, MatrixSeed, PreprocessedQuery, Query};
use crate::math::Elem;
use crate::params::{HintParams, SecurityLevel};

use super::messages::{HintAnswer, QueryWithEncryptedSecret, ServerResponse};
use super::secret::{encrypt_secret, generate_and_encrypt, EncryptedSecret, Secret};

/// PIR client that receives the hint homomorphically
pub struct Client<T: Elem> {
    engine: LweClient<T>,
    context: ParameterContext,
    rng: ChaCha20Rng,
    secret: Option<Secret<T>>,
    preprocessed: Option<PreprocessedQuery<T>>,
    preprocessed_lhe: Option<PreprocessedQuery<T>>,
    linear_vector: Option<Vec<u64>>,
    hint_product: Option<Vec<T>>,
}

impl<T: Elem> Client<T> {
    /// Client for the database described by `info`, seeded from OS entropy
    pub fn new(seed: &MatrixSeed, info: &DbInfo, hint_params: HintParams) -> Result<Self> {
        Self::with_rng(seed, info, hint_params, ChaCha20Rng::from_entropy())
    }

    /// Client drawing all randomness from `rng`
    pub fn with_rng(
        seed: &MatrixSeed,
        info: &DbInfo,
        hint_params: HintParams,
        rng: ChaCha20Rng,
    ) -> Result<Self> {
        hint_params.validate_envelope(info.params.secret_dim)?;
        if info.params.level()? != T::LEVEL {
            return Err(invalid_params!(
                "database parameters are {:?}, client is {:?}",
                info.params.level()?,
                T::LEVEL
            ));
        }
        Ok(Self {
            engine: LweClient::new(seed, info)?,
            context: ParameterContext::new(hint_params)?,
            rng,
            secret: None,
            preprocessed: None,
            preprocessed_lhe: None,
            linear_vector: None,
            hint_product: None,
        })
    }

    pub fn level(&self) -> SecurityLevel {
        T::LEVEL
    }

    pub fn info(&self) -> &DbInfo {
        self.engine.info()
    }

    pub fn secret(&self) -> Option<&Secret<T>> {
        self.secret.as_ref()
    }

    pub fn context(&self) -> &ParameterContext {
        &self.context
    }

    fn fresh_secret(&mut self) -> Result<EncryptedSecret> {
        let dim = self.engine.params().secret_dim;
        let (secret, encrypted) = generate_and_encrypt(dim, &mut self.context, &mut self.rng)?;
        self.secret = Some(secret);
        self.clear_session();
        Ok(encrypted)
    }

    fn clear_session(&mut self) {
        self.preprocessed = None;
        self.preprocessed_lhe = None;
        self.linear_vector = None;
        self.hint_product = None;
    }

    /// Fresh secret, its encryption and a PIR query for `index`
    pub fn query_with_encrypted_secret(&mut self, index: u64) -> Result<QueryWithEncryptedSecret<T>> {
        self.engine.info().locate(index)?;
        let encrypted_secret = self.fresh_secret()?;
        self.preprocess_query()?;
        let query = self.query(index)?;
        Ok(QueryWithEncryptedSecret {
            query,
            encrypted_secret,
        })
    }

    /// Fresh secret and its encryption, with no PIR query attached
    ///
    /// Lets the hint be fetched ahead of (or apart from) the query.
    pub fn hint_query(&mut self) -> Result<EncryptedSecret> {
        self.fresh_secret()
    }

    /// Take over the secret of another client and share its outer key
    ///
    /// The secret is derived for this client's level and dimension (see
    /// [`Secret::derive_from`]). Fails with
    /// [`Error::InvalidOperation`] when `other` is narrower or shorter.
    pub fn copy_secret_from<U: Elem>(&mut self, other: &Client<U>) -> Result<()> {
        let source = other
            .secret
            .as_ref()
            .ok_or(Error::MissingState("source client has no secret"))?;
        let secret = Secret::derive_from(source, self.engine.params().secret_dim)?;
        let key = other.context.outer_key()?.clone();
        self.context.set_outer_key(key)?;

        debug!(
            from = ?U::LEVEL,
            to = ?T::LEVEL,
            dim = secret.dim(),
            "copied secret"
        );
        self.secret = Some(secret);
        self.clear_session();
        Ok(())
    }

    /// Encrypt the current secret again under the current outer key
    pub fn encrypted_secret(&mut self) -> Result<EncryptedSecret> {
        let secret = self
            .secret
            .as_ref()
            .ok_or(Error::MissingState("no secret to encrypt"))?;
        encrypt_secret(secret, &self.context, &mut self.rng)
    }

    /// Precompute the secret-dependent part of the next query
    pub fn preprocess_query(&mut self) -> Result<()> {
        let secret = self
            .secret
            .as_ref()
            .ok_or(Error::MissingState("preprocess_query before a secret exists"))?;
        self.preprocessed = Some(self.engine.preprocess_query(secret.coeffs(), &mut self.rng)?);
        Ok(())
    }

    /// PIR query for `index`; consumes the preprocessed state
    pub fn query(&mut self, index: u64) -> Result<Query<T>> {
        self.engine.info().locate(index)?;
        let pre = self
            .preprocessed
            .take()
            .ok_or(Error::MissingState("query before preprocess_query"))?;
        self.engine.query_preprocessed(index, pre)
    }

    /// Precompute the secret-dependent part of the next linear query
    pub fn preprocess_query_lhe(&mut self) -> Result<()> {
        let secret = self
            .secret
            .as_ref()
            .ok_or(Error::MissingState("preprocess_query_lhe before a secret exists"))?;
        self.preprocessed_lhe = Some(self.engine.preprocess_query(secret.coeffs(), &mut self.rng)?);
        Ok(())
    }

    /// Linear query for a plaintext vector over Z_p, one entry per column
    ///
    /// Consumes the preprocessed state. Needs a power-of-two plaintext
    /// modulus. The vector is kept until [`recover_lhe`](Self::recover_lhe).
    pub fn query_lhe(&mut self, vector: &[u64]) -> Result<Query<T>> {
        let pre = self
            .preprocessed_lhe
            .take()
            .ok_or(Error::MissingState("query_lhe before preprocess_query_lhe"))?;
        let query = self.engine.query_linear(vector, pre)?;
        self.linear_vector = Some(vector.to_vec());
        Ok(query)
    }

    /// Decode a linear answer to `Db·v mod p`, one value per database row
    pub fn recover_lhe(&self, answer: &Answer<T>) -> Result<Vec<u64>> {
        let hint_product = self
            .hint_product
            .as_ref()
            .ok_or(Error::MissingState("recover_lhe before recover_hint"))?;
        let vector = self
            .linear_vector
            .as_ref()
            .ok_or(Error::MissingState("recover_lhe before query_lhe"))?;
        let diff = self.subtract_hint(answer, hint_product)?;
        Ok(self.engine.decode_linear(&diff, vector))
    }

    /// Decrypt a hint answer and store `H·s` for [`recover`](Self::recover)
    pub fn recover_hint(&mut self, hint_answer: &HintAnswer) -> Result<()> {
        let product = self.hint_product_from(hint_answer)?;
        self.hint_product = Some(product);
        Ok(())
    }

    fn hint_product_from(&self, hint_answer: &HintAnswer) -> Result<Vec<T>> {
        if self.secret.is_none() {
            return Err(Error::MissingState("hint answer received before a secret exists"));
        }
        if hint_answer.rows != self.engine.info().rows {
            return Err(mismatch!(
                "hint answer covers {} rows, database has {}",
                hint_answer.rows,
                self.engine.info().rows
            ));
        }
        self.context
            .recover_hint_product(&hint_answer.ciphertexts, hint_answer.rows)
    }

    fn subtract_hint(&self, answer: &Answer<T>, hint_product: &[T]) -> Result<Vec<T>> {
        if answer.data.len() != hint_product.len() {
            return Err(mismatch!(
                "answer has {} rows, expected {}",
                answer.data.len(),
                hint_product.len()
            ));
        }
        Ok(answer
            .data
            .iter()
            .zip(hint_product)
            .map(|(&a, &h)| a.wrapping_sub(h))
            .collect())
    }

    fn decode(&self, answer: &Answer<T>, hint_product: &[T]) -> Result<Vec<u64>> {
        let diff = self.subtract_hint(answer, hint_product)?;
        Ok(self.engine.decode_many(&diff))
    }

    /// Decode the queried column using the stored `H·s`
    pub fn recover(&self, answer: &Answer<T>) -> Result<Vec<u64>> {
        let hint_product = self
            .hint_product
            .as_ref()
            .ok_or(Error::MissingState("recover before recover_hint"))?;
        self.decode(answer, hint_product)
    }

    /// Decode a combined response in one step
    pub fn recover_with_hint(&self, response: &ServerResponse<T>) -> Result<Vec<u64>> {
        let hint_product = self.hint_product_from(&response.hint_answer)?;
        self.decode(&response.answer, &hint_product)
    }

    /// Pick entry `index` out of a decoded column
    pub fn entry_from_column(&self, column: &[u64], index: u64) -> Result<u64> {
        self.engine.info().entry_from_column(column, index)
    }

    /// Drop session state and release the parameter context
    pub fn release(&mut self) {
        self.secret = None;
        self.clear_session();
        self.context.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lwe::Database;
    use crate::params::LweParams;

    fn toy() -> (Database<u32>, MatrixSeed, HintParams) {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let params = LweParams::default_32(512).with_secret_dim(64);
        let db = Database::random(256, 9, &params, &mut rng).unwrap();
        let hint = HintParams {
            ring_dim: 256,
            chunk_len: 64,
            plaintext_modulus: 1 << 16,
            ..HintParams::default_32()
        };
        (db, MatrixSeed::random(&mut rng), hint)
    }

    #[test]
    fn test_out_of_order_steps() {
        let (db, seed, hint) = toy();
        let mut client =
            Client::<u32>::with_rng(&seed, db.info(), hint, ChaCha20Rng::seed_from_u64(2)).unwrap();

        assert!(matches!(client.preprocess_query(), Err(Error::MissingState(_))));
        assert!(matches!(client.query(3), Err(Error::MissingState(_))));
        assert!(matches!(client.encrypted_secret(), Err(Error::MissingState(_))));

        client.hint_query().unwrap();
        assert!(matches!(client.query(3), Err(Error::MissingState(_))));
        let answer = Answer {
            data: vec![0u32; db.info().rows],
        };
        assert!(matches!(client.recover(&answer), Err(Error::MissingState(_))));

        client.preprocess_query().unwrap();
        client.query(3).unwrap();
        // Preprocessed state is single-use
        assert!(matches!(client.query(3), Err(Error::MissingState(_))));
    }

    #[test]
    fn test_linear_steps_in_order() {
        let (db, seed, hint) = toy();
        let mut client =
            Client::<u32>::with_rng(&seed, db.info(), hint, ChaCha20Rng::seed_from_u64(5)).unwrap();
        let vector = vec![1u64; db.info().cols];

        assert!(matches!(client.preprocess_query_lhe(), Err(Error::MissingState(_))));
        client.hint_query().unwrap();
        assert!(matches!(client.query_lhe(&vector), Err(Error::MissingState(_))));

        // PIR and linear preprocessing are separate slots
        client.preprocess_query().unwrap();
        assert!(matches!(client.query_lhe(&vector), Err(Error::MissingState(_))));

        client.preprocess_query_lhe().unwrap();
        let query = client.query_lhe(&vector).unwrap();
        assert_eq!(query.data.len(), db.info().cols);
        let answer = Answer {
            data: vec![0u32; db.info().rows],
        };
        assert!(matches!(client.recover_lhe(&answer), Err(Error::MissingState(_))));

        client.preprocess_query_lhe().unwrap();
        assert!(matches!(
            client.query_lhe(&vector[1..]),
            Err(Error::ParameterMismatch(_))
        ));
    }

    #[test]
    fn test_index_out_of_range() {
        let (db, seed, hint) = toy();
        let mut client =
            Client::<u32>::with_rng(&seed, db.info(), hint, ChaCha20Rng::seed_from_u64(3)).unwrap();
        assert!(matches!(
            client.query_with_encrypted_secret(256),
            Err(Error::IndexOutOfRange { index: 256, num: 256 })
        ));
    }

    #[test]
    fn test_wrong_level_rejected() {
        let (db, seed, hint) = toy();
        assert!(Client::<u64>::new(&seed, db.info(), hint).is_err());
    }

    #[test]
    fn test_release_clears_session() {
        let (db, seed, hint) = toy();
        let mut client =
            Client::<u32>::with_rng(&seed, db.info(), hint, ChaCha20Rng::seed_from_u64(4)).unwrap();
        client.query_with_encrypted_secret(0).unwrap();

        client.release();
        client.release();
        assert!(client.secret().is_none());
        assert!(matches!(client.hint_query(), Err(Error::Released)));
    }
}
