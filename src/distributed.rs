//! One secret, many shards
//!
//! The database is split into shards, each with its own matrix seed and a
//! global offset. A [`DistributedClient`] encrypts a single secret once and
//! sends one PIR query to every shard: the target shard gets the real local
//! index, the others a random dummy index. Every shard answers (in parallel
//! via [`ShardServers`]) and the client keeps the target shard's response.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{invalid_params, mismatch, Error, Result};
use crate::hint::ParameterContext;
use crate::lwe::{Database, DbInfo, LweClient, MatrixSeed, Query};
use crate::math::Elem;
use crate::params::HintParams;
use crate::protocol::{
    encrypt_secret, generate_and_encrypt, EncryptedSecret, Secret, Server, ServerResponse,
};

/// One shard: its matrix seed, first global index and layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardSpec {
    pub seed: MatrixSeed,
    pub offset: u64,
    pub info: DbInfo,
}

impl ShardSpec {
    pub fn entries(&self) -> u64 {
        self.info.num_entries
    }

    fn contains(&self, global: u64) -> bool {
        global >= self.offset && global - self.offset < self.entries()
    }
}

/// Shards ordered by offset, covering disjoint index ranges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardTable {
    shards: Vec<ShardSpec>,
}

impl ShardTable {
    /// Validate and sort a set of shards
    ///
    /// All shards must share LWE parameters so one secret serves them all.
    pub fn new(mut shards: Vec<ShardSpec>) -> Result<Self> {
        let first = shards
            .first()
            .ok_or_else(|| invalid_params!("shard table is empty"))?;
        let (dim, logq) = (first.info.params.secret_dim, first.info.params.logq);
        if let Some(s) = shards
            .iter()
            .find(|s| s.info.params.secret_dim != dim || s.info.params.logq != logq)
        {
            return Err(mismatch!(
                "shard at offset {} uses (n = {}, q = 2^{}), expected (n = {}, q = 2^{})",
                s.offset,
                s.info.params.secret_dim,
                s.info.params.logq,
                dim,
                logq
            ));
        }

        shards.sort_by_key(|s| s.offset);
        for pair in shards.windows(2) {
            if pair[0].offset + pair[0].entries() > pair[1].offset {
                return Err(invalid_params!(
                    "shards at offsets {} and {} overlap",
                    pair[0].offset,
                    pair[1].offset
                ));
            }
        }
        Ok(Self { shards })
    }

    pub fn shards(&self) -> &[ShardSpec] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Global index → (shard, local index)
    pub fn locate(&self, global: u64) -> Result<(usize, u64)> {
        let shard = self
            .shards
            .partition_point(|s| s.offset <= global)
            .checked_sub(1)
            .filter(|&i| self.shards[i].contains(global));
        match shard {
            Some(i) => Ok((i, global - self.shards[i].offset)),
            None => Err(Error::IndexOutOfRange {
                index: global,
                num: self.shards.last().map_or(0, |s| s.offset + s.entries()),
            }),
        }
    }
}

/// Per-shard PIR queries sharing one encrypted secret
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct DistributedQuery<T: Elem> {
    /// One query per shard, in table order
    pub queries: Vec<Query<T>>,
    pub encrypted_secret: EncryptedSecret,
}

/// Client querying every shard with one secret
pub struct DistributedClient<T: Elem> {
    table: ShardTable,
    engines: Vec<LweClient<T>>,
    context: ParameterContext,
    rng: ChaCha20Rng,
    secret: Option<Secret<T>>,
    target: Option<(usize, u64)>,
}

impl<T: Elem> DistributedClient<T> {
    pub fn new(table: ShardTable, hint_params: HintParams) -> Result<Self> {
        Self::with_rng(table, hint_params, ChaCha20Rng::from_entropy())
    }

    pub fn with_rng(table: ShardTable, hint_params: HintParams, rng: ChaCha20Rng) -> Result<Self> {
        let engines = table
            .shards()
            .iter()
            .map(|s| LweClient::new(&s.seed, &s.info))
            .collect::<Result<Vec<_>>>()?;
        hint_params.validate_envelope(table.shards()[0].info.params.secret_dim)?;
        Ok(Self {
            table,
            engines,
            context: ParameterContext::new(hint_params)?,
            rng,
            secret: None,
            target: None,
        })
    }

    pub fn table(&self) -> &ShardTable {
        &self.table
    }

    /// Fresh secret, encrypted once, and one query per shard
    pub fn query(&mut self, global: u64) -> Result<DistributedQuery<T>> {
        let (target, local) = self.table.locate(global)?;
        let dim = self.engines[0].params().secret_dim;
        let (secret, encrypted_secret) =
            generate_and_encrypt(dim, &mut self.context, &mut self.rng)?;

        let mut queries = Vec::with_capacity(self.engines.len());
        for (i, engine) in self.engines.iter().enumerate() {
            let index = if i == target {
                local
            } else {
                self.rng.gen_range(0..engine.info().num_entries)
            };
            let pre = engine.preprocess_query(secret.coeffs(), &mut self.rng)?;
            queries.push(engine.query_preprocessed(index, pre)?);
        }

        debug!(shards = queries.len(), target, local, "built distributed query");
        self.secret = Some(secret);
        self.target = Some((target, local));
        Ok(DistributedQuery {
            queries,
            encrypted_secret,
        })
    }

    /// Encrypt the current secret again
    pub fn encrypted_secret(&mut self) -> Result<EncryptedSecret> {
        let secret = self
            .secret
            .as_ref()
            .ok_or(Error::MissingState("no secret to encrypt"))?;
        encrypt_secret(secret, &self.context, &mut self.rng)
    }

    /// Decode the target shard's column from the per-shard responses
    pub fn recover(&self, responses: &[ServerResponse<T>]) -> Result<Vec<u64>> {
        let (target, _) = self
            .target
            .ok_or(Error::MissingState("recover before query"))?;
        if responses.len() != self.engines.len() {
            return Err(mismatch!(
                "{} responses for {} shards",
                responses.len(),
                self.engines.len()
            ));
        }
        let response = &responses[target];
        let engine = &self.engines[target];

        let rows = engine.info().rows;
        if response.hint_answer.rows != rows || response.answer.data.len() != rows {
            return Err(mismatch!("response shape does not match shard {}", target));
        }
        let hint_product: Vec<T> = self
            .context
            .recover_hint_product(&response.hint_answer.ciphertexts, rows)?;
        let diff: Vec<T> = response
            .answer
            .data
            .iter()
            .zip(&hint_product)
            .map(|(&a, &h)| a.wrapping_sub(h))
            .collect();
        Ok(engine.decode_many(&diff))
    }

    /// Decode and pick out the queried entry
    pub fn recover_entry(&self, responses: &[ServerResponse<T>]) -> Result<u64> {
        let column = self.recover(responses)?;
        let (target, local) = self
            .target
            .ok_or(Error::MissingState("recover before query"))?;
        self.engines[target].info().entry_from_column(&column, local)
    }

    pub fn release(&mut self) {
        self.secret = None;
        self.target = None;
        self.context.release();
    }
}

/// Servers for every shard of a table
pub struct ShardServers<T: Elem> {
    servers: Vec<Server<T>>,
}

impl<T: Elem> ShardServers<T> {
    /// Build one server per shard; `dbs` is in table order
    pub fn new(table: &ShardTable, dbs: Vec<Database<T>>, hint_params: HintParams) -> Result<Self> {
        if dbs.len() != table.len() {
            return Err(mismatch!("{} databases for {} shards", dbs.len(), table.len()));
        }
        let servers = table
            .shards()
            .par_iter()
            .zip(dbs.into_par_iter())
            .map(|(spec, db)| Server::new(db, &spec.seed, hint_params.clone()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { servers })
    }

    pub fn from_servers(servers: Vec<Server<T>>) -> Self {
        Self { servers }
    }

    pub fn servers(&self) -> &[Server<T>] {
        &self.servers
    }

    /// Answer every shard's query in parallel against the shared encrypted secret
    pub fn answer(&self, query: &DistributedQuery<T>) -> Result<Vec<ServerResponse<T>>> {
        if query.queries.len() != self.servers.len() {
            return Err(mismatch!(
                "{} queries for {} shards",
                query.queries.len(),
                self.servers.len()
            ));
        }
        let start = std::time::Instant::now();
        let responses = self
            .servers
            .par_iter()
            .zip(&query.queries)
            .map(|(server, q)| -> Result<ServerResponse<T>> {
                Ok(ServerResponse {
                    answer: server.answer(q)?,
                    hint_answer: server.hint_answer(&query.encrypted_secret)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(shards = responses.len(), elapsed = ?start.elapsed(), "answered all shards");
        Ok(responses)
    }

    pub fn release(&mut self) {
        for server in &mut self.servers {
            server.release();
        }
    }
}
