//! Sharded retrieval with a single encrypted secret

use hintless_pir::distributed::{DistributedClient, ShardServers, ShardSpec, ShardTable};
use hintless_pir::lwe::{Database, MatrixSeed};
use hintless_pir::params::{HintParams, LweParams};
use hintless_pir::protocol::{Client, Server};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

const SHARD_ENTRIES: u64 = 1 << 12;

fn toy_hint() -> HintParams {
    HintParams {
        ring_dim: 256,
        chunk_len: 64,
        plaintext_modulus: 1 << 16,
        ..HintParams::default_32()
    }
}

fn shards() -> (ShardTable, Vec<Database<u32>>) {
    let mut rng = ChaCha20Rng::seed_from_u64(201);
    let lwe = LweParams::default_32(512).with_secret_dim(64);

    let mut specs = Vec::new();
    let mut dbs = Vec::new();
    for k in 0..3 {
        let db = Database::<u32>::random(SHARD_ENTRIES, 9, &lwe, &mut rng).unwrap();
        specs.push(ShardSpec {
            seed: MatrixSeed::random(&mut rng),
            offset: k * SHARD_ENTRIES,
            info: db.info().clone(),
        });
        dbs.push(db);
    }
    (ShardTable::new(specs).unwrap(), dbs)
}

#[test]
fn test_distributed_matches_direct() {
    let (table, dbs) = shards();
    let servers = ShardServers::new(&table, dbs.clone(), toy_hint()).unwrap();
    let mut client =
        DistributedClient::<u32>::with_rng(table.clone(), toy_hint(), ChaCha20Rng::seed_from_u64(202))
            .unwrap();

    for global in [0u64, SHARD_ENTRIES - 1, SHARD_ENTRIES + 17, 3 * SHARD_ENTRIES - 1] {
        let shard = (global / SHARD_ENTRIES) as usize;
        let local = global % SHARD_ENTRIES;

        let query = client.query(global).unwrap();
        assert_eq!(query.queries.len(), 3);
        let responses = servers.answer(&query).unwrap();
        let value = client.recover_entry(&responses).unwrap();
        assert_eq!(value, dbs[shard].get(local).unwrap(), "global {} mismatch", global);

        // A direct session against the target shard alone agrees
        let spec = &table.shards()[shard];
        let server = Server::new(dbs[shard].clone(), &spec.seed, toy_hint()).unwrap();
        let mut direct = Client::<u32>::with_rng(
            &spec.seed,
            &spec.info,
            toy_hint(),
            ChaCha20Rng::seed_from_u64(203 + global),
        )
        .unwrap();
        let q = direct.query_with_encrypted_secret(local).unwrap();
        let column = direct.recover_with_hint(&server.answer_with_hint(&q).unwrap()).unwrap();
        assert_eq!(direct.entry_from_column(&column, local).unwrap(), value);
    }
}

#[test]
fn test_distributed_out_of_range() {
    let (table, _) = shards();
    let mut client =
        DistributedClient::<u32>::with_rng(table, toy_hint(), ChaCha20Rng::seed_from_u64(204))
            .unwrap();
    assert!(client.query(3 * SHARD_ENTRIES).is_err());
}

#[test]
fn test_distributed_response_count_checked() {
    let (table, dbs) = shards();
    let servers = ShardServers::new(&table, dbs, toy_hint()).unwrap();
    let mut client =
        DistributedClient::<u32>::with_rng(table, toy_hint(), ChaCha20Rng::seed_from_u64(205))
            .unwrap();

    let query = client.query(5).unwrap();
    let mut responses = servers.answer(&query).unwrap();
    responses.pop();
    assert!(client.recover(&responses).is_err());
}
