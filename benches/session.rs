use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hintless_pir::lwe::{Database, MatrixSeed};
use hintless_pir::params::{HintParams, LweParams};
use hintless_pir::protocol::{Client, Server};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_session(c: &mut Criterion) {
    // Production parameters on a 2^16-entry database
    let mut rng = ChaCha20Rng::seed_from_u64(42);
    let lwe = LweParams::default_32(512);
    let hint_params = HintParams::default_32();
    let db = Database::<u32>::random(1 << 16, 9, &lwe, &mut rng).unwrap();
    let seed = MatrixSeed::random(&mut rng);
    let info = db.info().clone();
    let server = Server::new(db, &seed, hint_params.clone()).unwrap();

    let mut client =
        Client::<u32>::with_rng(&seed, &info, hint_params, ChaCha20Rng::seed_from_u64(43))
            .unwrap();
    let target_index = 42u64;

    let query = client.query_with_encrypted_secret(target_index).unwrap();
    let response = server.answer_with_hint(&query).unwrap();

    let query_size = query.size_report().unwrap();
    let response_size = response.size_report().unwrap();
    println!("query:    {}", query_size);
    println!("response: {}", response_size);

    let mut group = c.benchmark_group("session");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("client_query", |b| {
        b.iter(|| client.query_with_encrypted_secret(black_box(target_index)).unwrap());
    });

    // Restore the secret the response was built for
    let query = client.query_with_encrypted_secret(target_index).unwrap();
    let response = server.answer_with_hint(&query).unwrap();

    group.bench_function("server_answer", |b| {
        b.iter(|| server.answer_with_hint(black_box(&query)).unwrap());
    });

    group.bench_function("client_recover", |b| {
        b.iter_batched(
            || response.clone(),
            |response| {
                let column = client.recover_with_hint(&response).unwrap();
                client.entry_from_column(&column, target_index).unwrap()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_session);
criterion_main!(benches);
