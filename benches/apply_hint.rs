use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use hintless_pir::lwe::{self, Database, MatrixSeed};
use hintless_pir::params::{HintParams, LweParams};
use hintless_pir::protocol::{generate_and_encrypt, Server};
use hintless_pir::{DecomposedHint, ParameterContext};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn apply_hint_benchmark(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let lwe = LweParams::default_32(512);
    let hint_params = HintParams::default_32();

    let mut group = c.benchmark_group("apply_hint");
    group.sample_size(10);

    for log_entries in [12u32, 14, 16] {
        let db = Database::<u32>::random(1 << log_entries, 9, &lwe, &mut rng).unwrap();
        let seed = MatrixSeed::random(&mut rng);
        let raw_hint = lwe::compute_hint(&db, &seed).unwrap();

        let mut context = ParameterContext::new(hint_params.clone()).unwrap();
        let (_secret, encrypted) =
            generate_and_encrypt::<u32, _>(lwe.secret_dim, &mut context, &mut rng).unwrap();

        group.bench_with_input(
            BenchmarkId::new("decompose", format!("2^{}", log_entries)),
            &raw_hint,
            |b, hint| {
                b.iter(|| {
                    DecomposedHint::build(hint, context.params(), context.ntt().unwrap()).unwrap()
                });
            },
        );

        let server = Server::new(db, &seed, hint_params.clone()).unwrap();
        group.bench_with_input(
            BenchmarkId::new("evaluate", format!("2^{}", log_entries)),
            &encrypted,
            |b, encrypted| {
                b.iter(|| server.hint_answer(encrypted).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, apply_hint_benchmark);
criterion_main!(benches);
