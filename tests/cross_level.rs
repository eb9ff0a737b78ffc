//! One secret reused across security levels
//!
//! A 64-bit client generates the secret; a 32-bit client derives its own
//! from it and shares the outer RLWE key, so only one key ever exists.

use hintless_pir::lwe::{Database, MatrixSeed};
use hintless_pir::params::{HintParams, LweParams};
use hintless_pir::protocol::{Client, Server};
use hintless_pir::{Elem, Error};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

struct Fixture {
    db32: Database<u32>,
    seed32: MatrixSeed,
    db64: Database<u64>,
    seed64: MatrixSeed,
}

fn fixture() -> Fixture {
    let mut rng = ChaCha20Rng::seed_from_u64(101);
    let lwe32 = LweParams::default_32(512);
    let lwe64 = LweParams::default_64(1 << 16);
    assert_eq!(lwe32.secret_dim, 1408);
    assert_eq!(lwe64.secret_dim, 2048);

    Fixture {
        db32: Database::random(4096, 9, &lwe32, &mut rng).unwrap(),
        seed32: MatrixSeed::random(&mut rng),
        db64: Database::random(4096, 16, &lwe64, &mut rng).unwrap(),
        seed64: MatrixSeed::random(&mut rng),
    }
}

#[test]
fn test_downgrade_secret_decodes() {
    let f = fixture();
    let mut client64 = Client::<u64>::with_rng(
        &f.seed64,
        f.db64.info(),
        HintParams::default_64(),
        ChaCha20Rng::seed_from_u64(102),
    )
    .unwrap();
    let mut client32 = Client::<u32>::with_rng(
        &f.seed32,
        f.db32.info(),
        HintParams::default_32(),
        ChaCha20Rng::seed_from_u64(103),
    )
    .unwrap();

    client64.hint_query().unwrap();
    client32.copy_secret_from(&client64).unwrap();

    let wide = client64.secret().unwrap().coeffs();
    let narrow = client32.secret().unwrap().coeffs();
    assert_eq!(narrow.len(), 1408);
    for (n, w) in narrow.iter().zip(wide) {
        assert_eq!(n.to_i64(), w.to_i64());
    }

    let server32 = Server::new(f.db32.clone(), &f.seed32, HintParams::default_32()).unwrap();
    let encrypted = client32.encrypted_secret().unwrap();
    assert_eq!(encrypted.secret_dim, 1408);
    let hint_answer = server32.hint_answer(&encrypted).unwrap();
    client32.recover_hint(&hint_answer).unwrap();

    for index in [5u64, 4000] {
        client32.preprocess_query().unwrap();
        let query = client32.query(index).unwrap();
        let column = client32.recover(&server32.answer(&query).unwrap()).unwrap();
        assert_eq!(
            client32.entry_from_column(&column, index).unwrap(),
            f.db32.get(index).unwrap()
        );
    }

    // The source client still works on its own level
    let server64 = Server::new(f.db64.clone(), &f.seed64, HintParams::default_64()).unwrap();
    let encrypted = client64.encrypted_secret().unwrap();
    client64
        .recover_hint(&server64.hint_answer(&encrypted).unwrap())
        .unwrap();
    client64.preprocess_query().unwrap();
    let query = client64.query(77).unwrap();
    let column = client64.recover(&server64.answer(&query).unwrap()).unwrap();
    assert_eq!(
        client64.entry_from_column(&column, 77).unwrap(),
        f.db64.get(77).unwrap()
    );
}

#[test]
fn test_upgrade_rejected() {
    let f = fixture();
    let mut client64 = Client::<u64>::with_rng(
        &f.seed64,
        f.db64.info(),
        HintParams::default_64(),
        ChaCha20Rng::seed_from_u64(104),
    )
    .unwrap();
    let mut client32 = Client::<u32>::with_rng(
        &f.seed32,
        f.db32.info(),
        HintParams::default_32(),
        ChaCha20Rng::seed_from_u64(105),
    )
    .unwrap();

    client32.hint_query().unwrap();
    assert!(matches!(
        client64.copy_secret_from(&client32),
        Err(Error::InvalidOperation(_))
    ));
    assert!(client64.secret().is_none());
}

#[test]
fn test_copy_requires_source_secret() {
    let f = fixture();
    let client64 = Client::<u64>::with_rng(
        &f.seed64,
        f.db64.info(),
        HintParams::default_64(),
        ChaCha20Rng::seed_from_u64(106),
    )
    .unwrap();
    let mut client32 = Client::<u32>::with_rng(
        &f.seed32,
        f.db32.info(),
        HintParams::default_32(),
        ChaCha20Rng::seed_from_u64(107),
    )
    .unwrap();

    assert!(matches!(
        client32.copy_secret_from(&client64),
        Err(Error::MissingState(_))
    ));
}
