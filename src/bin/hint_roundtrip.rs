//! hint-roundtrip: run PIR sessions with homomorphically delivered hints
//!
//! Builds a random database, answers a few queries and reports message sizes
//! and timings for each stage.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use hintless_pir::lwe::{Database, MatrixSeed};
use hintless_pir::params::{HintParams, LweParams, SecurityLevel};
use hintless_pir::protocol::{Client, Server};
use hintless_pir::Elem;

#[derive(Parser)]
#[command(name = "hint-roundtrip")]
#[command(about = "Run LWE PIR sessions with compressed hints")]
#[command(version)]
struct Args {
    /// log2 of the number of database entries
    #[arg(long, default_value = "20")]
    log_entries: u32,

    /// Bits per entry
    #[arg(long, default_value = "9")]
    bits: u32,

    /// Ciphertext width (32 or 64)
    #[arg(long, default_value = "32")]
    width: u32,

    /// LWE plaintext modulus (looked up from the sample-count table if omitted)
    #[arg(long)]
    plaintext_modulus: Option<u64>,

    /// Index to retrieve
    #[arg(long, default_value = "7")]
    index: u64,

    /// Number of sessions, each with a fresh secret
    #[arg(long, default_value = "1")]
    queries: usize,

    /// JSON file with `lwe` and/or `hint` parameter overrides
    #[arg(long)]
    params: Option<PathBuf>,

    /// Seed for database, matrix A and client randomness
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Deserialize, Default)]
struct ParamFile {
    lwe: Option<LweParams>,
    hint: Option<HintParams>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let level = SecurityLevel::from_bits(args.width)
        .ok_or_else(|| eyre::eyre!("Invalid width: {}. Must be 32 or 64", args.width))?;

    let overrides = match &args.params {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open parameter file {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse parameter file {}", path.display()))?
        }
        None => ParamFile::default(),
    };

    let num_entries = 1u64 << args.log_entries;
    let lwe = match (overrides.lwe, args.plaintext_modulus) {
        (Some(lwe), _) => lwe,
        (None, Some(p)) => LweParams::for_level(level, p),
        (None, None) => {
            // Each query publishes ~sqrt(N) LWE samples
            let samples = (num_entries as f64).sqrt().ceil() as u64;
            LweParams::for_samples(level, samples)?
        }
    };
    let hint = overrides.hint.unwrap_or_else(|| HintParams::for_level(level));

    info!("Hintless PIR round trip");
    info!(
        "Entries: 2^{} x {} bits, q = 2^{}, p = {}, n = {}",
        args.log_entries, args.bits, lwe.logq, lwe.p, lwe.secret_dim
    );
    info!(
        "Hint scheme: N = {}, t = 2^{}, B = 2^{}, chunk = {}",
        hint.ring_dim,
        hint.plaintext_modulus.trailing_zeros(),
        hint.digit_bits,
        hint.chunk_len
    );

    match level {
        SecurityLevel::Lwe32 => run::<u32>(&args, num_entries, &lwe, hint),
        SecurityLevel::Lwe64 => run::<u64>(&args, num_entries, &lwe, hint),
    }
}

fn run<T: Elem>(args: &Args, num_entries: u64, lwe: &LweParams, hint: HintParams) -> Result<()> {
    let mut rng = match args.seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };

    let setup_start = Instant::now();
    let db = Database::<T>::random(num_entries, args.bits, lwe, &mut rng)?;
    let seed = MatrixSeed::random(&mut rng);
    let info = db.info().clone();
    info!(
        "Database: {}x{} (L x M), {} elements per entry",
        info.rows, info.cols, info.elems_per_entry
    );
    let expected = db.get(args.index)?;

    let mut server = Server::new(db, &seed, hint.clone())?;
    info!("Server setup: {:.2?}", setup_start.elapsed());

    for session in 0..args.queries {
        let client_rng = ChaCha20Rng::from_rng(&mut rng)?;
        let mut client = Client::<T>::with_rng(&seed, &info, hint.clone(), client_rng)?;

        let query_start = Instant::now();
        let query = client.query_with_encrypted_secret(args.index)?;
        let query_time = query_start.elapsed();
        info!("[{}] Query: {} ({:.2?})", session, query.size_report()?, query_time);

        let answer_start = Instant::now();
        let response = server.answer_with_hint(&query)?;
        let answer_time = answer_start.elapsed();
        info!("[{}] Answer: {} ({:.2?})", session, response.size_report()?, answer_time);

        let recover_start = Instant::now();
        let column = client.recover_with_hint(&response)?;
        let value = client.entry_from_column(&column, args.index)?;
        info!("[{}] Recover: {:.2?}", session, recover_start.elapsed());

        eyre::ensure!(
            value == expected,
            "session {}: recovered {} but database holds {}",
            session,
            value,
            expected
        );
        info!("[{}] Retrieved entry {} = {}", session, args.index, value);

        client.release();
    }

    server.release();
    println!();
    println!("=== Round Trip Complete ===");
    println!("Sessions: {}", args.queries);
    Ok(())
}
