//! Etchash operator tool.
//!
//! # Commands
//!
//! - `info` - epoch number, seed hash, and cache/DAG sizes for a block
//! - `dag` - materialize the DAG file for a block's epoch ahead of time
//! - `verify` - quick-check a solved share against a difficulty boundary
//! - `bench` - light-compute hashrate on reduced parameters

use std::io::Write as _;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use etchash_core::{
    Full, Light, cache_size, dag_size, default_dirname, epoch, quick_check_difficulty, quick_hash,
    seed_hash,
};

#[derive(Parser)]
#[command(name = "etchash")]
#[command(version)]
#[command(about = "Etchash (ECIP-1099) proof-of-work toolbox")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show epoch number, seed hash, and cache/DAG sizes for a block
    Info {
        /// Block height
        #[arg(long)]
        block: u64,
    },

    /// Materialize the DAG file for a block's epoch
    Dag {
        /// Block height
        #[arg(long)]
        block: u64,

        /// DAG directory (default: ~/.etchash)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Verify a solved share against a difficulty boundary
    Verify {
        /// 32-byte header hash, hex
        #[arg(long)]
        header: String,

        /// Nonce, hex with 0x prefix or decimal
        #[arg(long)]
        nonce: String,

        /// 32-byte mix hash, hex
        #[arg(long)]
        mix: String,

        /// 32-byte boundary, hex
        #[arg(long)]
        boundary: String,
    },

    /// Benchmark light compute on reduced parameters
    Bench {
        /// Number of hashimoto runs
        #[arg(short, long, default_value = "200")]
        count: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { block } => cmd_info(block),
        Commands::Dag { block, dir } => cmd_dag(block, dir),
        Commands::Verify {
            header,
            nonce,
            mix,
            boundary,
        } => cmd_verify(&header, &nonce, &mix, &boundary),
        Commands::Bench { count } => cmd_bench(count),
    }
}

fn cmd_info(block: u64) -> Result<()> {
    println!("block      {block}");
    println!("epoch      {}", epoch(block));
    println!("seed hash  0x{}", hex::encode(seed_hash(block)));
    println!("cache size {} bytes", cache_size(block)?);
    println!("dag size   {} bytes", dag_size(block)?);
    Ok(())
}

fn cmd_dag(block: u64, dir: Option<PathBuf>) -> Result<()> {
    let dir = dir.unwrap_or_else(default_dirname);
    println!("building cache for epoch {}", epoch(block));
    let light = Light::new(block)?;

    let started = Instant::now();
    let mut last = u32::MAX;
    let mut progress = |percent: u32| {
        if percent != last {
            last = percent;
            print!("\rmaterializing DAG: {percent:>3}%");
            let _ = std::io::stdout().flush();
        }
        true
    };
    let full = Full::create(
        &dir,
        &seed_hash(block),
        dag_size(block)?,
        &light,
        Some(&mut progress),
    )?;
    println!(
        "\rmaterializing DAG: done ({} bytes in {:?})",
        full.dag_size(),
        started.elapsed()
    );
    println!("directory: {}", dir.display());
    Ok(())
}

fn parse_h256(label: &str, value: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(value.trim_start_matches("0x"))
        .with_context(|| format!("{label} is not valid hex"))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("{label} must be 32 bytes, got {}", bytes.len()))
}

fn parse_nonce(value: &str) -> Result<u64> {
    if let Some(digits) = value.strip_prefix("0x") {
        u64::from_str_radix(digits, 16).context("nonce is not valid hex")
    } else {
        value.parse().context("nonce is not a number")
    }
}

fn cmd_verify(header: &str, nonce: &str, mix: &str, boundary: &str) -> Result<()> {
    let header = parse_h256("header", header)?;
    let mix = parse_h256("mix", mix)?;
    let boundary = parse_h256("boundary", boundary)?;
    let nonce = parse_nonce(nonce)?;

    println!("result 0x{}", hex::encode(quick_hash(&header, nonce, &mix)));
    if quick_check_difficulty(&header, nonce, &mix, &boundary) {
        println!("share is below the boundary");
        Ok(())
    } else {
        Err(anyhow!("share is above the boundary"))
    }
}

fn cmd_bench(count: u32) -> Result<()> {
    // A small cache with a forced 1 GiB page space keeps the run dominated
    // by the mix loop instead of cache construction.
    let light = Light::with_seed(1 << 20, &[0u8; 32])?;
    let header = [0u8; 32];

    let started = Instant::now();
    for nonce in 0..u64::from(count) {
        light.compute_with_size(1 << 30, &header, nonce)?;
    }
    let elapsed = started.elapsed();
    println!(
        "{count} light computes in {elapsed:.2?} ({:.1} H/s)",
        f64::from(count) / elapsed.as_secs_f64()
    );
    Ok(())
}
