//! # etchash-core
//!
//! The Ethereum Classic variant of the Ethash proof-of-work (ECIP-1099):
//! epoch seeds, the memory-hard cache, on-demand or materialized DAG nodes,
//! and the hashimoto mix that turns a `(header, nonce)` trial into a
//! `(mix hash, result)` pair a verifier checks against a difficulty
//! boundary.
//!
//! ## Modes
//!
//! - [`Light`] owns the per-epoch cache (~16 MiB at epoch 0) and derives DAG
//!   nodes on the fly — cheap to build, enough for verification.
//! - [`Full`] memory-maps the materialized DAG (~1 GiB at epoch 0) from a
//!   file it builds once and revalidates by magic marker — what a
//!   competitive miner wants.
//! - [`quick_check_difficulty`] needs neither: given the published mix hash
//!   it recomputes the result with two Keccak calls.
//!
//! Both context types are immutable after construction and safe to share
//! across threads.
//!
//! ## Example
//!
//! ```no_run
//! use etchash_core::Light;
//!
//! let light = Light::new(11_700_000)?;
//! let pow = light.compute(&[0u8; 32], 0x1234_5678)?;
//! assert_eq!(
//!     pow.result,
//!     etchash_core::quick_hash(&[0u8; 32], 0x1234_5678, &pow.mix_hash),
//! );
//! # Ok::<(), etchash_core::Error>(())
//! ```

mod epoch;
mod error;
mod etchash;
pub mod ffi;
mod full;
mod io;
mod light;
mod params;
mod primitives;

pub use epoch::{cache_size, dag_size, epoch, seed_hash};
pub use error::Error;
pub use etchash::{
    Pow, Progress, check_difficulty, compute_full_data, dag_item, quick_check_difficulty,
    quick_hash,
};
pub use full::Full;
pub use io::default_dirname;
pub use light::Light;
pub use params::*;
pub use primitives::{H256, Node};

#[cfg(test)]
mod tests;
