//! Epoch math: block height to epoch, per-epoch seed hash, and the cache and
//! DAG sizes from the precomputed tables.

use crate::error::Error;
use crate::params::{ACTIVATION_BLOCK, EPOCH_LENGTH, MAX_EPOCH, NEW_EPOCH_LENGTH};
use crate::primitives::{H256, keccak256};

include!(concat!(env!("OUT_DIR"), "/data_sizes.rs"));

/// Epoch number for a block height: 30k-block epochs before the ECIP-1099
/// activation, 60k-block epochs afterwards.
pub fn epoch(block_number: u64) -> u64 {
    if block_number >= ACTIVATION_BLOCK {
        block_number / NEW_EPOCH_LENGTH
    } else {
        block_number / EPOCH_LENGTH
    }
}

fn table_entry(table: &[u64; MAX_EPOCH as usize], block_number: u64) -> Result<u64, Error> {
    let epoch = epoch(block_number);
    if epoch >= MAX_EPOCH {
        return Err(Error::EpochOutOfRange(epoch));
    }
    Ok(table[epoch as usize])
}

/// Byte size of the verification cache for a block height. Always a multiple
/// of the node size.
pub fn cache_size(block_number: u64) -> Result<u64, Error> {
    table_entry(&CACHE_SIZES, block_number)
}

/// Byte size of the full DAG for a block height. Always a multiple of the
/// page size.
pub fn dag_size(block_number: u64) -> Result<u64, Error> {
    table_entry(&DAG_SIZES, block_number)
}

/// Per-epoch seed hash, the ECIP-1099 rule.
///
/// Pre-activation this is the classic chain of keccak-256 rounds from the
/// zero hash, one per 30k-block epoch. Post-activation the round count is
/// re-anchored to the first block of the doubled epoch, so the doubled
/// epochs continue the same chain at even positions.
pub fn seed_hash(block_number: u64) -> H256 {
    let epoch = epoch(block_number);
    let anchor = if block_number >= ACTIVATION_BLOCK {
        epoch * NEW_EPOCH_LENGTH + 1
    } else {
        epoch * EPOCH_LENGTH + 1
    };

    let mut seed = [0u8; 32];
    for _ in 0..anchor / EPOCH_LENGTH {
        seed = keccak256(&seed);
    }
    seed
}
