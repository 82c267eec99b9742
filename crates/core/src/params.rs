//! Etchash protocol parameters (ECIP-1099).

/// Blocks per epoch before the ECIP-1099 activation.
pub const EPOCH_LENGTH: u64 = 30_000;

/// Blocks per epoch from the activation block onwards.
pub const NEW_EPOCH_LENGTH: u64 = 60_000;

/// ECIP-1099 activation height on Ethereum Classic mainnet.
pub const ACTIVATION_BLOCK: u64 = 11_700_000;

/// Number of epochs covered by the precomputed size tables.
pub const MAX_EPOCH: u64 = 2048;

/// Bytes per cache/DAG node.
pub const NODE_BYTES: usize = 64;

/// 32-bit words per node.
pub const NODE_WORDS: usize = 16;

/// Nodes per mix page.
pub const MIX_NODES: usize = 2;

/// 32-bit words in the mix buffer.
pub const MIX_WORDS: usize = MIX_NODES * NODE_WORDS;

/// Bytes per mix page.
pub const MIX_BYTES: usize = MIX_WORDS * 4;

/// Passes of the SeqMemoHash rounds over the cache.
pub const CACHE_ROUNDS: usize = 3;

/// Parent nodes folded into each derived DAG item.
pub const DATASET_PARENTS: u32 = 256;

/// DAG page accesses per hashimoto run.
pub const ACCESSES: usize = 64;

/// 32-bit FNV-1 prime.
pub const FNV_PRIME: u32 = 0x0100_0193;

/// DAG file format revision, part of the on-disk file name.
pub const REVISION: u32 = 23;

/// Marker written to the head of a fully materialized DAG file.
pub const DAG_MAGIC_NUM: u64 = 0xFEE1_DEAD_BADD_CAFE;

/// Byte size of the on-disk magic marker.
pub const DAG_MAGIC_SIZE: usize = 8;
