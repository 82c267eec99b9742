//! Light verification context.

use crate::epoch::{cache_size, dag_size, seed_hash};
use crate::error::Error;
use crate::etchash::{self, Pow};
use crate::params::NODE_BYTES;
use crate::primitives::{H256, Node};

/// Light client context: owns the cache for one epoch, enough to verify PoW
/// results by deriving DAG nodes on the fly.
///
/// The cache is immutable once construction returns, so a `Light` can be
/// shared across verifier threads without locking.
pub struct Light {
    block_number: u64,
    cache: Vec<Node>,
}

impl Light {
    /// Build the cache for `block_number`'s epoch.
    pub fn new(block_number: u64) -> Result<Self, Error> {
        let size = cache_size(block_number)?;
        let mut light = Self::with_seed(size, &seed_hash(block_number))?;
        light.block_number = block_number;
        Ok(light)
    }

    /// Build a cache of an explicit byte size from an explicit seed.
    ///
    /// `cache_size` must be a positive multiple of the node size. The block
    /// number of the returned context is zero; reduced-parameter fixtures
    /// pair this with [`compute_with_size`](Self::compute_with_size).
    pub fn with_seed(cache_size: u64, seed: &H256) -> Result<Self, Error> {
        if cache_size == 0 || cache_size % NODE_BYTES as u64 != 0 {
            return Err(Error::Misaligned {
                what: "cache size",
                size: cache_size,
                align: NODE_BYTES as u64,
            });
        }
        let mut cache = vec![Node::ZERO; (cache_size / NODE_BYTES as u64) as usize];
        etchash::compute_cache_nodes(&mut cache, seed);
        Ok(Light {
            block_number: 0,
            cache,
        })
    }

    /// Mix `header_hash` and `nonce` against this epoch's DAG, deriving each
    /// accessed node from the cache.
    pub fn compute(&self, header_hash: &H256, nonce: u64) -> Result<Pow, Error> {
        self.compute_with_size(dag_size(self.block_number)?, header_hash, nonce)
    }

    /// [`compute`](Self::compute) with a caller-chosen DAG size.
    pub fn compute_with_size(
        &self,
        full_size: u64,
        header_hash: &H256,
        nonce: u64,
    ) -> Result<Pow, Error> {
        etchash::hashimoto(header_hash, nonce, full_size, |i| {
            etchash::dag_item(&self.cache, i)
        })
    }

    /// The block height this context was built for.
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// The cache nodes, in canonical little-endian byte order.
    pub fn cache(&self) -> &[Node] {
        &self.cache
    }
}
