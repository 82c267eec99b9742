//! The Etchash kernels: cache construction, DAG item derivation, the
//! hashimoto mix loop, and the verifier-side quick path.
//!
//! Consumers normally go through [`Light`](crate::Light) and
//! [`Full`](crate::Full); the functions here are the deterministic kernels
//! both modes share. The cache follows Lerner's SeqMemoHash construction,
//! each DAG item folds 256 pseudo-random cache parents, and the mix loop
//! consumes 64 two-node pages chosen by FNV feedback.

use log::debug;

use crate::error::Error;
use crate::params::{
    ACCESSES, CACHE_ROUNDS, DATASET_PARENTS, MIX_BYTES, MIX_NODES, MIX_WORDS, NODE_BYTES,
    NODE_WORDS,
};
use crate::primitives::{H256, Node, fnv, keccak256, keccak512};

/// Outcome of one `(header, nonce)` trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pow {
    /// Digest of the mix buffer, published next to the nonce so verifiers
    /// can take the quick path.
    pub mix_hash: H256,
    /// Final value compared against the difficulty boundary.
    pub result: H256,
}

/// Progress sink for DAG materialization. Receives a percentage in
/// `0..=100`; returning `false` aborts the build.
pub type Progress<'a> = &'a mut dyn FnMut(u32) -> bool;

fn check_full_size(full_size: u64) -> Result<(), Error> {
    if full_size == 0 || full_size % MIX_BYTES as u64 != 0 {
        return Err(Error::Misaligned {
            what: "DAG size",
            size: full_size,
            align: MIX_BYTES as u64,
        });
    }
    Ok(())
}

/// Fill `nodes` with the epoch cache for `seed` (SeqMemoHash over 64-byte
/// nodes: a keccak-512 chain, then [`CACHE_ROUNDS`] passes mixing each node
/// with its left neighbor and one pseudo-random peer).
pub(crate) fn compute_cache_nodes(nodes: &mut [Node], seed: &H256) {
    let n = nodes.len();
    debug!("building {n}-node cache");

    nodes[0] = Node::from(keccak512(seed));
    for i in 1..n {
        nodes[i] = Node::from(keccak512(nodes[i - 1].as_bytes()));
    }

    for _ in 0..CACHE_ROUNDS {
        for i in 0..n {
            let idx = nodes[i].word(0) as usize % n;
            let data = nodes[(n - 1 + i) % n].xor(&nodes[idx]);
            nodes[i] = Node::from(keccak512(data.as_bytes()));
        }
    }
    // Word accessors are little-endian, so the nodes are already in
    // canonical byte order.
}

/// Derive DAG node `index` on demand from the cache.
pub fn dag_item(cache: &[Node], index: u32) -> Node {
    let parents = cache.len() as u32;

    let mut init = cache[(index % parents) as usize];
    init.set_word(0, init.word(0) ^ index);
    let mut ret = Node::from(keccak512(init.as_bytes()));

    for i in 0..DATASET_PARENTS {
        // Parent selection reads lanes rewritten by earlier iterations, so
        // the access sequence is feedback-dependent.
        let parent = fnv(index ^ i, ret.word(i as usize % NODE_WORDS)) % parents;
        ret.fnv_merge(&cache[parent as usize]);
    }

    Node::from(keccak512(ret.as_bytes()))
}

/// Materialize the full DAG into `dest`, one 64-byte node per slot.
///
/// `progress`, when present, is invoked roughly once per percent with the
/// completed share; it is never invoked for DAGs under 100 nodes. Returning
/// `false` from it aborts the fill with [`Error::Cancelled`].
#[cfg(not(feature = "parallel"))]
pub fn compute_full_data(
    dest: &mut [u8],
    cache: &[Node],
    mut progress: Option<Progress<'_>>,
) -> Result<(), Error> {
    check_full_size(dest.len() as u64)?;
    let max_n = (dest.len() / NODE_BYTES) as u32;
    let step = max_n / 100;
    debug!("materializing {max_n}-node DAG");

    for (n, slot) in dest.chunks_exact_mut(NODE_BYTES).enumerate() {
        let n = n as u32;
        if step != 0 && n % step == 0 {
            if let Some(report) = progress.as_mut() {
                let percent = (u64::from(n) * 100).div_ceil(u64::from(max_n)) as u32;
                if !report(percent) {
                    return Err(Error::Cancelled);
                }
            }
        }
        slot.copy_from_slice(dag_item(cache, n).as_bytes());
    }
    Ok(())
}

/// Materialize the full DAG into `dest`, one 64-byte node per slot.
///
/// Parallel variant: slots are filled across the rayon pool in disjoint
/// per-percent chunks, every slot written exactly once. `progress` keeps the
/// serial contract — called between chunks on the calling thread, never for
/// DAGs under 100 nodes, returning `false` aborts with [`Error::Cancelled`].
#[cfg(feature = "parallel")]
pub fn compute_full_data(
    dest: &mut [u8],
    cache: &[Node],
    mut progress: Option<Progress<'_>>,
) -> Result<(), Error> {
    use rayon::prelude::*;

    check_full_size(dest.len() as u64)?;
    let max_n = (dest.len() / NODE_BYTES) as u32;
    let step = max_n / 100;
    debug!("materializing {max_n}-node DAG across the thread pool");

    let chunk_nodes = if step == 0 { max_n } else { step } as usize;
    let mut base = 0u32;
    for chunk in dest.chunks_mut(chunk_nodes * NODE_BYTES) {
        if step != 0 {
            if let Some(report) = progress.as_mut() {
                let percent = (u64::from(base) * 100).div_ceil(u64::from(max_n)) as u32;
                if !report(percent) {
                    return Err(Error::Cancelled);
                }
            }
        }
        chunk
            .par_chunks_exact_mut(NODE_BYTES)
            .enumerate()
            .for_each(|(i, slot)| {
                slot.copy_from_slice(dag_item(cache, base + i as u32).as_bytes());
            });
        base += (chunk.len() / NODE_BYTES) as u32;
    }
    Ok(())
}

/// The hashimoto mix: absorb `header_hash` and `nonce`, take [`ACCESSES`]
/// FNV-selected page reads from `lookup`, compress, and keccak the result.
pub(crate) fn hashimoto<F>(
    header_hash: &H256,
    nonce: u64,
    full_size: u64,
    lookup: F,
) -> Result<Pow, Error>
where
    F: Fn(u32) -> Node,
{
    check_full_size(full_size)?;
    let num_pages = (full_size / MIX_BYTES as u64) as u32;

    let mut absorb = [0u8; 40];
    absorb[..32].copy_from_slice(header_hash);
    absorb[32..].copy_from_slice(&nonce.to_le_bytes());
    let s = Node::from(keccak512(&absorb));

    // The 128-byte mix starts as the seed node replicated across the page.
    let mut mix = [s; MIX_NODES];
    for i in 0..ACCESSES as u32 {
        let page = fnv(s.word(0) ^ i, mix_word(&mix, i as usize % MIX_WORDS)) % num_pages;
        for n in 0..MIX_NODES {
            let dag_node = lookup(page * MIX_NODES as u32 + n as u32);
            mix[n].fnv_merge(&dag_node);
        }
    }

    let mut mix_hash = [0u8; 32];
    for (i, out) in mix_hash.chunks_exact_mut(4).enumerate() {
        let w = i * 4;
        let reduced = fnv(
            fnv(
                fnv(mix_word(&mix, w), mix_word(&mix, w + 1)),
                mix_word(&mix, w + 2),
            ),
            mix_word(&mix, w + 3),
        );
        out.copy_from_slice(&reduced.to_le_bytes());
    }

    let mut finalizer = [0u8; 96];
    finalizer[..64].copy_from_slice(s.as_bytes());
    finalizer[64..].copy_from_slice(&mix_hash);
    Ok(Pow {
        mix_hash,
        result: keccak256(&finalizer),
    })
}

#[inline]
fn mix_word(mix: &[Node; MIX_NODES], w: usize) -> u32 {
    mix[w / NODE_WORDS].word(w % NODE_WORDS)
}

/// Verifier-side recomputation of the result from a published mix hash:
/// two Keccak calls, no cache or DAG.
pub fn quick_hash(header_hash: &H256, nonce: u64, mix_hash: &H256) -> H256 {
    let mut absorb = [0u8; 40];
    absorb[..32].copy_from_slice(header_hash);
    absorb[32..].copy_from_slice(&nonce.to_le_bytes());

    let mut finalizer = [0u8; 96];
    finalizer[..64].copy_from_slice(&keccak512(&absorb));
    finalizer[64..].copy_from_slice(mix_hash);
    keccak256(&finalizer)
}

/// True iff `hash <= boundary`, both read as big-endian 256-bit integers.
/// Compared as two `u128` halves; runtime does not depend on the values.
pub fn check_difficulty(hash: &H256, boundary: &H256) -> bool {
    let halves = |h: &H256| {
        (
            u128::from_be_bytes(h[..16].try_into().unwrap()),
            u128::from_be_bytes(h[16..].try_into().unwrap()),
        )
    };
    halves(hash) <= halves(boundary)
}

/// Full verifier check: recompute the result from the published mix hash and
/// test it against the boundary.
pub fn quick_check_difficulty(
    header_hash: &H256,
    nonce: u64,
    mix_hash: &H256,
    boundary: &H256,
) -> bool {
    check_difficulty(&quick_hash(header_hash, nonce, mix_hash), boundary)
}
