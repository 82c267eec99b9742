//! Full mining context: the memory-mapped, on-disk DAG.

use std::fs::File;
use std::path::Path;

use log::{debug, error};
use memmap2::{MmapMut, MmapOptions};

use crate::epoch::{dag_size, seed_hash};
use crate::error::Error;
use crate::etchash::{self, Pow, Progress};
use crate::io::{self, Prepared};
use crate::light::Light;
use crate::params::{DAG_MAGIC_NUM, DAG_MAGIC_SIZE, NODE_BYTES};
use crate::primitives::{H256, Node};

/// Full mining context: the materialized DAG, memory-mapped from its on-disk
/// file. Construction serves a finished file when one is present and builds
/// the body otherwise; the magic marker at the file head separates the two.
///
/// Once constructed the mapping is only read, so a `Full` can be shared
/// across mining threads without locking.
#[derive(Debug)]
pub struct Full {
    // `map` precedes `file` so teardown unmaps before closing the handle.
    map: MmapMut,
    _file: File,
    full_size: usize,
}

impl Full {
    /// Open or build the DAG for `light`'s epoch in the default directory.
    pub fn new(light: &Light, progress: Option<Progress<'_>>) -> Result<Self, Error> {
        let full_size = dag_size(light.block_number())?;
        let seed = seed_hash(light.block_number());
        Self::create(&io::default_dirname(), &seed, full_size, light, progress)
    }

    /// Open or build a DAG file of `full_size` body bytes for `seed` under
    /// `dirname`.
    ///
    /// A file of unexpected length is silently recreated; a right-sized file
    /// without a valid marker keeps its allocation and gets its body rebuilt.
    pub fn create(
        dirname: &Path,
        seed: &H256,
        full_size: u64,
        light: &Light,
        progress: Option<Progress<'_>>,
    ) -> Result<Self, Error> {
        let (file, needs_build) = match io::prepare(dirname, seed, full_size, false)? {
            Prepared::Match(file) => (file, false),
            Prepared::Mismatch(file) => (file, true),
            Prepared::SizeMismatch => match io::prepare(dirname, seed, full_size, true)? {
                Prepared::Mismatch(file) => (file, true),
                _ => {
                    error!("could not recreate the DAG file after a size mismatch");
                    return Err(Error::Corrupt);
                }
            },
        };

        let total = full_size as usize + DAG_MAGIC_SIZE;
        // SAFETY: the mapping covers a file this process just opened
        // read-write. Nothing else writes it while mapped: contexts sharing
        // a finished file only read the body, and an unfinished file is
        // invisible to them until the marker lands.
        let map = unsafe { MmapOptions::new().len(total).map_mut(&file)? };
        let mut full = Full {
            map,
            _file: file,
            full_size: full_size as usize,
        };

        if needs_build {
            let body = &mut full.map[DAG_MAGIC_SIZE..];
            if let Err(err) = etchash::compute_full_data(body, light.cache(), progress) {
                error!("failed to materialize the DAG body: {err}");
                return Err(err);
            }
            // Publish the body before the marker: a crash between the two
            // flushes leaves a file without magic, which the next open
            // rebuilds instead of serving.
            full.map.flush_range(DAG_MAGIC_SIZE, full.full_size)?;
            full.map[..DAG_MAGIC_SIZE].copy_from_slice(&DAG_MAGIC_NUM.to_le_bytes());
            full.map.flush_range(0, DAG_MAGIC_SIZE)?;
            debug!("DAG file finalized ({full_size} body bytes)");
        }
        Ok(full)
    }

    /// Mix `header_hash` and `nonce` against the materialized DAG.
    pub fn compute(&self, header_hash: &H256, nonce: u64) -> Result<Pow, Error> {
        let data = self.dag();
        etchash::hashimoto(header_hash, nonce, self.full_size as u64, |i| {
            Node::read(&data[i as usize * NODE_BYTES..])
        })
    }

    /// The DAG body bytes (magic marker excluded).
    pub fn dag(&self) -> &[u8] {
        &self.map[DAG_MAGIC_SIZE..]
    }

    /// Byte size of the DAG body.
    pub fn dag_size(&self) -> u64 {
        self.full_size as u64
    }
}
