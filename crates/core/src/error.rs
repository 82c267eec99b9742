//! Error kinds reported by the engine.

use thiserror::Error;

/// Failures surfaced by cache construction, DAG materialization, and compute.
///
/// Alignment failures indicate caller error and are not retryable; I/O
/// failures cover every stage of the DAG file lifecycle.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied size violates an alignment precondition.
    #[error("{what} of {size} bytes is not a positive multiple of {align}")]
    Misaligned {
        what: &'static str,
        size: u64,
        align: u64,
    },

    /// The block's epoch is beyond the precomputed size tables.
    #[error("epoch {0} is beyond the {max}-epoch size tables", max = crate::params::MAX_EPOCH)]
    EpochOutOfRange(u64),

    /// Recreating the DAG file after a size mismatch did not yield a
    /// rebuildable file.
    #[error("could not recreate the DAG file after a size mismatch")]
    Corrupt,

    /// DAG file preparation, mapping, or flushing failed.
    #[error("DAG file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The progress callback requested cancellation.
    #[error("DAG generation cancelled by the caller")]
    Cancelled,
}
