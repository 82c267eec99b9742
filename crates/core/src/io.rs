//! DAG file naming and preparation.
//!
//! A DAG file lives at `<dir>/full-R<REVISION>-<seed prefix>`: an 8-byte
//! magic marker followed by the body, little-endian throughout. The marker is
//! only written once the body is complete, so its absence marks a body that
//! cannot be trusted.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use log::debug;

use crate::params::{DAG_MAGIC_NUM, DAG_MAGIC_SIZE, REVISION};
use crate::primitives::H256;

/// Outcome of preparing the on-disk DAG file.
pub(crate) enum Prepared {
    /// Right size and a valid magic marker: the body can be served as-is.
    Match(File),
    /// The file exists (or was just created and zero-filled) without a valid
    /// marker; the body must be rebuilt.
    Mismatch(File),
    /// A file of a different length occupies the path.
    SizeMismatch,
}

/// Default DAG directory: `$HOME/.etchash`, or `./.etchash` without a home.
pub fn default_dirname() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".etchash"),
        None => PathBuf::from(".etchash"),
    }
}

pub(crate) fn file_name(seed: &H256) -> String {
    format!("full-R{REVISION}-{}", hex::encode(&seed[..8]))
}

/// Open or create the DAG file for `seed` under `dirname`.
///
/// With `force_create` the path is truncated and re-extended to
/// `full_size + DAG_MAGIC_SIZE` unconditionally, which always yields
/// [`Prepared::Mismatch`].
pub(crate) fn prepare(
    dirname: &Path,
    seed: &H256,
    full_size: u64,
    force_create: bool,
) -> Result<Prepared, std::io::Error> {
    fs::create_dir_all(dirname)?;
    let path = dirname.join(file_name(seed));
    let total = full_size + DAG_MAGIC_SIZE as u64;

    if !force_create {
        match OpenOptions::new().read(true).write(true).open(&path) {
            Ok(mut file) => {
                let found = file.metadata()?.len();
                if found != total {
                    debug!(
                        "existing DAG file {} is {found} bytes, want {total}",
                        path.display()
                    );
                    return Ok(Prepared::SizeMismatch);
                }
                let mut magic = [0u8; DAG_MAGIC_SIZE];
                file.read_exact(&mut magic)?;
                file.seek(SeekFrom::Start(0))?;
                return if u64::from_le_bytes(magic) == DAG_MAGIC_NUM {
                    Ok(Prepared::Match(file))
                } else {
                    debug!("existing DAG file {} has no magic marker", path.display());
                    Ok(Prepared::Mismatch(file))
                };
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }

    debug!("creating DAG file {} ({total} bytes)", path.display());
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)?;
    file.set_len(total)?;
    Ok(Prepared::Mismatch(file))
}
