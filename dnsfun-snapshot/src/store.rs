//! Snapshot file store.
//!
//! ## `write_snapshot`: 5-step protocol
//!
//! 1. SHA-256 hash the new bytes.
//! 2. Compare with the digest of the bytes currently on disk → skip if equal.
//! 3. Ensure the parent directory exists.
//! 4. Write to `<file>.tmp` in the same directory.
//! 5. Rename to the final path (atomic on POSIX).
//!
//! A reader therefore sees either the previous snapshot or the new one, never
//! a partially written file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SnapshotError};

/// Outcome of a single snapshot write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was replaced with new content.
    Written { digest: String },
    /// The file already held exactly these bytes.
    Unchanged { digest: String },
}

impl WriteOutcome {
    pub fn digest(&self) -> &str {
        match self {
            WriteOutcome::Written { digest } | WriteOutcome::Unchanged { digest } => digest,
        }
    }
}

/// Read a snapshot file.
///
/// Returns `Ok(None)` if the file does not exist: no prior state.
pub fn read_snapshot(path: &Path) -> Result<Option<Vec<u8>>, SnapshotError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

/// Atomically replace the snapshot at `path` with `bytes`.
pub fn write_snapshot(path: &Path, bytes: &[u8]) -> Result<WriteOutcome, SnapshotError> {
    let tmp = tmp_path(path);
    write_snapshot_with_tmp(path, bytes, &tmp)
}

fn write_snapshot_with_tmp(
    path: &Path,
    bytes: &[u8],
    tmp: &Path,
) -> Result<WriteOutcome, SnapshotError> {
    // Step 1: hash the new content.
    let digest = sha256_hex(bytes);

    // Step 2: compare with what is on disk. Unreadable current content just
    // means we overwrite it.
    if let Ok(Some(current)) = read_snapshot(path) {
        if sha256_hex(&current) == digest {
            tracing::debug!("snapshot unchanged: {}", path.display());
            return Ok(WriteOutcome::Unchanged { digest });
        }
    }

    // Step 3: ensure parent directory exists.
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    // Step 4: write to .tmp.
    std::fs::write(tmp, bytes).map_err(|e| io_err(tmp, e))?;

    // Step 5: atomic rename to final path.
    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::debug!("snapshot written: {}", path.display());
    Ok(WriteOutcome::Written { digest })
}

/// `<file>.tmp`, a sibling of `path` so the rename never crosses filesystems.
pub fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}
