//! Error types for dnsfun-snapshot.

use std::path::PathBuf;

use thiserror::Error;

use dnsfun_core::ServiceError;

/// All errors that can arise while reading, writing or producing snapshots.
///
/// None of these are fatal to the process; callers log them and move on.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service failed to dump or load its state.
    #[error("service '{name}' snapshot failed: {source}")]
    Service {
        name: String,
        #[source]
        source: ServiceError,
    },
}

/// Convenience constructor for [`SnapshotError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SnapshotError {
    SnapshotError::Io {
        path: path.into(),
        source,
    }
}
