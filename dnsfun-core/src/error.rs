//! Error types for dnsfun-core.

use std::path::PathBuf;

use hickory_proto::op::ResponseCode;
use thiserror::Error;

/// Errors raised while reading and validating configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parse error, with the file path and the line context from toml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A required key is absent from every loaded file.
    #[error("missing required config key '{key}'")]
    MissingKey { key: String },

    /// The merged document does not match the expected shape
    /// (wrong value types, non-table sections, ...).
    #[error("invalid configuration: {0}")]
    Invalid(#[from] toml::de::Error),

    /// `server.address` is neither `host:port` nor `:port`.
    #[error("invalid server address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// Startup-time structural errors from building the registry and router.
///
/// All of these are fatal: the process must not start listening.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The service name is not a single valid DNS label.
    #[error("invalid service name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A service with this name is already registered.
    #[error("service '{name}' is already registered")]
    DuplicateService { name: String },

    /// Another handler already owns this zone in the router.
    #[error("zone '{zone}' is already claimed by another handler")]
    ZoneTaken { zone: String },

    /// `snapshot_enabled = true` without a `snapshot_file`.
    #[error("service '{name}' enables snapshots but sets no snapshot_file")]
    MissingSnapshotFile { name: String },
}

/// Errors a service reports while answering a query or handling its state.
///
/// None of these ever reach the transport; the router turns each into a
/// DNS response code.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The query subject is malformed for this service (`xdy.dice`).
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The service does not answer this kind of request.
    #[error("not implemented")]
    NotImplemented,

    /// The service cannot answer right now (missing data, upstream down).
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// Snapshot serialization or deserialization failed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl ServiceError {
    /// The DNS response code sent back when a handler fails with `self`.
    pub fn response_code(&self) -> ResponseCode {
        match self {
            ServiceError::InvalidQuery(_) => ResponseCode::NXDomain,
            ServiceError::NotImplemented => ResponseCode::NotImp,
            ServiceError::Unavailable(_) | ServiceError::Snapshot(_) => ResponseCode::ServFail,
        }
    }
}
