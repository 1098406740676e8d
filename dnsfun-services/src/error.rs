use std::path::PathBuf;

use dnsfun_core::ConfigError;
use thiserror::Error;

/// Errors raised while turning configuration into service instances.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A service section has keys of the wrong shape.
    #[error("invalid options for service '{service}': {source}")]
    Config {
        service: String,
        #[source]
        source: ConfigError,
    },

    /// A data file named by a service section could not be read.
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The section is well-formed but makes no sense (unknown service,
    /// empty data file, zero interval).
    #[error("service '{service}': {reason}")]
    Invalid { service: String, reason: String },
}
