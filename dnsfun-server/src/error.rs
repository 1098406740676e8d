use dnsfun_core::{ConfigError, RegistryError};
use thiserror::Error;

/// Error surface for startup and the running server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("{0} task join failure")]
    Join(String),
}

pub(crate) fn io_err(context: impl Into<String>, source: std::io::Error) -> ServerError {
    ServerError::Io {
        context: context.into(),
        source,
    }
}
