//! dnsfun core library: service contract, configuration, registry, router.
//!
//! Public API surface:
//! - [`service`]: the [`Service`] capability contract
//! - [`config`]: explicit [`Config`] loaded from TOML
//! - [`registry`]: [`ServiceRegistry`], built once at startup
//! - [`router`]: label-suffix [`Router`] and the default handler
//! - [`help`]: the static `help.` records
//! - [`error`]: [`ConfigError`], [`RegistryError`], [`ServiceError`]

pub mod config;
pub mod error;
pub mod help;
pub mod registry;
pub mod router;
pub mod service;
pub mod types;

pub use config::{Config, ServerConfig, ServiceSettings};
pub use error::{ConfigError, RegistryError, ServiceError};
pub use help::HelpRecords;
pub use registry::{Registration, ServiceEntry, ServiceRegistry};
pub use router::{DefaultHandler, Handler, Router};
pub use service::{HelpEntry, Service, ServiceRequest};
pub use types::{ServiceName, SnapshotSettings};
