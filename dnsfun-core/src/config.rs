//! Explicit configuration loaded once at startup.
//!
//! # File layout
//!
//! ```toml
//! [server]
//! address = ":5354"
//! domain  = "localhost"
//!
//! [fx]
//! enabled = true
//! snapshot_enabled = true
//! snapshot_file = "fx.snapshot"
//! refresh_interval_secs = 21600
//! ```
//!
//! Every top-level table other than `[server]` is a service section keyed by
//! service name. Keys beyond `enabled` / `snapshot_enabled` /
//! `snapshot_file` are service-specific and read via
//! [`ServiceSettings::options`].
//!
//! Several files may be given; they are merged in order, later keys winning.

use std::collections::BTreeMap;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::{ServiceName, SnapshotSettings};

// ---------------------------------------------------------------------------
// 1. Types
// ---------------------------------------------------------------------------

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// `host:port` or `:port` (all interfaces, IPv4 and IPv6).
    pub address: String,
    /// Public name of this server, substituted into help examples.
    pub domain: String,
}

impl ServerConfig {
    /// Resolve `address` to a bindable socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidAddress {
            address: self.address.clone(),
            reason,
        };

        let address = if self.address.starts_with(':') {
            format!("[::]{}", self.address)
        } else {
            self.address.clone()
        };

        if let Ok(addr) = address.parse::<SocketAddr>() {
            return Ok(addr);
        }
        address
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("address resolved to nothing".to_string()))
    }

    /// The port part of `address`, verbatim (`":5354"` → `"5354"`).
    pub fn port(&self) -> &str {
        match self.address.rsplit_once(':') {
            Some((_, port)) => port,
            None => self.address.trim_start_matches(':'),
        }
    }
}

/// One service section.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ServiceSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub snapshot_enabled: bool,
    #[serde(default)]
    pub snapshot_file: Option<PathBuf>,
    /// Everything else in the section.
    #[serde(flatten)]
    pub options: toml::Table,
}

impl ServiceSettings {
    pub fn snapshot(&self) -> SnapshotSettings {
        SnapshotSettings {
            enabled: self.snapshot_enabled,
            file: self.snapshot_file.clone(),
        }
    }

    /// Deserialize the service-specific keys into `T`.
    pub fn options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        Ok(toml::Value::Table(self.options.clone()).try_into()?)
    }
}

/// The whole configuration, passed explicitly to every consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub services: BTreeMap<ServiceName, ServiceSettings>,
}

impl Config {
    /// Settings for `name`, or `None` if the config has no such section.
    pub fn service(&self, name: &str) -> Option<&ServiceSettings> {
        self.services.get(&ServiceName::from(name))
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.service(name).map(|s| s.enabled).unwrap_or(false)
    }

    /// Sections with `enabled = true`, sorted by name.
    pub fn enabled_services(&self) -> impl Iterator<Item = (&ServiceName, &ServiceSettings)> {
        self.services.iter().filter(|(_, s)| s.enabled)
    }

    // -----------------------------------------------------------------------
    // 2. Parsing
    // -----------------------------------------------------------------------

    /// Parse a single TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = contents.parse()?;
        Self::from_table(table)
    }

    /// Build from an already merged table.
    pub fn from_table(mut table: toml::Table) -> Result<Self, ConfigError> {
        let server = table.remove("server").ok_or_else(|| ConfigError::MissingKey {
            key: "server".to_string(),
        })?;
        let server: ServerConfig = server.try_into()?;

        let mut services = BTreeMap::new();
        for (name, section) in table {
            let settings: ServiceSettings = section.try_into()?;
            services.insert(ServiceName::from(name), settings);
        }

        Ok(Self { server, services })
    }

    // -----------------------------------------------------------------------
    // 3. Loading
    // -----------------------------------------------------------------------

    /// Load and merge `paths` in order.
    ///
    /// A file that cannot be read is logged and skipped; a file that cannot
    /// be parsed is an error.
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let mut merged = toml::Table::new();
        for path in paths {
            let path = path.as_ref();
            tracing::info!(path = %path.display(), "reading config");
            let contents = match std::fs::read_to_string(path) {
                Ok(contents) => contents,
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "error reading config");
                    continue;
                }
            };
            let table: toml::Table = contents.parse().map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
            merge_tables(&mut merged, table);
        }
        Self::from_table(merged)
    }
}

/// Deep-merge `overlay` into `base`; scalar and array values in `overlay`
/// replace those in `base`.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
