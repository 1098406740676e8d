//! Service registry.
//!
//! Maps a service name to its live instance, the zone it owns and its
//! snapshot file. Built once at startup, before any query is served; read-only
//! afterwards, so lookups need no locking.
//!
//! Registering a service also claims its zone in the [`Router`]; the two
//! stay consistent because registration is the only way services get routes.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hickory_proto::rr::Name;

use crate::error::RegistryError;
use crate::router::{Router, ServiceHandler};
use crate::service::{HelpEntry, Service};
use crate::types::{ServiceName, SnapshotSettings};

/// A service built from configuration, waiting to be restored and registered.
pub struct Registration {
    pub name: ServiceName,
    pub service: Arc<dyn Service>,
    pub snapshot: SnapshotSettings,
}

impl Registration {
    pub fn new(name: impl Into<ServiceName>, service: Arc<dyn Service>) -> Self {
        Self {
            name: name.into(),
            service,
            snapshot: SnapshotSettings::disabled(),
        }
    }

    pub fn with_snapshot(mut self, snapshot: SnapshotSettings) -> Self {
        self.snapshot = snapshot;
        self
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("snapshot", &self.snapshot)
            .finish_non_exhaustive()
    }
}

/// One registered service.
pub struct ServiceEntry {
    pub name: ServiceName,
    pub zone: Name,
    pub service: Arc<dyn Service>,
    snapshot_file: Option<PathBuf>,
}

impl ServiceEntry {
    pub fn snapshot_enabled(&self) -> bool {
        self.snapshot_file.is_some()
    }

    pub fn snapshot_file(&self) -> Option<&Path> {
        self.snapshot_file.as_deref()
    }
}

impl fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceEntry")
            .field("name", &self.name)
            .field("zone", &self.zone)
            .field("snapshot_file", &self.snapshot_file)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: BTreeMap<ServiceName, ServiceEntry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `service` under `name` and route `name.` to it.
    ///
    /// Fails if the name is not a single DNS label, is already registered,
    /// if its zone is already owned by another route, or if snapshots are
    /// enabled without a file. On failure neither the registry nor the router
    /// is modified.
    pub fn register(
        &mut self,
        name: ServiceName,
        service: Arc<dyn Service>,
        snapshot: &SnapshotSettings,
        router: &mut Router,
    ) -> Result<&ServiceEntry, RegistryError> {
        let zone = name.zone()?;
        if self.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateService { name: name.0 });
        }
        let snapshot_file = snapshot_file_for(&name, service.as_ref(), snapshot)?;

        let handler = Arc::new(ServiceHandler::new(name.clone(), service.clone()));
        router.handle(zone.clone(), handler)?;

        tracing::info!(
            service = %name,
            zone = %zone,
            snapshot = snapshot_file.is_some(),
            "service registered",
        );

        let entry = ServiceEntry {
            name: name.clone(),
            zone,
            service,
            snapshot_file,
        };
        Ok(self.entries.entry(name).or_insert(entry))
    }

    pub fn get(&self, name: &str) -> Option<&ServiceEntry> {
        self.entries.get(&ServiceName::from(name))
    }

    /// Entries sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose state is persisted on sweep.
    pub fn snapshot_entries(&self) -> impl Iterator<Item = &ServiceEntry> {
        self.entries.values().filter(|e| e.snapshot_enabled())
    }

    /// Self-descriptions of every service that offers one.
    pub fn help_entries(&self) -> Vec<HelpEntry> {
        self.entries
            .values()
            .filter_map(|e| e.service.help())
            .collect()
    }
}

/// Where `service`'s snapshot lives, or `None` if it is not snapshotted.
fn snapshot_file_for(
    name: &ServiceName,
    service: &dyn Service,
    snapshot: &SnapshotSettings,
) -> Result<Option<PathBuf>, RegistryError> {
    if !snapshot.enabled {
        return Ok(None);
    }
    let Some(file) = snapshot.file.clone() else {
        return Err(RegistryError::MissingSnapshotFile { name: name.0.clone() });
    };
    if !service.supports_snapshot() {
        tracing::warn!(
            service = %name,
            "snapshot_enabled is set but the service keeps no snapshot state; ignoring",
        );
        return Ok(None);
    }
    Ok(Some(file))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
