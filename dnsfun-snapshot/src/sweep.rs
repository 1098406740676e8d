//! Restore at startup, dump on sweep.
//!
//! Both directions are best-effort: every failure is logged and reported in
//! the returned outcome, never propagated, so one misbehaving service cannot
//! keep the others from starting or from being persisted.

use std::path::Path;

use dnsfun_core::{Service, ServiceEntry, ServiceName, ServiceRegistry};

use crate::error::SnapshotError;
use crate::store::{read_snapshot, write_snapshot, WriteOutcome};

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

/// What happened when restoring one service.
#[derive(Debug)]
pub enum RestoreOutcome {
    /// No snapshot file yet: the service starts fresh.
    NoSnapshot,
    /// The service loaded `bytes` bytes of prior state.
    Restored { bytes: usize },
    /// Reading or loading failed; the service keeps its default state.
    Failed(SnapshotError),
}

/// Feed the snapshot at `file` into `service`.
pub fn restore(name: &ServiceName, service: &dyn Service, file: &Path) -> RestoreOutcome {
    let bytes = match read_snapshot(file) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::info!("no {} snapshot at {}, starting fresh", name, file.display());
            return RestoreOutcome::NoSnapshot;
        }
        Err(err) => {
            tracing::error!("error reading {} snapshot: {}", name, err);
            return RestoreOutcome::Failed(err);
        }
    };

    match service.load(&bytes) {
        Ok(()) => {
            tracing::info!(
                "restored {} snapshot from {} ({} bytes)",
                name,
                file.display(),
                bytes.len()
            );
            RestoreOutcome::Restored { bytes: bytes.len() }
        }
        Err(source) => {
            let err = SnapshotError::Service {
                name: name.0.clone(),
                source,
            };
            tracing::error!("error loading {} snapshot: {}", name, err);
            RestoreOutcome::Failed(err)
        }
    }
}

// ---------------------------------------------------------------------------
// Dump
// ---------------------------------------------------------------------------

/// What happened when dumping one service.
#[derive(Debug)]
pub enum DumpOutcome {
    /// New state written to disk.
    Written { digest: String },
    /// State identical to the file on disk; nothing written.
    Unchanged { digest: String },
    /// The service had nothing to persist.
    Empty,
    Failed(SnapshotError),
}

impl DumpOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, DumpOutcome::Failed(_))
    }
}

/// Result of one sweep over the registry, in registry order.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub outcomes: Vec<(ServiceName, DumpOutcome)>,
}

impl SweepReport {
    pub fn written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, DumpOutcome::Written { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_failure()).count()
    }

    pub fn get(&self, name: &str) -> Option<&DumpOutcome> {
        self.outcomes
            .iter()
            .find(|(n, _)| n.0 == name)
            .map(|(_, o)| o)
    }
}

/// Dump one entry to its snapshot file. Entries without snapshots are
/// reported as [`DumpOutcome::Empty`].
pub fn dump_entry(entry: &ServiceEntry) -> DumpOutcome {
    let Some(file) = entry.snapshot_file() else {
        return DumpOutcome::Empty;
    };

    let bytes = match entry.service.dump() {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::debug!("{} has nothing to snapshot", entry.name);
            return DumpOutcome::Empty;
        }
        Err(source) => {
            let err = SnapshotError::Service {
                name: entry.name.0.clone(),
                source,
            };
            tracing::error!("error generating {} snapshot: {}", entry.name, err);
            return DumpOutcome::Failed(err);
        }
    };

    tracing::info!("saving {} snapshot to {}", entry.name, file.display());
    match write_snapshot(file, &bytes) {
        Ok(WriteOutcome::Written { digest }) => DumpOutcome::Written { digest },
        Ok(WriteOutcome::Unchanged { digest }) => DumpOutcome::Unchanged { digest },
        Err(err) => {
            tracing::error!("error writing {} snapshot: {}", entry.name, err);
            DumpOutcome::Failed(err)
        }
    }
}

/// Dump every snapshot-enabled entry, one at a time.
pub fn sweep(registry: &ServiceRegistry) -> SweepReport {
    let outcomes = registry
        .snapshot_entries()
        .map(|entry| (entry.name.clone(), dump_entry(entry)))
        .collect();
    let report = SweepReport { outcomes };
    tracing::info!(
        "snapshot sweep done: {} entries, {} written, {} failed",
        report.outcomes.len(),
        report.written(),
        report.failed()
    );
    report
}
