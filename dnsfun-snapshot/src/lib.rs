//! # dnsfun-snapshot
//!
//! Snapshot persistence for registered services.
//!
//! Call [`restore`] for each snapshot-enabled service before it is registered,
//! and [`sweep`] to persist every snapshot-enabled entry of a
//! [`ServiceRegistry`](dnsfun_core::ServiceRegistry). Files are written
//! atomically and only when their content changes.

pub mod error;
pub mod store;
pub mod sweep;

pub use error::SnapshotError;
pub use store::{read_snapshot, write_snapshot, WriteOutcome};
pub use sweep::{dump_entry, restore, sweep, DumpOutcome, RestoreOutcome, SweepReport};
