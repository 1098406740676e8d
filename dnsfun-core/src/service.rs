//! The capability contract every pluggable service satisfies.

use std::net::SocketAddr;
use std::time::Duration;

use hickory_proto::rr::{Name, Record, RecordType};

use crate::error::ServiceError;

/// One inbound question, already routed to the service that owns its zone.
#[derive(Debug, Clone)]
pub struct ServiceRequest {
    /// Full query name, e.g. `2d6.dice.`.
    pub name: Name,
    /// Labels left of the zone, lowercased and dot-joined (`2d6`). Empty when
    /// the zone apex itself was queried.
    pub subject: String,
    pub record_type: RecordType,
    /// Source address of the datagram.
    pub client: SocketAddr,
}

/// Human-readable self-description used to build the `help.` response.
///
/// `example` may contain `{domain}` and `{port}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub description: String,
    pub example: String,
}

impl HelpEntry {
    pub fn new(description: impl Into<String>, example: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            example: example.into(),
        }
    }
}

/// A pluggable unit answering DNS queries for its zone.
///
/// `query` may run concurrently with itself and with `dump`/`load`;
/// implementations synchronize their own state.
pub trait Service: Send + Sync {
    /// Answer one question. Returned records go into the answer section.
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError>;

    /// Self-description for the help record, if any.
    fn help(&self) -> Option<HelpEntry> {
        None
    }

    /// Whether `dump`/`load` are meaningful for this service.
    ///
    /// Services answering `false` are never asked to dump or load, even if
    /// snapshots are enabled for them in configuration.
    fn supports_snapshot(&self) -> bool {
        false
    }

    /// Serialize the current state. `Ok(None)` means nothing to persist.
    fn dump(&self) -> Result<Option<Vec<u8>>, ServiceError> {
        Ok(None)
    }

    /// Replace the current state with a previously dumped one.
    fn load(&self, _bytes: &[u8]) -> Result<(), ServiceError> {
        Err(ServiceError::NotImplemented)
    }

    /// Period at which [`Service::refresh`] should run, if the service keeps
    /// state that goes stale.
    fn refresh_interval(&self) -> Option<Duration> {
        None
    }

    /// Refresh internal state from its upstream source. May block.
    fn refresh(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
