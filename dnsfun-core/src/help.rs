//! The static `help.` response.
//!
//! Built once after all services are registered: one TXT record per service
//! that describes itself, `help. 86400 IN TXT "<description>" "<example>"`,
//! with `{domain}` and `{port}` in the example replaced by the server's
//! public domain and listening port.

use std::sync::Arc;

use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{Name, RData, Record};

use crate::config::ServerConfig;
use crate::error::{RegistryError, ServiceError};
use crate::router::{Handler, Router};
use crate::service::{HelpEntry, ServiceRequest};
use crate::types::ServiceName;

pub const HELP_TTL: u32 = 86400;
pub const HELP_LABEL: &str = "help";

/// Rendered help lines and their records. Immutable once built.
#[derive(Debug, Clone)]
pub struct HelpRecords {
    entries: Vec<HelpEntry>,
    records: Vec<Record>,
}

impl HelpRecords {
    pub fn build(
        entries: impl IntoIterator<Item = HelpEntry>,
        server: &ServerConfig,
    ) -> Result<Self, RegistryError> {
        let zone = help_zone()?;
        let entries: Vec<HelpEntry> = entries
            .into_iter()
            .map(|entry| HelpEntry {
                example: render_example(&entry.example, &server.domain, server.port()),
                description: entry.description,
            })
            .collect();

        let records = entries
            .iter()
            .map(|entry| {
                Record::from_rdata(
                    zone.clone(),
                    HELP_TTL,
                    RData::TXT(TXT::new(vec![
                        entry.description.clone(),
                        entry.example.clone(),
                    ])),
                )
            })
            .collect();

        Ok(Self { entries, records })
    }

    /// Rendered entries, in record order.
    pub fn entries(&self) -> &[HelpEntry] {
        &self.entries
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Route `help.` to these records.
    pub fn install(self: Arc<Self>, router: &mut Router) -> Result<(), RegistryError> {
        router.handle(help_zone()?, Arc::new(HelpHandler { help: self }))
    }
}

/// Answers every `help.` query with the same records.
struct HelpHandler {
    help: Arc<HelpRecords>,
}

impl Handler for HelpHandler {
    fn handle(&self, _request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        Ok(self.help.records.clone())
    }
}

fn help_zone() -> Result<Name, RegistryError> {
    ServiceName::from(HELP_LABEL).zone()
}

fn render_example(template: &str, domain: &str, port: &str) -> String {
    template.replace("{domain}", domain).replace("{port}", port)
}
