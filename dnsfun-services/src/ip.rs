//! `ip`: echo the address the query came from.

use std::net::IpAddr;

use dnsfun_core::{HelpEntry, Service, ServiceError, ServiceRequest};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, Record, RecordType};

use crate::record;

const TTL: u32 = 1;

#[derive(Debug, Default)]
pub struct EchoIp;

impl EchoIp {
    pub fn new() -> Self {
        Self
    }
}

impl Service for EchoIp {
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        let name = request.name.clone();
        let ip = request.client.ip();
        let record = match (request.record_type, ip) {
            (RecordType::A, IpAddr::V4(v4)) => Record::from_rdata(name, TTL, RData::A(A(v4))),
            (RecordType::AAAA, IpAddr::V6(v6)) => {
                Record::from_rdata(name, TTL, RData::AAAA(AAAA(v6)))
            }
            _ => record::txt(&name, TTL, &ip.to_string()),
        };
        Ok(vec![record])
    }

    fn help(&self) -> Option<HelpEntry> {
        Some(HelpEntry::new(
            "get your host's requesting IP",
            "dig @{domain} -p {port} ip",
        ))
    }
}
