//! `pi`: digits of pi as TXT, A or AAAA.

use std::net::{Ipv4Addr, Ipv6Addr};

use dnsfun_core::{HelpEntry, Service, ServiceError, ServiceRequest};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{RData, Record, RecordType};

use crate::record;

const TTL: u32 = 86400;

pub const DIGITS: &str = "3.14159265358979323846264338327950288419716939937510\
58209749445923078164062862089986280348253421170679\
82148086513282306647093844609550582231725359408128\
48111745028410270193852110555964462294895493038196";

pub const PI_V4: Ipv4Addr = Ipv4Addr::new(3, 141, 59, 26);
pub const PI_V6: Ipv6Addr = Ipv6Addr::new(
    0x3141, 0x5926, 0x5358, 0x9793, 0x2384, 0x6264, 0x3383, 0x2795,
);

#[derive(Debug, Default)]
pub struct Pi;

impl Pi {
    pub fn new() -> Self {
        Self
    }
}

impl Service for Pi {
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        if !request.subject.is_empty() {
            return Err(ServiceError::InvalidQuery(format!(
                "pi takes no arguments, got '{}'",
                request.subject
            )));
        }
        let name = request.name.clone();
        let record = match request.record_type {
            RecordType::A => Record::from_rdata(name, TTL, RData::A(A(PI_V4))),
            RecordType::AAAA => Record::from_rdata(name, TTL, RData::AAAA(AAAA(PI_V6))),
            _ => record::txt(&name, TTL, DIGITS),
        };
        Ok(vec![record])
    }

    fn help(&self) -> Option<HelpEntry> {
        Some(HelpEntry::new(
            "return digits of pi as TXT, A or AAAA record",
            "dig @{domain} -p {port} pi",
        ))
    }
}
