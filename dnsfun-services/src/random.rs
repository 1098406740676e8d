//! `rand`: a random integer in an inclusive range, `1-100.rand`.

use dnsfun_core::{HelpEntry, Service, ServiceError, ServiceRequest};
use hickory_proto::rr::Record;
use rand::Rng;

use crate::record;

const TTL: u32 = 1;

#[derive(Debug, Default)]
pub struct Random;

impl Random {
    pub fn new() -> Self {
        Self
    }
}

/// Parse `min-max` into an inclusive range.
pub fn parse_range(subject: &str) -> Result<(u64, u64), ServiceError> {
    let invalid = || ServiceError::InvalidQuery(format!("expected min-max, got '{subject}'"));
    let (min, max) = subject.split_once('-').ok_or_else(invalid)?;
    let min: u64 = min.parse().map_err(|_| invalid())?;
    let max: u64 = max.parse().map_err(|_| invalid())?;
    if min > max {
        return Err(ServiceError::InvalidQuery(format!(
            "min {min} is greater than max {max}"
        )));
    }
    Ok((min, max))
}

impl Service for Random {
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        let (min, max) = parse_range(&request.subject)?;
        let n = rand::thread_rng().gen_range(min..=max);
        Ok(vec![record::txt(&request.name, TTL, &n.to_string())])
    }

    fn help(&self) -> Option<HelpEntry> {
        Some(HelpEntry::new(
            "generate random numbers",
            "dig @{domain} -p {port} 1-100.rand",
        ))
    }
}
