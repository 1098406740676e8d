//! `dice`: roll `N` dice with `M` sides, `2d6.dice`.

use dnsfun_core::{HelpEntry, Service, ServiceError, ServiceRequest};
use hickory_proto::rr::Record;
use rand::Rng;

use crate::record;

const TTL: u32 = 1;
pub const MAX_DICE: u32 = 100;
pub const MAX_SIDES: u32 = 1000;

#[derive(Debug, Default)]
pub struct Dice;

impl Dice {
    pub fn new() -> Self {
        Self
    }
}

/// Parse `NdM` (`d6` is one die) into `(count, sides)`.
pub fn parse_roll(subject: &str) -> Result<(u32, u32), ServiceError> {
    let invalid = || ServiceError::InvalidQuery(format!("expected NdM, got '{subject}'"));
    let (count, sides) = subject.split_once('d').ok_or_else(invalid)?;
    let count: u32 = if count.is_empty() {
        1
    } else {
        count.parse().map_err(|_| invalid())?
    };
    let sides: u32 = sides.parse().map_err(|_| invalid())?;

    if !(1..=MAX_DICE).contains(&count) {
        return Err(ServiceError::InvalidQuery(format!(
            "dice count must be between 1 and {MAX_DICE}"
        )));
    }
    if !(2..=MAX_SIDES).contains(&sides) {
        return Err(ServiceError::InvalidQuery(format!(
            "sides must be between 2 and {MAX_SIDES}"
        )));
    }
    Ok((count, sides))
}

/// `"7"` for one die, `"3 + 4 = 7"` for several.
fn describe(rolls: &[u32]) -> String {
    let total: u32 = rolls.iter().sum();
    if rolls.len() == 1 {
        return total.to_string();
    }
    let parts: Vec<String> = rolls.iter().map(u32::to_string).collect();
    format!("{} = {}", parts.join(" + "), total)
}

impl Service for Dice {
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        let (count, sides) = parse_roll(&request.subject)?;
        let mut rng = rand::thread_rng();
        let rolls: Vec<u32> = (0..count).map(|_| rng.gen_range(1..=sides)).collect();
        Ok(vec![record::txt(&request.name, TTL, &describe(&rolls))])
    }

    fn help(&self) -> Option<HelpEntry> {
        Some(HelpEntry::new("roll dice", "dig @{domain} -p {port} 1d6.dice"))
    }
}
