//! Record helpers shared by the services.

use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{Name, RData, Record};

/// Longest character-string a TXT record can carry.
const MAX_TXT_STRING: usize = 255;

/// A TXT record holding `text`, split into 255-byte strings on character
/// boundaries.
pub(crate) fn txt(name: &Name, ttl: u32, text: &str) -> Record {
    Record::from_rdata(name.clone(), ttl, RData::TXT(TXT::new(chunk(text))))
}

fn chunk(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if current.len() + c.len_utf8() > MAX_TXT_STRING {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}
