//! `dict`: word definitions, `fun.dict`.
//!
//! Definitions come from a tab-separated file, one sense per line:
//!
//! ```text
//! # word<TAB>part of speech<TAB>definition
//! fun	noun	activities that are enjoyable or amusing
//! fun	adjective	providing enjoyment
//! ```
//!
//! The file is read once when the service is built; blank lines and lines
//! starting with `#` are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use dnsfun_core::{HelpEntry, Service, ServiceError, ServiceRequest};
use hickory_proto::rr::Record;
use serde::Deserialize;

use crate::error::BuildError;
use crate::record;

const TTL: u32 = 86400;
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Service-specific keys of the `[dict]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct DictOptions {
    pub definitions_path: PathBuf,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sense {
    pub part_of_speech: String,
    pub definition: String,
}

#[derive(Debug)]
pub struct Dict {
    words: HashMap<String, Vec<Sense>>,
    max_results: usize,
}

impl Dict {
    /// Load definitions from `options.definitions_path`.
    pub fn open(options: &DictOptions) -> Result<Self, BuildError> {
        let path = &options.definitions_path;
        let contents = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.clone(),
            source,
        })?;
        let dict = Self::parse(&contents, options.max_results, path)?;
        tracing::info!(
            path = %path.display(),
            words = dict.len(),
            "dictionary loaded",
        );
        Ok(dict)
    }

    fn parse(contents: &str, max_results: usize, path: &Path) -> Result<Self, BuildError> {
        if max_results == 0 {
            return Err(BuildError::Invalid {
                service: "dict".to_string(),
                reason: "max_results must be at least 1".to_string(),
            });
        }

        let mut words: HashMap<String, Vec<Sense>> = HashMap::new();
        for (index, line) in contents.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.splitn(3, '\t');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(word), Some(pos), Some(definition)) if !word.trim().is_empty() => {
                    words
                        .entry(word.trim().to_lowercase())
                        .or_default()
                        .push(Sense {
                            part_of_speech: pos.trim().to_string(),
                            definition: definition.trim().to_string(),
                        });
                }
                _ => tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    "skipping malformed definition line",
                ),
            }
        }

        if words.is_empty() {
            return Err(BuildError::Invalid {
                service: "dict".to_string(),
                reason: format!("no definitions in {}", path.display()),
            });
        }
        Ok(Self { words, max_results })
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Senses of `word`, at most `max_results` of them.
    pub fn lookup(&self, word: &str) -> Option<&[Sense]> {
        self.words
            .get(word)
            .map(|senses| &senses[..senses.len().min(self.max_results)])
    }
}

impl Service for Dict {
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        let word = request.subject.as_str();
        if word.is_empty() {
            return Err(ServiceError::InvalidQuery("no word given".to_string()));
        }
        let senses = self
            .lookup(word)
            .ok_or_else(|| ServiceError::InvalidQuery(format!("no definition for '{word}'")))?;
        Ok(senses
            .iter()
            .map(|sense| {
                let text = format!("{} ({}): {}", word, sense.part_of_speech, sense.definition);
                record::txt(&request.name, TTL, &text)
            })
            .collect())
    }

    fn help(&self) -> Option<HelpEntry> {
        Some(HelpEntry::new(
            "get the definition of an English word",
            "dig @{domain} -p {port} fun.dict",
        ))
    }
}
