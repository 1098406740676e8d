//! `fx`: currency conversion, `99usd-inr.fx`.
//!
//! Rates are fetched from a JSON endpoint returning
//! `{"base_code": "USD", "rates": {"USD": 1.0, "INR": 83.2, ...}}` and kept
//! in memory together with the time they were fetched. The whole table is
//! the service's snapshot state, so a restart inside the refresh interval
//! serves restored rates without hitting the network.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dnsfun_core::{HelpEntry, Service, ServiceError, ServiceRequest};
use hickory_proto::rr::Record;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::record;

const TTL: u32 = 900;
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_REFRESH_SECS: u64 = 6 * 60 * 60;

/// Service-specific keys of the `[fx]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct FxOptions {
    #[serde(default = "default_refresh_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_rates_url")]
    pub rates_url: String,
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

fn default_rates_url() -> String {
    DEFAULT_RATES_URL.to_string()
}

impl Default for FxOptions {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_SECS,
            rates_url: default_rates_url(),
        }
    }
}

/// One fetched rate table. This is also the snapshot payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rates {
    pub base: String,
    pub rates: BTreeMap<String, f64>,
    pub fetched_at: DateTime<Utc>,
}

impl Rates {
    fn rate(&self, currency: &str) -> Option<f64> {
        if currency == self.base {
            return Some(1.0);
        }
        self.rates.get(currency).copied()
    }

    /// Convert `amount` of `from` into `to`.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<f64, ServiceError> {
        let unknown = |c: &str| ServiceError::InvalidQuery(format!("unknown currency '{c}'"));
        let from_rate = self.rate(from).ok_or_else(|| unknown(from))?;
        let to_rate = self.rate(to).ok_or_else(|| unknown(to))?;
        Ok(amount / from_rate * to_rate)
    }

    fn validate(&self) -> Result<(), String> {
        if self.rates.is_empty() {
            return Err("rate table is empty".to_string());
        }
        match self.rates.iter().find(|(_, r)| !r.is_finite() || **r <= 0.0) {
            Some((currency, rate)) => Err(format!("bad rate {rate} for {currency}")),
            None => Ok(()),
        }
    }
}

/// Shape of the upstream response.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(alias = "base_code")]
    base: String,
    rates: BTreeMap<String, f64>,
}

/// A parsed `99usd-inr` subject.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

impl Conversion {
    /// Parse `<amount><from>-<to>`. Amounts may carry a decimal part
    /// (`1.5usd-eur`); currency codes are three letters and are returned
    /// uppercase.
    pub fn parse(subject: &str) -> Result<Self, ServiceError> {
        let invalid = || {
            ServiceError::InvalidQuery(format!("expected <amount><from>-<to>, got '{subject}'"))
        };
        let (left, to) = subject.split_once('-').ok_or_else(invalid)?;
        let split = left
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (amount, from) = left.split_at(split);
        let amount: f64 = amount.parse().map_err(|_| invalid())?;
        if !amount.is_finite() || amount < 0.0 {
            return Err(invalid());
        }
        let code = |c: &str| {
            if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()) {
                Ok(c.to_ascii_uppercase())
            } else {
                Err(invalid())
            }
        };
        Ok(Self {
            amount,
            from: code(from)?,
            to: code(to)?,
        })
    }
}

pub struct Fx {
    options: FxOptions,
    state: RwLock<Option<Rates>>,
}

impl Fx {
    pub fn new(options: FxOptions) -> Self {
        Self {
            options,
            state: RwLock::new(None),
        }
    }

    /// The currently held rate table, if any.
    pub fn rates(&self) -> Option<Rates> {
        self.state.read().clone()
    }

    fn replace(&self, rates: Rates) {
        *self.state.write() = Some(rates);
    }

    /// Whether the held table is younger than the refresh interval.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        let Some(fetched_at) = self.state.read().as_ref().map(|r| r.fetched_at) else {
            return false;
        };
        let age = now.signed_duration_since(fetched_at);
        age.num_seconds() >= 0 && (age.num_seconds() as u64) < self.options.refresh_interval_secs
    }

    fn fetch(&self) -> Result<Rates, ServiceError> {
        let unavailable = |e: String| ServiceError::Unavailable(format!("fetching rates: {e}"));
        let response: RatesResponse = ureq::get(&self.options.rates_url)
            .timeout(FETCH_TIMEOUT)
            .call()
            .map_err(|e| unavailable(e.to_string()))?
            .into_json()
            .map_err(|e| unavailable(e.to_string()))?;
        let rates = Rates {
            base: response.base.to_ascii_uppercase(),
            rates: response
                .rates
                .into_iter()
                .map(|(k, v)| (k.to_ascii_uppercase(), v))
                .collect(),
            fetched_at: Utc::now(),
        };
        rates.validate().map_err(unavailable)?;
        Ok(rates)
    }
}

impl Service for Fx {
    fn query(&self, request: &ServiceRequest) -> Result<Vec<Record>, ServiceError> {
        let conversion = Conversion::parse(&request.subject)?;
        let state = self.state.read();
        let rates = state
            .as_ref()
            .ok_or_else(|| ServiceError::Unavailable("rates not loaded yet".to_string()))?;
        let converted = rates.convert(conversion.amount, &conversion.from, &conversion.to)?;
        let text = format!(
            "{:.2} {} = {:.2} {}",
            conversion.amount, conversion.from, converted, conversion.to
        );
        Ok(vec![record::txt(&request.name, TTL, &text)])
    }

    fn help(&self) -> Option<HelpEntry> {
        Some(HelpEntry::new(
            "convert currency rates",
            "dig @{domain} -p {port} 99USD-INR.fx",
        ))
    }

    fn supports_snapshot(&self) -> bool {
        true
    }

    fn dump(&self) -> Result<Option<Vec<u8>>, ServiceError> {
        let state = self.state.read();
        let Some(rates) = state.as_ref() else {
            return Ok(None);
        };
        serde_json::to_vec(rates)
            .map(Some)
            .map_err(|e| ServiceError::Snapshot(e.to_string()))
    }

    fn load(&self, bytes: &[u8]) -> Result<(), ServiceError> {
        let rates: Rates =
            serde_json::from_slice(bytes).map_err(|e| ServiceError::Snapshot(e.to_string()))?;
        rates.validate().map_err(ServiceError::Snapshot)?;
        self.replace(rates);
        Ok(())
    }

    fn refresh_interval(&self) -> Option<Duration> {
        Some(Duration::from_secs(self.options.refresh_interval_secs))
    }

    fn refresh(&self) -> Result<(), ServiceError> {
        if self.is_fresh(Utc::now()) {
            tracing::debug!("fx rates still fresh, skipping fetch");
            return Ok(());
        }
        let rates = self.fetch()?;
        tracing::info!(
            base = %rates.base,
            currencies = rates.rates.len(),
            "fx rates refreshed",
        );
        self.replace(rates);
        Ok(())
    }
}
