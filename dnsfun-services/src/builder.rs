//! Build the services enabled in a [`Config`].

use std::sync::Arc;

use dnsfun_core::{Config, Registration, Service, ServiceName, ServiceSettings};
use serde::de::DeserializeOwned;

use crate::dice::Dice;
use crate::dict::{Dict, DictOptions};
use crate::error::BuildError;
use crate::fx::{Fx, FxOptions};
use crate::ip::EchoIp;
use crate::pi::Pi;
use crate::random::Random;

/// Every service name this crate can build.
pub const KNOWN_SERVICES: &[&str] = &["dice", "dict", "fx", "ip", "pi", "rand"];

/// One registration per enabled section, sorted by name.
///
/// A section naming a service this crate does not know is an error, so a
/// typo never silently disables a service.
pub fn build_enabled(config: &Config) -> Result<Vec<Registration>, BuildError> {
    config
        .enabled_services()
        .map(|(name, settings)| {
            let service = build_one(name, settings)?;
            tracing::debug!(service = %name, "service built");
            Ok(Registration::new(name.clone(), service).with_snapshot(settings.snapshot()))
        })
        .collect()
}

fn build_one(name: &ServiceName, settings: &ServiceSettings) -> Result<Arc<dyn Service>, BuildError> {
    let service: Arc<dyn Service> = match name.0.as_str() {
        "dice" => Arc::new(Dice::new()),
        "rand" => Arc::new(Random::new()),
        "pi" => Arc::new(Pi::new()),
        "ip" => Arc::new(EchoIp::new()),
        "fx" => {
            let options: FxOptions = options(name, settings)?;
            if options.refresh_interval_secs == 0 {
                return Err(invalid(name, "refresh_interval_secs must be at least 1"));
            }
            Arc::new(Fx::new(options))
        }
        "dict" => {
            let options: DictOptions = options(name, settings)?;
            Arc::new(Dict::open(&options)?)
        }
        other => {
            return Err(invalid(
                name,
                &format!("unknown service '{other}' (known: {})", KNOWN_SERVICES.join(", ")),
            ))
        }
    };
    Ok(service)
}

fn options<T: DeserializeOwned>(
    name: &ServiceName,
    settings: &ServiceSettings,
) -> Result<T, BuildError> {
    settings.options().map_err(|source| BuildError::Config {
        service: name.0.clone(),
        source,
    })
}

fn invalid(name: &ServiceName, reason: &str) -> BuildError {
    BuildError::Invalid {
        service: name.0.clone(),
        reason: reason.to_string(),
    }
}
