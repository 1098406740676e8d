pub mod check;
pub mod serve;

use std::path::PathBuf;

use anyhow::{Context, Result};
use dnsfun_core::{Config, Registration};

/// Load the merged config and build every enabled service.
pub fn load(config_paths: &[PathBuf]) -> Result<(Config, Vec<Registration>)> {
    let config = Config::load_files(config_paths).context("failed to load configuration")?;
    let registrations =
        dnsfun_services::build_enabled(&config).context("failed to build services")?;
    Ok((config, registrations))
}
