//! `dnsfun serve`: run until a terminating signal.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dnsfun_server::{assemble, start_blocking};

pub fn run(config_paths: &[PathBuf]) -> Result<()> {
    let (config, registrations) = super::load(config_paths)?;
    let server = assemble(&config, registrations).context("failed to build service registry")?;
    start_blocking(server).context("server exited with error")?;
    Ok(())
}
