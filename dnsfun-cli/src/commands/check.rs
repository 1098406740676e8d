//! `dnsfun check`: build everything the server would, without binding.

use std::path::PathBuf;

use anyhow::{Context, Result};
use dnsfun_server::assemble;

pub fn run(config_paths: &[PathBuf]) -> Result<()> {
    let (config, registrations) = super::load(config_paths)?;
    let server = assemble(&config, registrations).context("failed to build service registry")?;

    println!("listen: {}", server.bind_addr());
    println!("services: {}", server.registry().len());
    for entry in server.registry().iter() {
        let zone = entry.zone.to_string();
        match entry.snapshot_file() {
            Some(file) => println!(
                "  {:<8} {:<10} snapshot={}",
                entry.name.0,
                zone,
                file.display()
            ),
            None => println!("  {:<8} {}", entry.name.0, zone),
        }
    }

    println!("help:");
    for entry in server.help().entries() {
        println!("  {}: {}", entry.description, entry.example);
    }
    Ok(())
}
