//! dnsfun: fun facts over DNS.
//!
//! # Usage
//!
//! ```text
//! dnsfun [--config <path>]...            # same as `dnsfun serve`
//! dnsfun [--config <path>]... serve
//! dnsfun [--config <path>]... check
//! dnsfun --version
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dnsfun",
    version,
    about = "Answer DNS queries with dice rolls, random numbers, currency rates and more",
    long_about = None,
)]
struct Cli {
    /// Config file. Repeat to merge several; later files override earlier ones.
    #[arg(long = "config", short = 'c', global = true, default_value = "config.toml")]
    config: Vec<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the DNS server (the default).
    Serve,

    /// Validate the configuration and print the zones and help records.
    Check,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    dnsfun_server::init_tracing();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => commands::serve::run(&cli.config),
        Commands::Check => commands::check::run(&cli.config),
    }
}
