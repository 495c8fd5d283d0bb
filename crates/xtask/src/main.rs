//! Development tasks for the Slasher workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod dirs;

use anyhow::Result;
use clap::Parser;
use commands::{Chains, Clean, Keygen};

/// Development tasks for the Slasher workspace
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for Slasher", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate a base-wallet private key
    Keygen(Keygen),

    /// Remove client logs
    Clean(Clean),

    /// Validate and print a chain registry
    Chains(Chains),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for SLASHER_LOG_DIR and other env vars)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.command {
        Command::Keygen(cmd) => cmd.execute(),
        Command::Clean(cmd) => cmd.execute(),
        Command::Chains(cmd) => cmd.execute(),
    }
}
