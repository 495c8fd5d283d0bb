//! Clean client logs command
//!
//! Safety: always prompts for confirmation before deletion.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::io::{self, Write};

use crate::dirs;

/// Remove the client log directory
#[derive(Parser, Debug)]
pub struct Clean {
    /// Skip confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl Clean {
    pub fn execute(self) -> Result<()> {
        let log_dir = dirs::log_dir();

        if !log_dir.exists() {
            println!(
                "{}",
                style("Nothing to clean - log directory doesn't exist yet").dim()
            );
            return Ok(());
        }

        let files = dirs::list_log_files(&log_dir)?;
        println!("{}", style("Clean Slasher Logs").yellow().bold());
        println!();
        println!("The following will be deleted:");
        println!(
            "  {} {} ({} log files)",
            style("→").cyan(),
            style(log_dir.display()).bold(),
            files.len()
        );
        println!();

        if !self.yes && !confirm()? {
            println!("{}", style("Cancelled").dim());
            return Ok(());
        }

        std::fs::remove_dir_all(&log_dir)
            .with_context(|| format!("Failed to delete: {}", log_dir.display()))?;

        println!("{}", style("✓ Cleanup complete!").green().bold());
        Ok(())
    }
}

/// Prompt user for confirmation
fn confirm() -> Result<bool> {
    print!("{} ", style("Proceed? [y/N]").yellow().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
