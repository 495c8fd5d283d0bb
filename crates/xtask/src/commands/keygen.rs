//! Base-wallet key generation command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use client_blockchain_core::BaseWallet;
use client_blockchain_evm::LocalWallet;
use console::style;

const KEY_VAR: &str = "SLASHER_PRIVATE_KEY";

/// Generate a new base-wallet private key
#[derive(Debug, Parser)]
pub struct Keygen {
    /// Append `SLASHER_PRIVATE_KEY` to this env file
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = ".env")]
    pub write: Option<PathBuf>,

    /// Replace an existing key in the env file
    #[arg(long, requires = "write")]
    pub force: bool,

    /// Show private key in output (WARNING: sensitive!)
    #[arg(long)]
    pub show_private_key: bool,
}

impl Keygen {
    pub fn execute(&self) -> Result<()> {
        if self.write.is_none() && !self.show_private_key {
            anyhow::bail!("Nothing to do: pass --write to save the key or --show-private-key to print it");
        }

        let wallet = LocalWallet::random();
        let key = format!("0x{}", wallet.private_key_hex());

        println!("{}", style("Key generated").green().bold());
        println!("Address: {}", style(wallet.address()).cyan());

        if self.show_private_key {
            println!();
            println!("{}", style("WARNING: Do NOT share your private key!").red().bold());
            println!("{key}");
        }

        if let Some(path) = &self.write {
            write_key(path, &key, self.force)?;
            println!("Saved {KEY_VAR} to {}", style(path.display()).dim());
        }

        println!();
        println!("The smart account for this key is shown by `slasher status`.");
        Ok(())
    }
}

/// Add `SLASHER_PRIVATE_KEY=<key>` to the env file at `path`.
fn write_key(path: &Path, key: &str, force: bool) -> Result<()> {
    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let prefix = format!("{KEY_VAR}=");
    let has_key = existing.lines().any(|line| line.trim_start().starts_with(&prefix));
    if has_key && !force {
        anyhow::bail!(
            "{} already defines {KEY_VAR}; pass --force to replace it",
            path.display()
        );
    }

    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| !line.trim_start().starts_with(&prefix))
        .map(str::to_string)
        .collect();
    lines.push(format!("{prefix}{key}"));

    std::fs::write(path, lines.join("\n") + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_to_existing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "SLASHER_CHAIN_ID=84532\n").unwrap();

        write_key(&path, "0xabc", false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "SLASHER_CHAIN_ID=84532\nSLASHER_PRIVATE_KEY=0xabc\n");
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "SLASHER_PRIVATE_KEY=0xold\n").unwrap();

        assert!(write_key(&path, "0xnew", false).is_err());
        write_key(&path, "0xnew", true).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "SLASHER_PRIVATE_KEY=0xnew\n");
    }

    #[test]
    fn creates_missing_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        write_key(&path, "0xabc", false).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "SLASHER_PRIVATE_KEY=0xabc\n");
    }
}
