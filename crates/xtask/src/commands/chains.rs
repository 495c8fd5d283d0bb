//! Validate and print a chain registry.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use client_blockchain_evm::ChainRegistry;
use console::style;

/// Validate a chains TOML file (or show the built-in registry)
#[derive(Debug, Parser)]
pub struct Chains {
    /// Chains file; defaults to the built-in registry
    pub file: Option<PathBuf>,
}

impl Chains {
    pub fn execute(self) -> Result<()> {
        let registry = match &self.file {
            Some(path) => ChainRegistry::from_toml_file(path)
                .with_context(|| format!("Invalid chains file: {}", path.display()))?,
            None => ChainRegistry::builtin(),
        };

        let source = self
            .file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string());
        println!(
            "{} {} ({} chains)",
            style("✓").green().bold(),
            style(source).bold(),
            registry.len()
        );

        let default_id = registry.default_chain().chain_id;
        for chain in registry.iter() {
            let marker = if chain.chain_id == default_id {
                style("*").yellow().bold()
            } else {
                style(" ")
            };
            println!(
                "{marker} {:>8}  {}",
                style(chain.chain_id).cyan(),
                style(&chain.name).bold()
            );
            println!("            contract  {}", chain.contract_address);
            println!("            rpc       {}", chain.rpc_url);
            println!("            explorer  {}", chain.explorer_url_prefix);
        }
        Ok(())
    }
}
