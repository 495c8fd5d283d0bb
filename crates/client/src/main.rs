//! Pomodoro staking client binary.
//!
//! This binary is the composition root that assembles:
//! 1. Configuration from the environment (and `.env`)
//! 2. The EVM account and ledger stack via `ClientBuilder`
//! 3. One authenticated session per invocation
//!
//! # Examples
//!
//! ```bash
//! slasher status
//! slasher create --time 25 --tasks 4 --stake 0.01 --break-time 5 --rounds 4
//! slasher complete
//! slasher end
//! ```

mod cli;
mod commands;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_blockchain_core::{BaseWallet, SessionError};
use client_bootstrap::{ClientBuilder, ClientConfig, SessionSlot};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = ClientConfig::from_env();

    let _guard = match logging::setup_logging(&config.resolved_log_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {e:#}");
            None
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_error(&err));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    let wallet = config
        .wallet()?
        .map(|wallet| Arc::new(wallet) as Arc<dyn BaseWallet>);
    let context = ClientBuilder::new(config).build()?;

    let progress = commands::watch_operations(context.events());
    let mut slot = SessionSlot::new();
    let mut stdout = std::io::stdout();
    let result = commands::execute(cli.command, &context, &mut slot, wallet, &mut stdout).await;
    slot.logout();
    progress.abort();

    result
}

/// Failure line printed once per invocation.
fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<SessionError>() {
        Some(session) if session.requires_rehydrate() => format!(
            "error[{}]: {session}\n  the operation may still land; run `slasher status` to check",
            session.name()
        ),
        Some(session) => format!("error[{}]: {session}", session.name()),
        None => format!("error: {err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::OperationKind;

    #[test]
    fn session_errors_carry_taxonomy_name() {
        let err = anyhow::Error::from(SessionError::OperationInFlight {
            in_flight: OperationKind::CreateGame,
        });
        assert_eq!(render_error(&err), "error[OperationInFlight]: CreateGame is still in flight");
    }

    #[test]
    fn other_errors_render_with_context() {
        let err = anyhow::anyhow!("file missing").context("Failed to load chains file");
        assert_eq!(render_error(&err), "error: Failed to load chains file: file missing");
    }
}
