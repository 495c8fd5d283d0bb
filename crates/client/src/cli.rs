//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use client_blockchain_core::{GameConfig, SessionError};

/// Stake on your focus sessions
#[derive(Parser, Debug)]
#[command(name = "slasher")]
#[command(about = "Pomodoro staking client", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List supported networks
    Chains,

    /// Show the smart account and the current game
    Status,

    /// Stake on a new game
    Create(CreateArgs),

    /// Report one finished task
    Complete,

    /// End the current game and settle the stake
    End,

    /// Print the fiat on-ramp link for the smart account
    Fund {
        /// Suggested fiat amount
        #[arg(long)]
        amount: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Focus session length in minutes
    #[arg(long, default_value_t = 25)]
    pub time: u64,

    /// Tasks to complete
    #[arg(long, default_value_t = 1)]
    pub tasks: u32,

    /// Stake in ether
    #[arg(long, default_value = "0.01")]
    pub stake: String,

    /// Break length in minutes
    #[arg(long = "break-time", default_value_t = 5)]
    pub break_time: u64,

    #[arg(long, default_value_t = 4)]
    pub rounds: u32,
}

impl CreateArgs {
    pub fn game_config(&self) -> Result<GameConfig, SessionError> {
        GameConfig::from_minutes(
            self.time,
            self.tasks,
            &self.stake,
            self.break_time,
            self.rounds,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_defaults_match_a_standard_pomodoro() {
        let cli = Cli::try_parse_from(["slasher", "create"]).unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let config = args.game_config().unwrap();

        assert_eq!(config.time, 25 * 60);
        assert_eq!(config.task_amount, 1);
        assert_eq!(config.break_time, 5 * 60);
        assert_eq!(config.rounds, 4);
        assert_eq!(config.amount.to_string(), "10000000000000000");
    }

    #[test]
    fn create_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "slasher", "create", "--time", "50", "--tasks", "4", "--stake", "0.5",
            "--break-time", "10", "--rounds", "2",
        ])
        .unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };
        let config = args.game_config().unwrap();

        assert_eq!(config.time, 3000);
        assert_eq!(config.task_amount, 4);
        assert_eq!(config.break_time, 600);
        assert_eq!(config.rounds, 2);
    }

    #[test]
    fn bad_stake_is_invalid_config() {
        let cli = Cli::try_parse_from(["slasher", "create", "--stake", "lots"]).unwrap();
        let Command::Create(args) = cli.command else {
            panic!("expected create");
        };

        assert!(matches!(args.game_config(), Err(SessionError::InvalidConfig(_))));
    }

    #[test]
    fn fund_takes_optional_amount() {
        let cli = Cli::try_parse_from(["slasher", "fund", "--amount", "50"]).unwrap();
        assert!(matches!(cli.command, Command::Fund { amount: Some(ref a) } if a == "50"));
    }
}
