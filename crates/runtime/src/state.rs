//! Session states derived from the ledger record.

use client_blockchain_core::Game;
use serde::{Deserialize, Serialize};

/// How a game stands (or ended), judged from its record alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Outcome {
    /// Every committed task was reported
    Completed,
    /// Tasks were still outstanding
    Failed,
}

impl Outcome {
    pub fn of(game: &Game) -> Self {
        if game.all_tasks_completed() {
            Outcome::Completed
        } else {
            Outcome::Failed
        }
    }
}

/// The player's current game, as last read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum SessionState {
    /// Nothing has been read yet
    Unknown,
    /// No game on the ledger
    Idle,
    Active(Game),
    Terminal { game: Game, outcome: Outcome },
}

impl SessionState {
    /// Map a ledger record to a state.
    ///
    /// `endGame` clears the record, so a record that is still present is
    /// either in progress or has every task reported.
    pub fn from_record(game: &Game) -> Self {
        if game.is_empty() {
            SessionState::Idle
        } else if game.all_tasks_completed() {
            SessionState::Terminal {
                game: game.clone(),
                outcome: Outcome::of(game),
            }
        } else {
            SessionState::Active(game.clone())
        }
    }

    pub fn game(&self) -> Option<&Game> {
        match self {
            SessionState::Active(game) | SessionState::Terminal { game, .. } => Some(game),
            SessionState::Unknown | SessionState::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SessionState::Active(_))
    }

    /// Short label used in errors and logs.
    pub fn label(&self) -> String {
        match self {
            SessionState::Terminal { outcome, .. } => format!("Terminal({outcome})"),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_blockchain_core::{Address, U256};

    fn game(task_amount: u32, task_completed: u32) -> Game {
        Game {
            time: 1500,
            task_amount,
            task_completed,
            amount: U256::from(1u64),
            break_time: 300,
            rounds: 4,
            player: Address::repeat_byte(1),
        }
    }

    #[test]
    fn empty_record_is_idle() {
        assert_eq!(SessionState::from_record(&Game::empty()), SessionState::Idle);
    }

    #[test]
    fn outstanding_tasks_are_active() {
        assert!(SessionState::from_record(&game(4, 3)).is_active());
        assert!(SessionState::from_record(&game(4, 0)).is_active());
    }

    #[test]
    fn finished_tasks_are_terminal_completed() {
        let state = SessionState::from_record(&game(4, 4));
        assert!(matches!(
            state,
            SessionState::Terminal {
                outcome: Outcome::Completed,
                ..
            }
        ));
        assert_eq!(state.label(), "Terminal(Completed)");
    }

    #[test]
    fn outcome_follows_task_progress() {
        assert_eq!(Outcome::of(&game(4, 1)), Outcome::Failed);
        assert_eq!(Outcome::of(&game(2, 2)), Outcome::Completed);
    }
}
