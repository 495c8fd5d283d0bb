//! Pomodoro ledger contract interface.
//!
//! The contract is the source of truth for stakes and outcomes. This module
//! only describes it: call encoding for the three mutating functions and
//! decoding of the `games(address)` record.
//!
//! ## Solidity Reference
//!
//! ```solidity
//! struct Game {
//!     uint256 time;
//!     uint32 taskAmount;
//!     uint32 taskCompleted;
//!     uint256 amount;
//!     uint256 breakTime;
//!     uint32 rounds;
//!     address player;
//! }
//! mapping(address => Game) public games;
//! ```

use alloy_sol_types::{SolCall, SolInterface, sol};
use serde::{Deserialize, Serialize};

use crate::error::TransportError;
use crate::types::{Address, Bytes, Game, GameConfig, OperationKind, U256};

sol! {
    /// Pomodoro staking ledger.
    interface IPomodoro {
        /// Opens a game for `msg.sender`; `msg.value` must carry the stake.
        function createGame(
            uint256 time,
            uint32 taskAmount,
            uint256 amount,
            uint256 breakTime,
            uint32 rounds
        ) external payable;

        /// Increments `taskCompleted` on the caller's game.
        function completeTask() external;

        /// Finalizes the caller's game. Payout and slash are decided on-chain.
        function endGame() external;

        function games(address account) external view returns (
            uint256 time,
            uint32 taskAmount,
            uint32 taskCompleted,
            uint256 amount,
            uint256 breakTime,
            uint32 rounds,
            address player
        );
    }
}

/// A ready-to-submit contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCall {
    pub to: Address,
    /// Native value attached to the call
    pub value: U256,
    pub data: Bytes,
}

/// Mutating ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerOperation {
    CreateGame(GameConfig),
    CompleteTask,
    EndGame,
}

impl LedgerOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            LedgerOperation::CreateGame(_) => OperationKind::CreateGame,
            LedgerOperation::CompleteTask => OperationKind::CompleteTask,
            LedgerOperation::EndGame => OperationKind::EndGame,
        }
    }

    /// ABI-encoded calldata, selector included.
    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            LedgerOperation::CreateGame(config) => IPomodoro::createGameCall {
                time: U256::from(config.time),
                taskAmount: config.task_amount,
                amount: config.amount,
                breakTime: U256::from(config.break_time),
                rounds: config.rounds,
            }
            .abi_encode(),
            LedgerOperation::CompleteTask => IPomodoro::completeTaskCall {}.abi_encode(),
            LedgerOperation::EndGame => IPomodoro::endGameCall {}.abi_encode(),
        };
        Bytes::from(encoded)
    }

    /// Native value to transfer. Only `createGame` is payable.
    pub fn value(&self) -> U256 {
        match self {
            LedgerOperation::CreateGame(config) => config.amount,
            LedgerOperation::CompleteTask | LedgerOperation::EndGame => U256::ZERO,
        }
    }

    pub fn into_call(self, contract: Address) -> LedgerCall {
        LedgerCall {
            to: contract,
            value: self.value(),
            data: self.calldata(),
        }
    }

    /// Inverse of [`LedgerOperation::calldata`].
    pub fn decode(data: &[u8]) -> Result<Self, TransportError> {
        let call = IPomodoro::IPomodoroCalls::abi_decode(data)
            .map_err(|e| TransportError::Decode(format!("unknown ledger call: {e}")))?;

        match call {
            IPomodoro::IPomodoroCalls::createGame(args) => {
                Ok(LedgerOperation::CreateGame(GameConfig {
                    time: u256_to_u64(args.time, "time")?,
                    task_amount: args.taskAmount,
                    amount: args.amount,
                    break_time: u256_to_u64(args.breakTime, "breakTime")?,
                    rounds: args.rounds,
                }))
            }
            IPomodoro::IPomodoroCalls::completeTask(_) => Ok(LedgerOperation::CompleteTask),
            IPomodoro::IPomodoroCalls::endGame(_) => Ok(LedgerOperation::EndGame),
            IPomodoro::IPomodoroCalls::games(_) => Err(TransportError::Decode(
                "games(address) is a read, not an operation".to_string(),
            )),
        }
    }
}

/// Calldata for the `games(player)` read.
pub fn games_calldata(player: Address) -> Bytes {
    Bytes::from(IPomodoro::gamesCall { account: player }.abi_encode())
}

/// Decode the return data of `games(player)`.
pub fn decode_game(data: &[u8]) -> Result<Game, TransportError> {
    let record = IPomodoro::gamesCall::abi_decode_returns(data)
        .map_err(|e| TransportError::Decode(format!("malformed games() return: {e}")))?;

    Ok(Game {
        time: u256_to_u64(record.time, "time")?,
        task_amount: record.taskAmount,
        task_completed: record.taskCompleted,
        amount: record.amount,
        break_time: u256_to_u64(record.breakTime, "breakTime")?,
        rounds: record.rounds,
        player: record.player,
    })
}

/// Encode a record the way the contract returns it.
pub fn encode_game(game: &Game) -> Bytes {
    let record = IPomodoro::gamesReturn {
        time: U256::from(game.time),
        taskAmount: game.task_amount,
        taskCompleted: game.task_completed,
        amount: game.amount,
        breakTime: U256::from(game.break_time),
        rounds: game.rounds,
        player: game.player,
    };
    Bytes::from(IPomodoro::gamesCall::abi_encode_returns(&record))
}

fn u256_to_u64(value: U256, field: &str) -> Result<u64, TransportError> {
    value
        .try_into()
        .map_err(|_| TransportError::Decode(format!("{field} overflows u64")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_game_carries_stake_as_value() {
        let config = GameConfig::default();
        let call = LedgerOperation::CreateGame(config.clone()).into_call(Address::repeat_byte(1));

        assert_eq!(call.value, config.amount);
        assert_eq!(&call.data[..4], IPomodoro::createGameCall::SELECTOR.as_slice());
    }

    #[test]
    fn non_payable_calls_carry_no_value() {
        for op in [LedgerOperation::CompleteTask, LedgerOperation::EndGame] {
            let call = op.into_call(Address::ZERO);
            assert_eq!(call.value, U256::ZERO);
            assert_eq!(call.data.len(), 4);
        }
    }

    #[test]
    fn calldata_decodes_back_to_operation() {
        let op = LedgerOperation::CreateGame(GameConfig::from_minutes(25, 4, "0.01", 5, 4).unwrap());
        assert_eq!(LedgerOperation::decode(&op.calldata()).unwrap(), op);
        assert!(LedgerOperation::decode(&games_calldata(Address::ZERO)).is_err());
    }

    #[test]
    fn game_record_decodes_contract_return() {
        let game = Game {
            time: 1500,
            task_amount: 4,
            task_completed: 1,
            amount: U256::from(10u64).pow(U256::from(16u64)),
            break_time: 300,
            rounds: 4,
            player: Address::repeat_byte(0x42),
        };
        assert_eq!(decode_game(&encode_game(&game)).unwrap(), game);
        assert!(decode_game(&encode_game(&Game::empty())).unwrap().is_empty());
    }

    #[test]
    fn truncated_return_is_a_decode_error() {
        let err = decode_game(&[0u8; 31]).unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }
}
