//! ERC-4337 v0.6 EntryPoint, SimpleAccountFactory and SimpleAccount.

use alloy_primitives::{Address, Bytes, U256};
use alloy_primitives::aliases::U192;
use alloy_sol_types::{SolCall, sol};

sol! {
    /// Singleton EntryPoint (v0.6).
    interface IEntryPoint {
        /// Next nonce for `sender` under the 192-bit `key`.
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce);
    }

    /// Counterfactual account factory.
    interface ISimpleAccountFactory {
        function createAccount(address owner, uint256 salt) external returns (address ret);

        function getAddress(address owner, uint256 salt) external view returns (address);
    }

    /// Smart account owned by a single ECDSA key.
    interface ISimpleAccount {
        function execute(address dest, uint256 value, bytes func) external;
    }
}

/// `getNonce(sender, 0)` calldata.
pub fn get_nonce_calldata(sender: Address) -> Bytes {
    Bytes::from(
        IEntryPoint::getNonceCall {
            sender,
            key: U192::ZERO,
        }
        .abi_encode(),
    )
}

/// `getAddress(owner, salt)` calldata.
pub fn get_address_calldata(owner: Address, salt: U256) -> Bytes {
    Bytes::from(ISimpleAccountFactory::getAddressCall { owner, salt }.abi_encode())
}

/// `initCode` deploying the account on first use: factory address followed by
/// `createAccount(owner, salt)` calldata.
pub fn init_code(factory: Address, owner: Address, salt: U256) -> Bytes {
    let mut code = factory.to_vec();
    code.extend(ISimpleAccountFactory::createAccountCall { owner, salt }.abi_encode());
    Bytes::from(code)
}

/// Wrap a contract call in `execute(dest, value, func)`.
pub fn execute_calldata(dest: Address, value: U256, func: Bytes) -> Bytes {
    Bytes::from(ISimpleAccount::executeCall { dest, value, func }.abi_encode())
}
