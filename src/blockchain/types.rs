//! Chain-specific types and error definitions.

use alloy::primitives::{Address, TxHash, U256};
use futures_util::future::BoxFuture;
use thiserror::Error;

pub use crate::config::schema::BlockchainConfig;

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request or payout timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Gas price exceeded maximum allowed.
    #[error("Gas price {current_gwei} gwei exceeds maximum {max_gwei} gwei")]
    GasPriceTooHigh { current_gwei: u64, max_gwei: u64 },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Sends payouts from the faucet account.
pub trait Transfer: Send + Sync {
    /// Account the payouts are sent from.
    fn sender(&self) -> Address;

    /// Send `value` wei to `to`, returning the transaction hash once broadcast.
    fn transfer(&self, to: Address, value: U256) -> BoxFuture<'_, BlockchainResult<TxHash>>;
}
