//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment (FAUCET_PRIVATE_KEY) + [blockchain] config
//!     → wallet.rs (key loading)
//!     → client.rs (RPC connection with timeouts, wallet attached)
//!     → transaction.rs (gas ceiling, send payout)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod address;
pub mod client;
pub mod transaction;
pub mod types;
pub mod units;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::TxBuilder;
pub use types::{BlockchainError, BlockchainResult, Transfer};
pub use wallet::Wallet;
