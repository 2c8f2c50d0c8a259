//! Payout transactions.

use alloy::primitives::{Address, TxHash, U256};
use futures_util::future::BoxFuture;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, Transfer};
use crate::blockchain::wallet::Wallet;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Sends native-token payouts from the faucet wallet.
pub struct TxBuilder {
    client: BlockchainClient,
    wallet: Wallet,
}

impl TxBuilder {
    pub fn new(client: BlockchainClient, wallet: Wallet) -> Self {
        Self { client, wallet }
    }

    /// Refuse to pay out while gas is above the configured ceiling.
    async fn check_gas_price(&self) -> BlockchainResult<()> {
        let gas_price = self.client.get_gas_price().await?;
        let max_gwei = self.client.config().max_gas_price_gwei;
        check_gas_ceiling(gas_price, max_gwei)
    }

    async fn send(&self, to: Address, value: U256) -> BlockchainResult<TxHash> {
        self.check_gas_price().await?;
        let tx_hash = self.client.send_value(self.wallet.address(), to, value).await?;
        tracing::debug!(tx_hash = %tx_hash, to = %to, value = %value, "Payout broadcast");
        Ok(tx_hash)
    }
}

fn check_gas_ceiling(gas_price_wei: u128, max_gwei: u64) -> BlockchainResult<()> {
    let current_gwei = gas_price_wei / WEI_PER_GWEI;
    if current_gwei > u128::from(max_gwei) {
        return Err(BlockchainError::GasPriceTooHigh {
            current_gwei: u64::try_from(current_gwei).unwrap_or(u64::MAX),
            max_gwei,
        });
    }
    Ok(())
}

impl Transfer for TxBuilder {
    fn sender(&self) -> Address {
        self.wallet.address()
    }

    fn transfer(&self, to: Address, value: U256) -> BoxFuture<'_, BlockchainResult<TxHash>> {
        Box::pin(self.send(to, value))
    }
}
