//! Token unit conversion.

use alloy::primitives::U256;

const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Whole tokens to wei (18 decimals).
pub fn ether_to_wei(amount: u64) -> U256 {
    U256::from(amount) * U256::from(WEI_PER_ETHER)
}
