//! Address validation for payout targets.

use alloy::primitives::Address;

/// Parse a `0x`-prefixed address, accepting only its EIP-55 checksummed form.
///
/// All-lowercase and all-uppercase spellings are rejected along with bad
/// checksums, so each account has exactly one accepted spelling and one
/// cooldown key.
pub fn parse_checksummed_address(s: &str) -> Option<Address> {
    Address::parse_checksummed(s, None).ok()
}
