//! Monetary units for the simulator
//!
//! Amounts and fees are whole base units so hashing and balance replay stay
//! exact. One coin is 100,000,000 base units, rendered with eight decimals.

use crate::error::{BlockchainError, Result};

/// Number of base units in one coin
pub const UNITS_PER_COIN: u64 = 100_000_000;

/// Default fixed issuance per mined block (1 coin)
pub const DEFAULT_BLOCK_REWARD: u64 = UNITS_PER_COIN;

/// Convert coins to base units, rejecting negative or unrepresentable amounts
pub fn coins_to_units(coins: f64) -> Result<u64> {
    let units = (coins * UNITS_PER_COIN as f64).round();
    if !units.is_finite() || units < 0.0 || units >= u64::MAX as f64 {
        return Err(BlockchainError::Config(format!(
            "{coins} is not a valid coin amount"
        )));
    }
    Ok(units as u64)
}

/// Format base units as coins, e.g. `1.50000000`
pub fn format_coins(units: u64) -> String {
    format!("{}.{:08}", units / UNITS_PER_COIN, units % UNITS_PER_COIN)
}

/// Format a signed balance as coins
pub fn format_balance(units: i128) -> String {
    let sign = if units < 0 { "-" } else { "" };
    let magnitude = units.unsigned_abs();
    let per_coin = u128::from(UNITS_PER_COIN);
    format!("{sign}{}.{:08}", magnitude / per_coin, magnitude % per_coin)
}
