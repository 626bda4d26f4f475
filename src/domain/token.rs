//! ERC-20 style tokens and amount precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Address;

/// Token describes an ERC-20 asset.
///
/// Amounts throughout the crate are whole-token `Decimal`s; anything that
/// settles on the ledger is cut to `decimals` places first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// Ticker symbol (e.g., "WETH").
    pub symbol: String,
    /// Contract address.
    pub address: Address,
    /// Number of decimal places the token supports.
    pub decimals: u32,
}

impl Token {
    /// Creates a new Token.
    pub fn new(symbol: impl Into<String>, address: Address, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            address,
            decimals,
        }
    }

    /// Truncates an amount to the token's precision, rounding toward zero.
    pub fn truncate(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimals, RoundingStrategy::ToZero)
    }

    /// Rounds an amount up to the token's precision.
    pub fn round_up(&self, amount: Decimal) -> Decimal {
        amount.round_dp_with_strategy(self.decimals, RoundingStrategy::AwayFromZero)
    }

    /// Smallest representable amount of this token.
    pub fn unit(&self) -> Decimal {
        Decimal::new(1, self.decimals)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

/// Parses a pair in "IN/OUT" format into its two symbols.
///
/// The first symbol is the asset that is borrowed and returned as profit.
pub fn parse_pair(pair: &str) -> Option<(&str, &str)> {
    let (token_in, token_out) = pair.split_once('/')?;
    let (token_in, token_out) = (token_in.trim(), token_out.trim());
    if token_in.is_empty() || token_out.is_empty() {
        return None;
    }
    Some((token_in, token_out))
}
