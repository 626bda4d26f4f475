//! Arbitrage opportunity domain model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Token;

/// ArbitrageOpportunity is a sized two-leg trade computed from a pair of quotes.
///
/// Leg A swaps `input_amount` of `token_in` for `token_out` on the buy
/// exchange, leg B swaps the proceeds back into `token_in` on the sell
/// exchange. The loan that funds leg A is repaid out of leg B.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    /// Unique identifier for this opportunity.
    pub id: String,
    /// Asset that is borrowed, spent on leg A and received on leg B.
    pub token_in: Token,
    /// Intermediate asset bought on leg A.
    pub token_out: Token,
    /// Exchange where `token_out` is bought (cheaper side).
    pub buy_exchange: String,
    /// Exchange where `token_out` is sold (dearer side).
    pub sell_exchange: String,
    /// Amount of `token_in` borrowed and swapped on leg A.
    pub input_amount: Decimal,
    /// Quoted `token_out` received from leg A.
    pub expected_intermediate_amount: Decimal,
    /// Quoted `token_in` received from leg B.
    pub expected_output_amount: Decimal,
    /// Flash-loan premium owed on `input_amount`.
    pub premium: Decimal,
    /// Profit after swap fees and premium.
    pub expected_profit: Decimal,
    /// When this opportunity was computed.
    pub detected_at: DateTime<Utc>,
}

impl ArbitrageOpportunity {
    /// Returns the pair in "IN/OUT" format.
    pub fn pair(&self) -> String {
        format!("{}/{}", self.token_in.symbol, self.token_out.symbol)
    }

    /// Returns true if the expected profit is strictly positive.
    pub fn is_profitable(&self) -> bool {
        self.expected_profit > Decimal::ZERO
    }
}
