//! Reserve snapshots read from an exchange.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Token;

/// ExchangeQuote is an immutable snapshot of one pool, oriented in the
/// direction `token_in -> token_out`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeQuote {
    exchange_id: String,
    token_in: Token,
    token_out: Token,
    reserve_in: Decimal,
    reserve_out: Decimal,
    fee_bps: u32,
}

impl ExchangeQuote {
    /// Builds a quote, returning None when either reserve is not positive.
    pub fn new(
        exchange_id: impl Into<String>,
        token_in: Token,
        token_out: Token,
        reserve_in: Decimal,
        reserve_out: Decimal,
        fee_bps: u32,
    ) -> Option<Self> {
        if reserve_in <= Decimal::ZERO || reserve_out <= Decimal::ZERO {
            return None;
        }
        Some(Self {
            exchange_id: exchange_id.into(),
            token_in,
            token_out,
            reserve_in,
            reserve_out,
            fee_bps,
        })
    }

    pub fn exchange_id(&self) -> &str {
        &self.exchange_id
    }

    pub fn token_in(&self) -> &Token {
        &self.token_in
    }

    pub fn token_out(&self) -> &Token {
        &self.token_out
    }

    pub fn reserve_in(&self) -> Decimal {
        self.reserve_in
    }

    pub fn reserve_out(&self) -> Decimal {
        self.reserve_out
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    /// Spot price of `token_out` in units of `token_in`, ignoring fees.
    pub fn spot_price(&self) -> Decimal {
        self.reserve_in / self.reserve_out
    }

    /// Returns true when both quotes cover the same ordered token pair.
    pub fn same_pair(&self, other: &ExchangeQuote) -> bool {
        self.token_in.address == other.token_in.address
            && self.token_out.address == other.token_out.address
    }
}
