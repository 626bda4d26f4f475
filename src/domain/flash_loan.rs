//! Flash-loan request model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Token;
use super::fees::bps_of;

/// FlashLoanRequest describes one uncollateralized loan.
///
/// It is created when an attempt starts and its obligation must be settled
/// before the attempt finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashLoanRequest {
    /// Asset being borrowed.
    pub asset: Token,
    /// Principal.
    pub amount: Decimal,
    /// Premium charged by the pool, in basis points of the principal.
    pub premium_bps: u32,
}

impl FlashLoanRequest {
    pub fn new(asset: Token, amount: Decimal, premium_bps: u32) -> Self {
        Self {
            asset,
            amount,
            premium_bps,
        }
    }

    /// Premium owed, rounded up to the asset's precision.
    pub fn premium(&self) -> Decimal {
        premium_for(&self.asset, self.amount, self.premium_bps)
    }

    /// Principal plus premium.
    pub fn obligation(&self) -> Decimal {
        self.amount + self.premium()
    }
}

/// Premium owed on `amount`, rounded up so the pool is never short-changed.
pub fn premium_for(asset: &Token, amount: Decimal, premium_bps: u32) -> Decimal {
    asset.round_up(bps_of(amount, premium_bps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use std::str::FromStr;

    #[test]
    fn test_obligation_includes_premium() {
        let usdc = Token::new("USDC", Address::from_low_u64(1), 6);
        let request = FlashLoanRequest::new(usdc, Decimal::from(10_000), 9);
        assert_eq!(request.premium(), Decimal::from(9));
        assert_eq!(request.obligation(), Decimal::from(10_009));
    }

    #[test]
    fn test_premium_rounds_up() {
        let usdc = Token::new("USDC", Address::from_low_u64(1), 6);
        // 9 bps of 0.000001 is below one unit, still charged as one unit
        let request = FlashLoanRequest::new(usdc, Decimal::from_str("0.000001").unwrap(), 9);
        assert_eq!(request.premium(), Decimal::from_str("0.000001").unwrap());
    }
}
