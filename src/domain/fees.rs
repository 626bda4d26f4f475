//! Basis-point arithmetic shared by swap fees, loan premiums and slippage bounds.

use rust_decimal::Decimal;

/// One hundred percent, expressed in basis points.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Returns `bps` basis points of `amount`.
pub fn bps_of(amount: Decimal, bps: u32) -> Decimal {
    amount * Decimal::from(bps) / Decimal::from(BPS_DENOMINATOR)
}

/// Returns `amount` reduced by `bps` basis points, floored at zero.
pub fn less_bps(amount: Decimal, bps: u32) -> Decimal {
    if bps >= BPS_DENOMINATOR {
        return Decimal::ZERO;
    }
    amount - bps_of(amount, bps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_bps_of() {
        // 9 bps of 10_000 is 9
        assert_eq!(bps_of(Decimal::from(10_000), 9), Decimal::from(9));
        assert_eq!(bps_of(Decimal::from(200), 30), Decimal::from_str("0.6").unwrap());
    }

    #[test]
    fn test_less_bps() {
        assert_eq!(less_bps(Decimal::from(1000), 50), Decimal::from(995));
        assert_eq!(less_bps(Decimal::from(1000), 0), Decimal::from(1000));
        assert_eq!(less_bps(Decimal::from(1000), 10_000), Decimal::ZERO);
        assert_eq!(less_bps(Decimal::from(1000), 20_000), Decimal::ZERO);
    }
}
