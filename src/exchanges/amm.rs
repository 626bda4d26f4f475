//! Constant-product pricing.

use rust_decimal::Decimal;

use crate::domain::Token;
use crate::domain::fees::BPS_DENOMINATOR;

/// Output of swapping `amount_in` into a constant-product pool.
///
/// `out = x·(10000−fee)·r_out / (r_in·10000 + x·(10000−fee))`, truncated to the
/// output token's precision. Returns None on overflow, on non-positive
/// reserves, or when the fee is 100% or more.
pub fn get_amount_out(
    amount_in: Decimal,
    reserve_in: Decimal,
    reserve_out: Decimal,
    fee_bps: u32,
    token_out: &Token,
) -> Option<Decimal> {
    if reserve_in <= Decimal::ZERO || reserve_out <= Decimal::ZERO || fee_bps >= BPS_DENOMINATOR {
        return None;
    }
    if amount_in <= Decimal::ZERO {
        return Some(Decimal::ZERO);
    }

    let amount_in_with_fee = amount_in.checked_mul(Decimal::from(BPS_DENOMINATOR - fee_bps))?;
    let numerator = amount_in_with_fee.checked_mul(reserve_out)?;
    let denominator = reserve_in
        .checked_mul(Decimal::from(BPS_DENOMINATOR))?
        .checked_add(amount_in_with_fee)?;

    Some(token_out.truncate(numerator.checked_div(denominator)?))
}
