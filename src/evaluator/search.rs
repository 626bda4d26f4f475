//! Ternary search over a unimodal profit curve.

use rust_decimal::Decimal;

use crate::domain::Token;

/// Once the bracket is this many ticks wide the remaining points are swept.
const SWEEP_TICKS: i64 = 3;

/// Finds the input in `(0, upper]` that maximizes `f`, on the token's tick grid.
///
/// `f` returns None where the trade cannot be computed; such points lose to
/// any computable one. Returns the best `(input, value)` seen, or None if no
/// point could be computed.
pub fn maximize<F>(
    token: &Token,
    upper: Decimal,
    max_iterations: u32,
    mut f: F,
) -> Option<(Decimal, Decimal)>
where
    F: FnMut(Decimal) -> Option<Decimal>,
{
    let tick = token.unit();
    let upper = token.truncate(upper);
    if upper < tick {
        return None;
    }

    let mut best: Option<(Decimal, Decimal)> = None;
    let mut low = Decimal::ZERO;
    let mut high = upper;

    for _ in 0..max_iterations {
        if high - low <= tick * Decimal::from(SWEEP_TICKS) {
            break;
        }

        let third = (high - low) / Decimal::from(3);
        let m1 = token.truncate(low + third);
        let m2 = token.truncate(high - third);

        let p1 = f(m1);
        let p2 = f(m2);
        consider(&mut best, m1, p1);
        consider(&mut best, m2, p2);

        // None orders below every Some, so an uncomputable point is abandoned.
        if p1 < p2 {
            low = m1;
        } else {
            high = m2;
        }
    }

    // An iteration bound can leave the bracket wide; sample it instead of sweeping.
    let width = high - low;
    let step = if width <= tick * Decimal::from(SWEEP_TICKS) {
        tick
    } else {
        token.truncate(width / Decimal::from(SWEEP_TICKS)).max(tick)
    };
    let mut x = token.truncate(low).max(tick);
    while x <= high {
        let value = f(x);
        consider(&mut best, x, value);
        x += step;
    }
    consider(&mut best, upper, f(upper));

    best
}

fn consider(best: &mut Option<(Decimal, Decimal)>, x: Decimal, value: Option<Decimal>) {
    let Some(value) = value else {
        return;
    };
    if x <= Decimal::ZERO {
        return;
    }
    match best {
        Some((_, best_value)) if *best_value >= value => {}
        _ => *best = Some((x, value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use std::str::FromStr;

    fn token(decimals: u32) -> Token {
        Token::new("T", Address::from_low_u64(1), decimals)
    }

    #[test]
    fn test_finds_parabola_peak() {
        // -(x - 42.5)^2 peaks at 42.5
        let peak = Decimal::from_str("42.5").unwrap();
        let (x, value) = maximize(&token(2), Decimal::from(1000), 200, |x| {
            Some(-(x - peak) * (x - peak))
        })
        .unwrap();
        assert_eq!(x, peak);
        assert_eq!(value, Decimal::ZERO);
    }

    #[test]
    fn test_peak_at_upper_bound() {
        let (x, _) = maximize(&token(0), Decimal::from(100), 200, Some).unwrap();
        assert_eq!(x, Decimal::from(100));
    }

    #[test]
    fn test_peak_at_lower_bound() {
        let (x, value) = maximize(&token(0), Decimal::from(100), 200, |x| Some(-x)).unwrap();
        assert_eq!(x, Decimal::ONE);
        assert_eq!(value, Decimal::from(-1));
    }

    #[test]
    fn test_upper_below_tick() {
        let result = maximize(&token(0), Decimal::from_str("0.5").unwrap(), 200, Some);
        assert!(result.is_none());
    }

    #[test]
    fn test_iteration_bound_keeps_sweep_short() {
        let mut calls = 0u32;
        let result = maximize(&token(18), Decimal::from(1000), 4, |x| {
            calls += 1;
            Some(x)
        });
        let (x, _) = result.unwrap();
        assert_eq!(x, Decimal::from(1000));
        assert!(calls < 32);
    }

    #[test]
    fn test_uncomputable_region_is_skipped() {
        // only x <= 10 can be computed, value increasing
        let (x, _) = maximize(&token(0), Decimal::from(1000), 200, |x| {
            if x <= Decimal::from(10) { Some(x) } else { None }
        })
        .unwrap();
        assert_eq!(x, Decimal::from(10));
    }
}
