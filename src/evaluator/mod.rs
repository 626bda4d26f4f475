//! Opportunity evaluator: sizes and prices the two-leg round trip.
//!
//! Leg A buys `token_out` on one exchange, leg B sells it back on the other.
//! Both orderings are tried and the one with the higher profit wins.

mod search;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

use crate::domain::{ArbitrageOpportunity, ExchangeQuote, premium_for};
use crate::exchanges::get_amount_out;

/// How the evaluator picks the trade size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMode {
    /// Search for the profit-maximizing input up to the cap, and never
    /// beyond the buy side's input reserve.
    #[default]
    Optimal,
    /// Trade exactly the cap, whatever the pool depth.
    Fixed,
}

/// Evaluator settings.
#[derive(Debug, Clone)]
pub struct EvaluatorSettings {
    /// Flash-loan premium in basis points.
    pub premium_bps: u32,
    pub sizing: SizingMode,
    /// Iteration bound for the optimal-size search.
    pub max_iterations: u32,
    /// Opportunities must clear this profit, in units of `token_in`.
    pub min_profit: Decimal,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            premium_bps: 9,
            sizing: SizingMode::Optimal,
            max_iterations: 128,
            min_profit: Decimal::ZERO,
        }
    }
}

/// Priced round trip at one input size.
#[derive(Debug, Clone, PartialEq)]
struct Trial {
    input: Decimal,
    intermediate: Decimal,
    output: Decimal,
    premium: Decimal,
    profit: Decimal,
}

/// Evaluator turns quote pairs into sized opportunities.
pub struct Evaluator {
    settings: EvaluatorSettings,
    sequence: AtomicU64,
}

impl Evaluator {
    pub fn new(settings: EvaluatorSettings) -> Self {
        Self {
            settings,
            sequence: AtomicU64::new(0),
        }
    }

    /// Evaluates both trade orderings over two quotes of the same pair.
    ///
    /// `input_amount` caps the trade size (and is the exact size in fixed
    /// mode). Returns None unless the best achievable profit is strictly
    /// positive and at least `min_profit`.
    pub fn evaluate(
        &self,
        quote_a: &ExchangeQuote,
        quote_b: &ExchangeQuote,
        input_amount: Decimal,
    ) -> Option<ArbitrageOpportunity> {
        if !quote_a.same_pair(quote_b) {
            warn!(
                exchange_a = %quote_a.exchange_id(),
                exchange_b = %quote_b.exchange_id(),
                "Quotes cover different pairs"
            );
            return None;
        }
        if input_amount <= Decimal::ZERO {
            return None;
        }

        let forward = self.best_trial(quote_a, quote_b, input_amount);
        let backward = self.best_trial(quote_b, quote_a, input_amount);

        let (buy, sell, trial) = match (forward, backward) {
            (Some(f), Some(b)) if b.profit > f.profit => (quote_b, quote_a, b),
            (Some(f), _) => (quote_a, quote_b, f),
            (None, Some(b)) => (quote_b, quote_a, b),
            (None, None) => return None,
        };

        if !self.clears_threshold(&trial) {
            debug!(
                pair = %format!("{}/{}", quote_a.token_in(), quote_a.token_out()),
                spot_a = %quote_a.spot_price(),
                spot_b = %quote_b.spot_price(),
                best_profit = %trial.profit,
                "No profitable opportunity"
            );
            return None;
        }

        let id = format!("opp-{}", self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
        let opportunity = build_opportunity(id, buy, sell, &trial);

        debug!(
            id = %opportunity.id,
            pair = %opportunity.pair(),
            buy = %opportunity.buy_exchange,
            sell = %opportunity.sell_exchange,
            input = %opportunity.input_amount,
            profit = %opportunity.expected_profit,
            "Opportunity evaluated"
        );

        Some(opportunity)
    }

    /// Re-prices an opportunity at its original size against fresh quotes.
    ///
    /// Returns the updated opportunity, or None when it no longer clears the
    /// profit threshold or the quotes do not match its exchanges and pair.
    pub fn refresh(
        &self,
        opportunity: &ArbitrageOpportunity,
        quote_buy: &ExchangeQuote,
        quote_sell: &ExchangeQuote,
    ) -> Option<ArbitrageOpportunity> {
        if quote_buy.exchange_id() != opportunity.buy_exchange
            || quote_sell.exchange_id() != opportunity.sell_exchange
            || !quote_buy.same_pair(quote_sell)
            || quote_buy.token_in().address != opportunity.token_in.address
            || quote_buy.token_out().address != opportunity.token_out.address
        {
            return None;
        }

        let trial = self.simulate(quote_buy, quote_sell, opportunity.input_amount)?;
        if !self.clears_threshold(&trial) {
            debug!(
                id = %opportunity.id,
                profit = %trial.profit,
                "Opportunity went stale"
            );
            return None;
        }

        Some(build_opportunity(
            opportunity.id.clone(),
            quote_buy,
            quote_sell,
            &trial,
        ))
    }

    fn clears_threshold(&self, trial: &Trial) -> bool {
        trial.profit > Decimal::ZERO && trial.profit >= self.settings.min_profit
    }

    /// Best trial for buying on `buy` and selling on `sell` at or below
    /// `input_amount`.
    fn best_trial(
        &self,
        buy: &ExchangeQuote,
        sell: &ExchangeQuote,
        input_amount: Decimal,
    ) -> Option<Trial> {
        let token_in = buy.token_in();

        match self.settings.sizing {
            SizingMode::Fixed => self.simulate(buy, sell, token_in.truncate(input_amount)),
            SizingMode::Optimal => {
                let cap = token_in.truncate(input_amount.min(buy.reserve_in()));
                let (input, _) =
                    search::maximize(token_in, cap, self.settings.max_iterations, |x| {
                        self.simulate(buy, sell, x).map(|t| t.profit)
                    })?;
                self.simulate(buy, sell, input)
            }
        }
    }

    /// Prices the round trip for one input size.
    fn simulate(&self, buy: &ExchangeQuote, sell: &ExchangeQuote, input: Decimal) -> Option<Trial> {
        if input <= Decimal::ZERO {
            return None;
        }

        let intermediate = get_amount_out(
            input,
            buy.reserve_in(),
            buy.reserve_out(),
            buy.fee_bps(),
            buy.token_out(),
        )?;
        if intermediate <= Decimal::ZERO {
            return None;
        }

        // The sell quote is oriented token_in -> token_out, so leg B runs it backwards.
        let output = get_amount_out(
            intermediate,
            sell.reserve_out(),
            sell.reserve_in(),
            sell.fee_bps(),
            sell.token_in(),
        )?;

        let premium = premium_for(buy.token_in(), input, self.settings.premium_bps);
        let profit = output - input - premium;

        Some(Trial {
            input,
            intermediate,
            output,
            premium,
            profit,
        })
    }
}

fn build_opportunity(
    id: String,
    buy: &ExchangeQuote,
    sell: &ExchangeQuote,
    trial: &Trial,
) -> ArbitrageOpportunity {
    ArbitrageOpportunity {
        id,
        token_in: buy.token_in().clone(),
        token_out: buy.token_out().clone(),
        buy_exchange: buy.exchange_id().to_string(),
        sell_exchange: sell.exchange_id().to_string(),
        input_amount: trial.input,
        expected_intermediate_amount: trial.intermediate,
        expected_output_amount: trial.output,
        premium: trial.premium,
        expected_profit: trial.profit,
        detected_at: Utc::now(),
    }
}
