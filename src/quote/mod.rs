//! Quote provider: fresh reserve snapshots oriented for a trade direction.

use thiserror::Error;
use tracing::debug;

use crate::domain::{ExchangeQuote, Token};
use crate::exchanges::{ExchangeError, Manager};
use crate::ledger::Ledger;

/// Quote-layer errors. Both are recoverable: retry with fresh data or give up.
#[derive(Debug, Error)]
pub enum QuoteError {
    /// Reserves could not be read.
    #[error("stale data from {exchange}: {reason}")]
    StaleData { exchange: String, reason: String },

    /// The exchange has no usable pool for the pair.
    #[error("invalid pair {pair} on {exchange}: {reason}")]
    InvalidPair {
        exchange: String,
        pair: String,
        reason: String,
    },
}

/// QuoteProvider reads reserves through the exchange registry.
///
/// Nothing is cached; every call reflects the ledger it is handed.
pub struct QuoteProvider {
    exchanges: Manager,
}

impl QuoteProvider {
    pub fn new(exchanges: Manager) -> Self {
        Self { exchanges }
    }

    /// Returns the exchange registry.
    pub fn exchanges(&self) -> &Manager {
        &self.exchanges
    }

    /// Reads the current quote for `token_in -> token_out` on `exchange_id`.
    pub fn get_quote(
        &self,
        state: &Ledger,
        exchange_id: &str,
        token_in: &Token,
        token_out: &Token,
    ) -> Result<ExchangeQuote, QuoteError> {
        let pair_label = format!("{}/{}", token_in.symbol, token_out.symbol);
        let invalid = |reason: &str| QuoteError::InvalidPair {
            exchange: exchange_id.to_string(),
            pair: pair_label.clone(),
            reason: reason.to_string(),
        };

        let exchange = self
            .exchanges
            .get(exchange_id)
            .ok_or_else(|| invalid("unknown exchange"))?;

        let pair = exchange
            .pair(token_in.address, token_out.address)
            .ok_or_else(|| invalid("no pool on factory"))?;

        let (reserve0, reserve1) = exchange.get_reserves(state, &pair).map_err(|e| {
            let reason = match e {
                ExchangeError::Unavailable(reason) => reason,
                other => other.to_string(),
            };
            QuoteError::StaleData {
                exchange: exchange_id.to_string(),
                reason,
            }
        })?;

        let (reserve_in, reserve_out) = if pair.token0.address == token_in.address {
            (reserve0, reserve1)
        } else {
            (reserve1, reserve0)
        };

        let quote = ExchangeQuote::new(
            exchange_id,
            token_in.clone(),
            token_out.clone(),
            reserve_in,
            reserve_out,
            exchange.fee_bps(),
        )
        .ok_or_else(|| invalid("pool has no liquidity"))?;

        debug!(
            exchange = %exchange_id,
            pair = %pair_label,
            reserve_in = %reserve_in,
            reserve_out = %reserve_out,
            "Quote read"
        );

        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;
    use crate::exchanges::ConstantProductExchange;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn tokens() -> (Token, Token) {
        (
            Token::new("USDC", Address::from_low_u64(0x10), 6),
            Token::new("WETH", Address::from_low_u64(0x20), 18),
        )
    }

    fn provider_with_pool(
        usdc_reserve: i64,
        weth_reserve: i64,
    ) -> (QuoteProvider, Ledger, Arc<ConstantProductExchange>) {
        let (usdc, weth) = tokens();
        let mut exchange = ConstantProductExchange::new(
            "uniswap",
            Address::from_low_u64(0x100),
            Address::from_low_u64(0x200),
            30,
        );
        let pair = exchange.add_pair(usdc.clone(), weth.clone());
        let exchange = Arc::new(exchange);

        let mut ledger = Ledger::new();
        if usdc_reserve > 0 {
            ledger.mint(pair.address, usdc.address, Decimal::from(usdc_reserve));
        }
        if weth_reserve > 0 {
            ledger.mint(pair.address, weth.address, Decimal::from(weth_reserve));
        }

        let mut manager = Manager::new();
        manager.register(exchange.clone()).unwrap();
        (QuoteProvider::new(manager), ledger, exchange)
    }

    #[test]
    fn test_quote_orients_reserves() {
        let (provider, ledger, _) = provider_with_pool(2_000_000, 1000);
        let (usdc, weth) = tokens();

        let forward = provider.get_quote(&ledger, "uniswap", &usdc, &weth).unwrap();
        assert_eq!(forward.reserve_in(), Decimal::from(2_000_000));
        assert_eq!(forward.reserve_out(), Decimal::from(1000));
        assert_eq!(forward.fee_bps(), 30);

        let reverse = provider.get_quote(&ledger, "uniswap", &weth, &usdc).unwrap();
        assert_eq!(reverse.reserve_in(), Decimal::from(1000));
        assert_eq!(reverse.reserve_out(), Decimal::from(2_000_000));
    }

    #[test]
    fn test_quote_reflects_current_state() {
        let (provider, mut ledger, _) = provider_with_pool(2_000_000, 1000);
        let (usdc, weth) = tokens();
        let pair_address = provider
            .exchanges()
            .get("uniswap")
            .unwrap()
            .pair(usdc.address, weth.address)
            .unwrap()
            .address;

        let first = provider.get_quote(&ledger, "uniswap", &usdc, &weth).unwrap();
        ledger.mint(pair_address, usdc.address, Decimal::from(1000));
        let second = provider.get_quote(&ledger, "uniswap", &usdc, &weth).unwrap();

        assert_eq!(second.reserve_in(), first.reserve_in() + Decimal::from(1000));
    }

    #[test]
    fn test_unknown_exchange_is_invalid_pair() {
        let (provider, ledger, _) = provider_with_pool(2_000_000, 1000);
        let (usdc, weth) = tokens();
        let result = provider.get_quote(&ledger, "sushiswap", &usdc, &weth);
        assert!(matches!(result, Err(QuoteError::InvalidPair { .. })));
    }

    #[test]
    fn test_missing_pool_is_invalid_pair() {
        let (provider, ledger, _) = provider_with_pool(2_000_000, 1000);
        let (usdc, _) = tokens();
        let dai = Token::new("DAI", Address::from_low_u64(0x30), 18);
        let result = provider.get_quote(&ledger, "uniswap", &usdc, &dai);
        assert!(matches!(result, Err(QuoteError::InvalidPair { .. })));
    }

    #[test]
    fn test_zero_liquidity_is_invalid_pair() {
        let (provider, ledger, _) = provider_with_pool(2_000_000, 0);
        let (usdc, weth) = tokens();
        let err = provider.get_quote(&ledger, "uniswap", &usdc, &weth).unwrap_err();
        assert!(err.to_string().contains("no liquidity"));
    }

    #[test]
    fn test_halted_exchange_is_stale_data() {
        let (provider, ledger, exchange) = provider_with_pool(2_000_000, 1000);
        let (usdc, weth) = tokens();
        exchange.set_halted(true);

        let result = provider.get_quote(&ledger, "uniswap", &usdc, &weth);
        assert!(matches!(result, Err(QuoteError::StaleData { .. })));
    }
}
