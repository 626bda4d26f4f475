//! Uniswap V2 style constant-product exchange operating on the ledger.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

use super::{Exchange, ExchangeError, Pair, Result, SwapRequest, get_amount_out};
use crate::domain::{Address, Token};
use crate::ledger::Ledger;

/// ConstantProductExchange is a router + factory pair whose pools keep their
/// reserves as ledger balances.
pub struct ConstantProductExchange {
    name: String,
    router: Address,
    factory: Address,
    fee_bps: u32,
    pairs: HashMap<(Address, Address), Pair>,
    halted: AtomicBool,
}

impl ConstantProductExchange {
    /// Creates an exchange with no pairs.
    pub fn new(name: impl Into<String>, router: Address, factory: Address, fee_bps: u32) -> Self {
        Self {
            name: name.into(),
            router,
            factory,
            fee_bps,
            pairs: HashMap::new(),
            halted: AtomicBool::new(false),
        }
    }

    /// Registers a pool for two tokens and returns it. The pool address is
    /// derived from the factory.
    pub fn add_pair(&mut self, token_a: Token, token_b: Token) -> Pair {
        let salt = self.pairs.len() as u64 + 1;
        let pair = Pair::new(self.factory.derive(salt), token_a, token_b);
        self.pairs.insert((pair.token0.address, pair.token1.address), pair.clone());
        pair
    }

    /// Stops serving reserves and swaps until resumed.
    pub fn set_halted(&self, halted: bool) {
        self.halted.store(halted, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<()> {
        if self.halted.load(Ordering::SeqCst) {
            return Err(ExchangeError::Unavailable(format!(
                "{} is not serving state",
                self.name
            )));
        }
        Ok(())
    }
}

impl Exchange for ConstantProductExchange {
    fn name(&self) -> &str {
        &self.name
    }

    fn router(&self) -> Address {
        self.router
    }

    fn factory(&self) -> Address {
        self.factory
    }

    fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    fn pair(&self, token_a: Address, token_b: Address) -> Option<Pair> {
        let key = if token_a <= token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        self.pairs.get(&key).cloned()
    }

    fn get_reserves(&self, state: &Ledger, pair: &Pair) -> Result<(Decimal, Decimal)> {
        self.ensure_available()?;
        Ok((
            state.balance_of(pair.address, pair.token0.address),
            state.balance_of(pair.address, pair.token1.address),
        ))
    }

    fn swap(&self, state: &mut Ledger, request: &SwapRequest) -> Result<Decimal> {
        self.ensure_available()?;

        let pair = self.pair(request.token_in, request.token_out).ok_or_else(|| {
            ExchangeError::PairNotSupported(format!("{}/{}", request.token_in, request.token_out))
        })?;
        let token_out = pair
            .token(request.token_out)
            .cloned()
            .ok_or_else(|| ExchangeError::Internal("token_out missing from pair".into()))?;

        if request.amount_in <= Decimal::ZERO {
            return Err(ExchangeError::InsufficientInputAmount);
        }

        let reserve_in = state.balance_of(pair.address, request.token_in);
        let reserve_out = state.balance_of(pair.address, request.token_out);
        if reserve_in <= Decimal::ZERO || reserve_out <= Decimal::ZERO {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        let amount_out =
            get_amount_out(request.amount_in, reserve_in, reserve_out, self.fee_bps, &token_out)
                .ok_or_else(|| ExchangeError::Internal("amount out overflow".into()))?;

        if amount_out < request.min_amount_out {
            return Err(ExchangeError::InsufficientOutputAmount {
                minimum: request.min_amount_out,
                actual: amount_out,
            });
        }
        if amount_out <= Decimal::ZERO || amount_out >= reserve_out {
            return Err(ExchangeError::InsufficientLiquidity);
        }

        state.transfer(request.token_in, request.payer, pair.address, request.amount_in)?;
        state.transfer(request.token_out, pair.address, request.recipient, amount_out)?;

        debug!(
            exchange = %self.name,
            pair = %pair.label(),
            amount_in = %request.amount_in,
            amount_out = %amount_out,
            "Swap executed"
        );

        Ok(amount_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRADER: Address = Address::from_low_u64(0x7e);

    fn tokens() -> (Token, Token) {
        (
            Token::new("USDC", Address::from_low_u64(0x10), 6),
            Token::new("WETH", Address::from_low_u64(0x20), 18),
        )
    }

    fn setup() -> (ConstantProductExchange, Pair, Ledger, Token, Token) {
        let (usdc, weth) = tokens();
        let mut exchange = ConstantProductExchange::new(
            "uniswap",
            Address::from_low_u64(0x100),
            Address::from_low_u64(0x200),
            30,
        );
        let pair = exchange.add_pair(weth.clone(), usdc.clone());

        let mut ledger = Ledger::new();
        ledger.mint(pair.address, usdc.address, Decimal::from(2_000_000));
        ledger.mint(pair.address, weth.address, Decimal::from(1000));
        ledger.mint(TRADER, usdc.address, Decimal::from(10_000));

        (exchange, pair, ledger, usdc, weth)
    }

    fn buy_weth(usdc: &Token, weth: &Token, amount: i64, min_out: Decimal) -> SwapRequest {
        SwapRequest {
            amount_in: Decimal::from(amount),
            min_amount_out: min_out,
            token_in: usdc.address,
            token_out: weth.address,
            payer: TRADER,
            recipient: TRADER,
        }
    }

    #[test]
    fn test_pair_lookup_either_order() {
        let (exchange, pair, _, usdc, weth) = setup();
        assert_eq!(exchange.pair(usdc.address, weth.address), Some(pair.clone()));
        assert_eq!(exchange.pair(weth.address, usdc.address), Some(pair));
        assert!(exchange.pair(usdc.address, Address::from_low_u64(0x99)).is_none());
    }

    #[test]
    fn test_reserves_follow_token_order() {
        let (exchange, pair, ledger, usdc, _) = setup();
        let (r0, r1) = exchange.get_reserves(&ledger, &pair).unwrap();
        // USDC has the lower address, so it is token0
        assert_eq!(pair.token0.address, usdc.address);
        assert_eq!(r0, Decimal::from(2_000_000));
        assert_eq!(r1, Decimal::from(1000));
    }

    #[test]
    fn test_swap_moves_reserves() {
        let (exchange, pair, mut ledger, usdc, weth) = setup();

        let out = exchange
            .swap(&mut ledger, &buy_weth(&usdc, &weth, 2000, Decimal::ZERO))
            .unwrap();

        assert!(out > Decimal::ZERO);
        assert_eq!(ledger.balance_of(TRADER, weth.address), out);
        assert_eq!(ledger.balance_of(TRADER, usdc.address), Decimal::from(8000));
        assert_eq!(
            ledger.balance_of(pair.address, usdc.address),
            Decimal::from(2_002_000)
        );
        assert_eq!(
            ledger.balance_of(pair.address, weth.address),
            Decimal::from(1000) - out
        );
    }

    #[test]
    fn test_swap_enforces_min_output() {
        let (exchange, _, mut ledger, usdc, weth) = setup();
        let before = ledger.clone();

        let result = exchange.swap(&mut ledger, &buy_weth(&usdc, &weth, 2000, Decimal::ONE));

        assert!(matches!(
            result,
            Err(ExchangeError::InsufficientOutputAmount { .. })
        ));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_swap_rejects_unfunded_payer() {
        let (exchange, _, mut ledger, usdc, weth) = setup();
        let result = exchange.swap(&mut ledger, &buy_weth(&usdc, &weth, 20_000, Decimal::ZERO));
        assert!(matches!(result, Err(ExchangeError::Ledger(_))));
    }

    #[test]
    fn test_swap_rejects_zero_input() {
        let (exchange, _, mut ledger, usdc, weth) = setup();
        let result = exchange.swap(&mut ledger, &buy_weth(&usdc, &weth, 0, Decimal::ZERO));
        assert!(matches!(result, Err(ExchangeError::InsufficientInputAmount)));
    }

    #[test]
    fn test_swap_empty_pool() {
        let (usdc, weth) = tokens();
        let mut exchange = ConstantProductExchange::new(
            "empty",
            Address::from_low_u64(0x1),
            Address::from_low_u64(0x2),
            30,
        );
        exchange.add_pair(usdc.clone(), weth.clone());
        let mut ledger = Ledger::new();
        ledger.mint(TRADER, usdc.address, Decimal::from(10));

        let result = exchange.swap(&mut ledger, &buy_weth(&usdc, &weth, 1, Decimal::ZERO));
        assert!(matches!(result, Err(ExchangeError::InsufficientLiquidity)));
    }

    #[test]
    fn test_halted_exchange_is_unavailable() {
        let (exchange, pair, mut ledger, usdc, weth) = setup();
        exchange.set_halted(true);

        assert!(matches!(
            exchange.get_reserves(&ledger, &pair),
            Err(ExchangeError::Unavailable(_))
        ));
        assert!(matches!(
            exchange.swap(&mut ledger, &buy_weth(&usdc, &weth, 1, Decimal::ZERO)),
            Err(ExchangeError::Unavailable(_))
        ));

        exchange.set_halted(false);
        assert!(exchange.get_reserves(&ledger, &pair).is_ok());
    }
}
