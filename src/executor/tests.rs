//! Tests for the arbitrage executor.

use super::*;
use crate::domain::Token;
use crate::evaluator::{Evaluator, EvaluatorSettings};
use crate::exchanges::{ConstantProductExchange, Pair};
use crate::flash_loan::AaveStylePool;
use crate::quote::QuoteProvider;
use std::str::FromStr;

const EXECUTOR: Address = Address::from_low_u64(0xe0);
const OPERATOR: Address = Address::from_low_u64(0x0b);
const LENDER: Address = Address::from_low_u64(0xaa);
const TRADER: Address = Address::from_low_u64(0x7d);

fn usdc() -> Token {
    Token::new("USDC", Address::from_low_u64(0x10), 6)
}

fn weth() -> Token {
    Token::new("WETH", Address::from_low_u64(0x20), 18)
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct World {
    ledger: Ledger,
    manager: Manager,
    pools: (Pair, Pair),
}

impl World {
    /// Reference world: 1000 WETH against 2,000,000 USDC on "uniswap" and
    /// 2,050,000 USDC on "sushiswap", 0.3% fee on both, 10M USDC to lend.
    fn reference() -> Self {
        let mut uni = ConstantProductExchange::new(
            "uniswap",
            Address::from_low_u64(0x1001),
            Address::from_low_u64(0x1002),
            30,
        );
        let mut sushi = ConstantProductExchange::new(
            "sushiswap",
            Address::from_low_u64(0x2001),
            Address::from_low_u64(0x2002),
            30,
        );
        let uni_pool = uni.add_pair(usdc(), weth());
        let sushi_pool = sushi.add_pair(usdc(), weth());

        let mut ledger = Ledger::new();
        ledger.mint(uni_pool.address, usdc().address, Decimal::from(2_000_000));
        ledger.mint(uni_pool.address, weth().address, Decimal::from(1000));
        ledger.mint(sushi_pool.address, usdc().address, Decimal::from(2_050_000));
        ledger.mint(sushi_pool.address, weth().address, Decimal::from(1000));
        ledger.mint(LENDER, usdc().address, Decimal::from(10_000_000));

        let mut manager = Manager::new();
        manager.register(Arc::new(uni)).unwrap();
        manager.register(Arc::new(sushi)).unwrap();

        Self {
            ledger,
            manager,
            pools: (uni_pool, sushi_pool),
        }
    }

    fn executor(&self, slippage_bps: u32, min_profit: Decimal) -> Executor {
        let pool = Arc::new(AaveStylePool::new(LENDER, Address::from_low_u64(0xab), 9));
        Executor::new(
            ExecutorSettings {
                address: EXECUTOR,
                operator: OPERATOR,
                slippage_bps,
                min_profit,
            },
            self.manager.clone(),
            FlashLoanCoordinator::new(pool, EXECUTOR),
        )
    }

    fn opportunity(&self) -> ArbitrageOpportunity {
        let quotes = QuoteProvider::new(self.manager.clone());
        let a = quotes
            .get_quote(&self.ledger, "uniswap", &usdc(), &weth())
            .unwrap();
        let b = quotes
            .get_quote(&self.ledger, "sushiswap", &usdc(), &weth())
            .unwrap();
        Evaluator::new(EvaluatorSettings::default())
            .evaluate(&a, &b, Decimal::from(1_000_000))
            .unwrap()
    }

    /// Third-party swap that moves one pool before the executor gets to it.
    fn third_party_swap(
        &mut self,
        exchange: &str,
        token_in: &Token,
        token_out: &Token,
        amount: i64,
    ) {
        let amount = Decimal::from(amount);
        self.ledger.mint(TRADER, token_in.address, amount);
        let exchange = self.manager.get(exchange).unwrap();
        exchange
            .swap(
                &mut self.ledger,
                &SwapRequest {
                    amount_in: amount,
                    min_amount_out: Decimal::ZERO,
                    token_in: token_in.address,
                    token_out: token_out.address,
                    payer: TRADER,
                    recipient: TRADER,
                },
            )
            .unwrap();
    }
}

#[test]
fn test_reference_arbitrage_completes() {
    let mut world = World::reference();
    let opp = world.opportunity();
    let executor = world.executor(50, Decimal::ZERO);
    let lender_before = world.ledger.balance_of(LENDER, usdc().address);

    let result = executor.execute(&mut world.ledger, &opp);

    assert!(result.success());
    assert_eq!(result.final_state(), ExecutionState::Completed);
    assert_eq!(result.failed_at(), None);
    assert_eq!(result.realized_profit(), opp.expected_profit);
    assert!(result.realized_profit() > dec("80.2"));

    assert_eq!(
        world.ledger.balance_of(OPERATOR, usdc().address),
        opp.expected_profit
    );
    assert_eq!(world.ledger.balance_of(EXECUTOR, usdc().address), Decimal::ZERO);
    assert_eq!(world.ledger.balance_of(EXECUTOR, weth().address), Decimal::ZERO);
    assert_eq!(
        world.ledger.balance_of(LENDER, usdc().address),
        lender_before + opp.premium
    );
}

#[test]
fn test_reserves_move_by_the_traded_amounts() {
    let mut world = World::reference();
    let opp = world.opportunity();
    let settlement = world
        .executor(50, Decimal::ZERO)
        .try_execute(&mut world.ledger, &opp)
        .unwrap();

    let (uni, sushi) = world.pools.clone();
    assert_eq!(
        world.ledger.balance_of(uni.address, usdc().address),
        Decimal::from(2_000_000) + opp.input_amount
    );
    assert_eq!(
        world.ledger.balance_of(uni.address, weth().address),
        Decimal::from(1000) - settlement.intermediate
    );
    assert_eq!(
        world.ledger.balance_of(sushi.address, weth().address),
        Decimal::from(1000) + settlement.intermediate
    );
    assert_eq!(
        world.ledger.balance_of(sushi.address, usdc().address),
        Decimal::from(2_050_000) - settlement.output
    );
    assert_eq!(settlement.repaid, opp.input_amount + opp.premium);
}

#[test]
fn test_slippage_after_drift_reverts_without_side_effects() {
    let mut world = World::reference();
    let opp = world.opportunity();
    // someone buys WETH on the cheap side first
    world.third_party_swap("uniswap", &usdc(), &weth(), 20_000);
    let before = world.ledger.clone();

    let result = world.executor(10, Decimal::ZERO).execute(&mut world.ledger, &opp);

    assert!(!result.success());
    assert_eq!(result.final_state(), ExecutionState::Reverted);
    assert_eq!(result.failed_at(), Some(ExecutionState::LoanRequested));
    assert!(result.reason().unwrap().contains("slippage"));
    assert_eq!(result.realized_profit(), Decimal::ZERO);
    assert_eq!(world.ledger, before);
}

#[test]
fn test_slippage_error_kind() {
    let mut world = World::reference();
    let opp = world.opportunity();
    world.third_party_swap("uniswap", &usdc(), &weth(), 20_000);

    let err = world
        .executor(10, Decimal::ZERO)
        .try_execute(&mut world.ledger, &opp)
        .unwrap_err();

    match err {
        ExecutionError::SlippageExceeded {
            exchange,
            minimum,
            actual,
        } => {
            assert_eq!(exchange, "uniswap");
            assert!(actual < minimum);
        }
        other => panic!("expected slippage error, got {:?}", other),
    }
}

#[test]
fn test_loss_after_swaps_is_insufficient_repayment() {
    let mut world = World::reference();
    let opp = world.opportunity();
    // the dear side collapses, but the tolerance is wide enough to let leg B through
    world.third_party_swap("sushiswap", &weth(), &usdc(), 100);
    let before = world.ledger.clone();

    let executor = world.executor(5000, Decimal::ZERO);
    let err = executor.try_execute(&mut world.ledger, &opp).unwrap_err();
    assert!(matches!(err, ExecutionError::InsufficientRepayment { .. }));
    assert_eq!(world.ledger, before);

    let result = executor.execute(&mut world.ledger, &opp);
    assert_eq!(result.failed_at(), Some(ExecutionState::SwappedOnB));
    assert_eq!(world.ledger, before);
}

#[test]
fn test_profit_below_minimum_reverts_after_repayment() {
    let mut world = World::reference();
    let opp = world.opportunity();
    let before = world.ledger.clone();

    let result = world
        .executor(50, Decimal::from(1_000))
        .execute(&mut world.ledger, &opp);

    assert!(!result.success());
    assert_eq!(result.failed_at(), Some(ExecutionState::Repaid));
    assert_eq!(world.ledger, before);
}

#[test]
fn test_unprofitable_opportunity_is_rejected_before_the_loan() {
    let mut world = World::reference();
    let mut opp = world.opportunity();
    opp.expected_profit = Decimal::ZERO;
    let before = world.ledger.clone();

    let result = world.executor(50, Decimal::ZERO).execute(&mut world.ledger, &opp);

    assert!(!result.success());
    assert_eq!(result.failed_at(), Some(ExecutionState::Idle));
    assert_eq!(world.ledger, before);
}

#[test]
fn test_unknown_exchange_reverts() {
    let mut world = World::reference();
    let mut opp = world.opportunity();
    opp.sell_exchange = "curve".to_string();

    let err = world
        .executor(50, Decimal::ZERO)
        .try_execute(&mut world.ledger, &opp)
        .unwrap_err();

    assert_eq!(err, ExecutionError::Reverted("unknown exchange curve".into()));
}

#[test]
fn test_loan_above_pool_liquidity_reverts() {
    let mut world = World::reference();
    let mut opp = world.opportunity();
    opp.input_amount = Decimal::from(20_000_000);
    let before = world.ledger.clone();

    let result = world.executor(50, Decimal::ZERO).execute(&mut world.ledger, &opp);

    assert!(!result.success());
    assert_eq!(result.failed_at(), Some(ExecutionState::Idle));
    assert_eq!(world.ledger, before);
}

#[test]
fn test_halted_exchange_reverts() {
    let mut world = World::reference();
    let opp = world.opportunity();
    let before = world.ledger.clone();

    let mut uni = ConstantProductExchange::new(
        "uniswap",
        Address::from_low_u64(0x1001),
        Address::from_low_u64(0x1002),
        30,
    );
    uni.add_pair(usdc(), weth());
    uni.set_halted(true);
    let mut manager = Manager::new();
    manager.register(Arc::new(uni)).unwrap();
    manager
        .register(world.manager.get("sushiswap").unwrap())
        .unwrap();
    world.manager = manager;

    let result = world.executor(50, Decimal::ZERO).execute(&mut world.ledger, &opp);

    assert!(!result.success());
    assert_eq!(result.failed_at(), Some(ExecutionState::LoanRequested));
    assert_eq!(world.ledger, before);
}

#[test]
fn test_attempt_rejects_skipped_states() {
    let mut attempt = Attempt::new();
    assert!(attempt.advance(ExecutionState::SwappedOnA).is_err());
    assert_eq!(attempt.state, ExecutionState::Idle);

    attempt.advance(ExecutionState::LoanRequested).unwrap();
    attempt.advance(ExecutionState::SwappedOnA).unwrap();
    assert!(attempt.advance(ExecutionState::Completed).is_err());
}
