//! Exchange integration abstractions and implementations.

mod amm;
mod constant_product;
mod manager;

use crate::domain::{Address, Token};
use crate::ledger::{Ledger, LedgerError};
use rust_decimal::Decimal;
use thiserror::Error;

pub use amm::get_amount_out;
pub use constant_product::ConstantProductExchange;
pub use manager::Manager;

/// Exchange errors.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// The factory has no pair for these tokens.
    #[error("pair {0} is not supported")]
    PairNotSupported(String),

    /// Reserves or swaps cannot be served right now.
    #[error("exchange unavailable: {0}")]
    Unavailable(String),

    /// The pool cannot cover the requested trade.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// Swap input must be positive.
    #[error("insufficient input amount")]
    InsufficientInputAmount,

    /// Realized output is below the caller's minimum.
    #[error("insufficient output amount: minimum {minimum}, got {actual}")]
    InsufficientOutputAmount { minimum: Decimal, actual: Decimal },

    /// Balance movement failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Arithmetic or other internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for exchange operations.
pub type Result<T> = std::result::Result<T, ExchangeError>;

/// Pair is a liquidity pool registered with an exchange's factory.
///
/// Tokens are kept in address order, like Uniswap V2's token0/token1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    /// Pool contract address; its ledger balances are the reserves.
    pub address: Address,
    pub token0: Token,
    pub token1: Token,
}

impl Pair {
    /// Creates a pair, sorting the tokens by address.
    pub fn new(address: Address, token_a: Token, token_b: Token) -> Self {
        if token_a.address <= token_b.address {
            Self {
                address,
                token0: token_a,
                token1: token_b,
            }
        } else {
            Self {
                address,
                token0: token_b,
                token1: token_a,
            }
        }
    }

    /// Returns the pair's token with the given address.
    pub fn token(&self, address: Address) -> Option<&Token> {
        if self.token0.address == address {
            Some(&self.token0)
        } else if self.token1.address == address {
            Some(&self.token1)
        } else {
            None
        }
    }

    /// Returns "TOKEN0/TOKEN1".
    pub fn label(&self) -> String {
        format!("{}/{}", self.token0.symbol, self.token1.symbol)
    }
}

/// SwapRequest carries the router-level swap arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapRequest {
    pub amount_in: Decimal,
    /// The swap fails instead of returning less than this.
    pub min_amount_out: Decimal,
    pub token_in: Address,
    pub token_out: Address,
    /// Account the input is pulled from.
    pub payer: Address,
    /// Account that receives the output.
    pub recipient: Address,
}

/// Exchange defines the interface to a constant-product AMM.
///
/// Implementations read and write the world state passed in, so every call
/// made inside `Ledger::atomic` is undone together with the rest of the unit.
pub trait Exchange: Send + Sync {
    /// Name returns the unique identifier of this exchange (e.g., "uniswap").
    fn name(&self) -> &str;

    /// Router contract address.
    fn router(&self) -> Address;

    /// Factory contract address.
    fn factory(&self) -> Address;

    /// Swap fee in basis points.
    fn fee_bps(&self) -> u32;

    /// Looks up the pool for two tokens in either order.
    fn pair(&self, token_a: Address, token_b: Address) -> Option<Pair>;

    /// Returns the pool reserves as (reserve0, reserve1).
    /// Returns `Unavailable` when the reserves cannot be read.
    fn get_reserves(&self, state: &Ledger, pair: &Pair) -> Result<(Decimal, Decimal)>;

    /// Swaps exactly `amount_in` of `token_in` for `token_out` and returns the
    /// amount sent to the recipient. Fails with `InsufficientOutputAmount`
    /// rather than deliver less than `min_amount_out`.
    fn swap(&self, state: &mut Ledger, request: &SwapRequest) -> Result<Decimal>;
}
