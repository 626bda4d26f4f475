//! Domain models for flash-loan arbitrage.

mod address;
pub mod fees;
mod flash_loan;
mod opportunity;
mod quote;
mod result;
mod token;

pub use address::{Address, AddressError};
pub use flash_loan::{FlashLoanRequest, premium_for};
pub use opportunity::ArbitrageOpportunity;
pub use quote::ExchangeQuote;
pub use result::{ExecutionResult, ExecutionState};
pub use token::{Token, parse_pair};
