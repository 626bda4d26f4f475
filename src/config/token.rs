//! Token registry configuration.

use serde::Deserialize;

use crate::domain::{Address, AddressError, Token};

/// Token entry from YAML. Entries replace built-in tokens with the same symbol.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
}

impl From<&TokenConfig> for Token {
    fn from(cfg: &TokenConfig) -> Self {
        Token::new(cfg.symbol.clone(), cfg.address, cfg.decimals)
    }
}

/// Mainnet tokens known without configuration.
pub fn builtin() -> Result<Vec<Token>, AddressError> {
    let table = [
        ("WETH", "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", 18),
        ("USDC", "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48", 6),
        ("DAI", "0x6B175474E89094C44Da98b954EedeAC495271d0F", 18),
        ("USDT", "0xdAC17F958D2ee523a2206206994597C13D831ec7", 6),
        ("LINK", "0x514910771AF9Ca656af840dff83E8264EcF986CA", 18),
    ];

    table
        .iter()
        .map(|(symbol, address, decimals)| -> Result<Token, AddressError> {
            Ok(Token::new(*symbol, address.parse()?, *decimals))
        })
        .collect()
}
