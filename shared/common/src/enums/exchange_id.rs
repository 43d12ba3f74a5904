use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FormatterResult},
    str::FromStr,
};
use tickflow_error::TickflowError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeId {
    Binance,
    Bybit,
    Okx,
    Hyperliquid,
}

impl ExchangeId {
    pub const ALL: [ExchangeId; 4] = [Self::Binance, Self::Bybit, Self::Okx, Self::Hyperliquid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "binance",
            Self::Bybit => "bybit",
            Self::Okx => "okx",
            Self::Hyperliquid => "hyperliquid",
        }
    }

    /// Prefix used by environment overrides, e.g. `BYBIT_WS_URL`.
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Binance => "BINANCE",
            Self::Bybit => "BYBIT",
            Self::Okx => "OKX",
            Self::Hyperliquid => "HYPERLIQUID",
        }
    }
}

impl Display for ExchangeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatterResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExchangeId {
    type Err = TickflowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "binance" | "binanceusdm" => Ok(Self::Binance),
            "bybit" => Ok(Self::Bybit),
            "okx" => Ok(Self::Okx),
            "hyperliquid" => Ok(Self::Hyperliquid),
            _ => Err(TickflowError::new_unknown_exchange(value)),
        }
    }
}
