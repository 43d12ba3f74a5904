use serde::{Deserialize, Serialize};

/// One tradeable linear swap, as produced by a market catalog load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Canonical `BASE/QUOTE:SETTLE` symbol.
    pub symbol: String,
    /// Exchange-native instrument id.
    pub id: String,
    pub base: String,
    pub quote: String,
    pub settle: String,
    pub active: bool,
    pub tick_size: Option<f64>,
    pub qty_step: Option<f64>,
    pub min_qty: Option<f64>,
    pub max_qty: Option<f64>,
    pub contract_size: f64,
    pub max_leverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,
}
