use super::enums::OutgoingWsMessageMethod;
use crate::shared::deserializers::{parse_f64, parse_f64_option, parse_i64_option};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    pub symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    pub symbol: String,
    #[serde(default)]
    pub contract_type: String,
    pub status: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub margin_asset: String,
    #[serde(default)]
    pub filters: Vec<SymbolFilter>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    Price {
        #[serde(deserialize_with = "parse_f64")]
        tick_size: f64,
    },
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        #[serde(deserialize_with = "parse_f64")]
        step_size: f64,
        #[serde(deserialize_with = "parse_f64")]
        min_qty: f64,
        #[serde(deserialize_with = "parse_f64")]
        max_qty: f64,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticker24hr {
    pub symbol: String,
    #[serde(deserialize_with = "parse_f64")]
    pub last_price: f64,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub open_price: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub quote_volume: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct WsOutgoingMessage {
    pub method: OutgoingWsMessageMethod,
    pub params: Vec<String>,
    pub id: u32,
}

#[derive(Debug, Deserialize)]
pub struct TickerEvent {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "c", deserialize_with = "parse_f64")]
    pub last_price: f64,
    #[serde(rename = "o", default, deserialize_with = "parse_f64_option")]
    pub open: Option<f64>,
    #[serde(rename = "q", default, deserialize_with = "parse_f64_option")]
    pub quote_volume: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct BookTickerEvent {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "b", default, deserialize_with = "parse_f64_option")]
    pub bid: Option<f64>,
    #[serde(rename = "a", default, deserialize_with = "parse_f64_option")]
    pub ask: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MarkPriceEvent {
    #[serde(rename = "s")]
    pub symbol: String,
    #[serde(rename = "r", default, deserialize_with = "parse_f64_option")]
    pub funding_rate: Option<f64>,
    #[serde(rename = "T", default, deserialize_with = "parse_i64_option")]
    pub next_funding_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct KlineEvent {
    #[serde(rename = "k")]
    pub kline: KlineData,
}

#[derive(Debug, Deserialize)]
pub struct KlineData {
    #[serde(rename = "t")]
    pub start_time: i64,
    #[serde(rename = "o", deserialize_with = "parse_f64")]
    pub open: f64,
    #[serde(rename = "h", deserialize_with = "parse_f64")]
    pub high: f64,
    #[serde(rename = "l", deserialize_with = "parse_f64")]
    pub low: f64,
    #[serde(rename = "c", deserialize_with = "parse_f64")]
    pub close: f64,
    #[serde(rename = "v", deserialize_with = "parse_f64")]
    pub volume: f64,
}

#[derive(Debug, Deserialize)]
pub struct ErrorMessage {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub id: u64,
}
