use crate::shared::deserializers::{parse_f64, parse_f64_option, parse_i64, parse_i64_option};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize, Debug)]
pub struct WsRequest {
    op: String,
    args: Vec<String>,
}

impl WsRequest {
    pub fn new(op: String, args: Vec<String>) -> Self {
        WsRequest { op, args }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PingWsMessage {
    pub req_id: String,
    pub op: String,
}

/// Reply to an `op` request: subscribe acks and pongs.
#[derive(Debug, Deserialize)]
pub struct OpWsMessage {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub ret_msg: String,
    pub op: String,
}

#[derive(Debug, Deserialize)]
pub struct TopicWsMessage {
    pub topic: String,
    #[serde(rename = "type", default)]
    pub message_type: String,
    pub data: Value,
}

#[derive(Debug, Deserialize)]
pub struct BybitHttpResponseWrapper<T> {
    #[serde(rename = "retCode")]
    pub ret_code: i32,
    #[serde(rename = "retMsg")]
    pub ret_message: String,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpResultList<T> {
    #[serde(rename = "nextPageCursor", default)]
    pub next_page_cursor: Option<String>,
    pub list: Vec<T>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentInfo {
    pub symbol: String,
    #[serde(default)]
    pub contract_type: String,
    pub status: String,
    pub base_coin: String,
    pub quote_coin: String,
    pub settle_coin: String,
    pub price_filter: PriceFilter,
    pub lot_size_filter: LotSizeFilter,
    pub leverage_filter: LeverageFilter,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceFilter {
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub tick_size: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LotSizeFilter {
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub qty_step: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub min_order_qty: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub max_order_qty: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageFilter {
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub max_leverage: Option<f64>,
}

/// Shared by the REST tickers list and the `tickers.*` topic; deltas only
/// carry the fields that changed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerData {
    pub symbol: String,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub last_price: Option<f64>,
    #[serde(rename = "bid1Price", default, deserialize_with = "parse_f64_option")]
    pub bid_price: Option<f64>,
    #[serde(rename = "ask1Price", default, deserialize_with = "parse_f64_option")]
    pub ask_price: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub prev_price_24h: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub turnover_24h: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub funding_rate: Option<f64>,
    #[serde(default, deserialize_with = "parse_i64_option")]
    pub next_funding_time: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlineData {
    #[serde(deserialize_with = "parse_i64")]
    pub start: i64,
    #[serde(deserialize_with = "parse_f64")]
    pub open: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub high: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub low: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub close: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub volume: f64,
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KlineResult {
    pub list: Vec<Vec<Value>>,
}
