use crate::shared::deserializers::{parse_f64_option, parse_i64_option};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct OkxHttpResponse<T> {
    pub code: String,
    #[serde(default)]
    pub msg: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub inst_id: String,
    pub inst_type: String,
    #[serde(default)]
    pub ct_type: String,
    #[serde(default)]
    pub settle_ccy: String,
    #[serde(default)]
    pub ct_val_ccy: String,
    #[serde(default)]
    pub uly: String,
    pub state: String,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub ct_val: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub tick_sz: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub lot_sz: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub min_sz: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub max_lmt_sz: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub lever: Option<f64>,
}

/// REST tickers and the `tickers` channel share this shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerData {
    pub inst_id: String,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub last: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub bid_px: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub ask_px: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub open_24h: Option<f64>,
    /// Base currency amount for derivatives.
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub vol_ccy_24h: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRateData {
    pub inst_id: String,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub funding_rate: Option<f64>,
    /// Upcoming settlement.
    #[serde(default, deserialize_with = "parse_i64_option")]
    pub funding_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelArg {
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inst_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WsRequest {
    pub op: String,
    pub args: Vec<ChannelArg>,
}

#[derive(Debug, Deserialize)]
pub struct EventMessage {
    pub event: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PushMessage {
    pub arg: ChannelArg,
    pub data: Value,
}
