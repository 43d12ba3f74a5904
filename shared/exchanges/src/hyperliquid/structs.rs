use crate::shared::deserializers::{parse_f64, parse_f64_option, parse_i64};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct InfoRequest<'a> {
    #[serde(rename = "type")]
    pub request_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dex: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub req: Option<CandleSnapshotRequest<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandleSnapshotRequest<'a> {
    pub coin: &'a str,
    pub interval: &'a str,
    pub start_time: i64,
    pub end_time: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpMeta {
    pub universe: Vec<PerpAsset>,
    /// Spot token index the dex margins in; absent on older payloads.
    #[serde(default)]
    pub collateral_token: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerpAsset {
    pub name: String,
    pub sz_decimals: u32,
    #[serde(default)]
    pub max_leverage: Option<f64>,
    #[serde(default)]
    pub is_delisted: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetCtx {
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub funding: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub prev_day_px: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub day_ntl_vlm: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub mark_px: Option<f64>,
    #[serde(default, deserialize_with = "parse_f64_option")]
    pub mid_px: Option<f64>,
}

impl AssetCtx {
    pub fn last_price(&self) -> Option<f64> {
        self.mid_px.or(self.mark_px)
    }
}

/// `[meta, assetCtxs]`, index aligned.
pub type MetaAndAssetCtxs = (PerpMeta, Vec<AssetCtx>);

#[derive(Debug, Deserialize)]
pub struct CandleData {
    #[serde(deserialize_with = "parse_i64")]
    pub t: i64,
    #[serde(deserialize_with = "parse_f64")]
    pub o: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub h: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub l: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub c: f64,
    #[serde(deserialize_with = "parse_f64")]
    pub v: f64,
}

#[derive(Debug, Serialize)]
pub struct WsRequest {
    pub method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
}

#[derive(Debug, Serialize)]
pub struct Subscription {
    #[serde(rename = "type")]
    pub subscription_type: &'static str,
    pub coin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WsMessage {
    pub channel: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct ActiveAssetCtxData {
    pub coin: String,
    pub ctx: AssetCtx,
}

#[derive(Debug, Deserialize)]
pub struct BboData {
    pub coin: String,
    /// `[bid, ask]`, either side may be null.
    pub bbo: Vec<Option<BboLevel>>,
}

#[derive(Debug, Deserialize)]
pub struct BboLevel {
    #[serde(deserialize_with = "parse_f64")]
    pub px: f64,
}
