use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WsChannel {
    ActiveAssetCtx,
    Bbo,
    Candle,
    Pong,
    SubscriptionResponse,
    Error,
    #[serde(other)]
    Other,
}
