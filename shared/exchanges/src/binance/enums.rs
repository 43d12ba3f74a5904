use super::structs::{
    BookTickerEvent, ErrorMessage, KlineEvent, MarkPriceEvent, ResponseMessage, TickerEvent,
};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub enum OutgoingWsMessageMethod {
    #[serde(rename = "SUBSCRIBE")]
    Subscribe,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
pub enum MarketEvent {
    #[serde(rename = "24hrTicker")]
    Ticker(TickerEvent),
    #[serde(rename = "bookTicker")]
    BookTicker(BookTickerEvent),
    #[serde(rename = "markPriceUpdate")]
    MarkPrice(MarkPriceEvent),
    #[serde(rename = "kline")]
    Kline(KlineEvent),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IncomingWsMessage {
    None,
    Event(MarketEvent),
    Error(ErrorMessage),
    Response(ResponseMessage),
}

impl Default for IncomingWsMessage {
    fn default() -> Self {
        Self::None
    }
}
