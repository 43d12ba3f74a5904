use common::{
    enums::exchange_id::ExchangeId,
    structs::{Ohlcv, StreamEvent, TickerSlot},
};
use serde::Serialize;
use serde_json::to_string;
use tickflow_error::TickflowError;

/// Unsolicited messages pushed to the host. Never carry a request id.
#[derive(Debug, Serialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum WorkerEvent<'a> {
    Ready,
    OhlcvUpdate {
        stream_id: &'a str,
        data: &'a Ohlcv,
    },
    TickerUpdate {
        exchange_id: ExchangeId,
        #[serde(skip_serializing_if = "Option::is_none")]
        venue: Option<&'a str>,
        data: &'a [TickerSlot],
    },
}

impl<'a> From<&'a StreamEvent> for WorkerEvent<'a> {
    fn from(event: &'a StreamEvent) -> Self {
        match event {
            StreamEvent::Tickers(batch) => Self::TickerUpdate {
                exchange_id: batch.key.exchange_id,
                venue: batch.key.venue.as_deref(),
                data: batch.slots(),
            },
            StreamEvent::Candle { stream_id, candle } => Self::OhlcvUpdate {
                stream_id,
                data: candle,
            },
        }
    }
}

/// One JSON line. Ticker slots are serialized straight from the pooled array.
pub fn encode_event(event: &StreamEvent) -> Result<String, TickflowError> {
    Ok(to_string(&WorkerEvent::from(event))?)
}

pub fn encode_ready() -> Result<String, TickflowError> {
    Ok(to_string(&WorkerEvent::Ready)?)
}
