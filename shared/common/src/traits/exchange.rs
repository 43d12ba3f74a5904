use crate::{
    enums::timeframe::Timeframe,
    structs::{MarketInfo, Ohlcv, SymbolMapper, TickerSnapshot, TickerUpdate},
};
use std::{collections::HashMap, future::Future};
use tickflow_error::TickflowError;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// REST side of an exchange: catalog, snapshots and candle history.
pub trait MarketDataExchange {
    /// Native interval string for a generic timeframe, `None` when the
    /// exchange has no such interval.
    fn get_native_timeframe(&self, timeframe: Timeframe) -> Option<&'static str>;

    /// Loads the instrument catalog and keeps only eligible linear swaps,
    /// already mapped to canonical symbols.
    fn fetch_linear_swap_markets(
        &self,
    ) -> impl Future<Output = Result<Vec<MarketInfo>, TickflowError>> + Send;
    fn fetch_ticker_snapshots(
        &self,
        mapper: &SymbolMapper,
    ) -> impl Future<Output = Result<HashMap<String, TickerSnapshot>, TickflowError>> + Send;
    /// Candles in ascending time order.
    fn fetch_ohlcv(
        &self,
        native_id: &str,
        native_timeframe: &'static str,
        timeframe: Timeframe,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<Ohlcv>, TickflowError>> + Send;
}

/// Result of classifying one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum WsFrame {
    SubscribeAck,
    Error(String),
    Pong,
    Tickers(Vec<TickerUpdate>),
    Candles(Vec<Ohlcv>),
    Ignored,
    Malformed(String),
}

/// WebSocket side of an exchange: the sole translator between its wire
/// format and canonical updates.
pub trait StreamProtocol: Send + Sync + 'static {
    fn get_ticker_ws_url(&self) -> Result<Url, TickflowError>;
    fn get_candle_ws_url(&self) -> Result<Url, TickflowError>;
    fn ticker_subscribe_messages(&self, native_ids: &[String])
        -> Result<Vec<Message>, TickflowError>;
    fn candle_subscribe_message(
        &self,
        native_id: &str,
        native_timeframe: &str,
    ) -> Result<Message, TickflowError>;
    /// `None` for exchanges without a client heartbeat.
    fn get_ws_ping_message(&self) -> Option<Message>;
    fn classify_frame(&self, text: &str) -> WsFrame;
}
