use crate::{
    binance::BinanceExchange, bybit::BybitExchange, hyperliquid::HyperliquidExchange,
    okx::OkxExchange, shared::http::build_http_client, structs::ExchangeConfig,
};
use common::{
    enums::{exchange_id::ExchangeId, timeframe::Timeframe},
    structs::{MarketInfo, Ohlcv, SymbolMapper, TickerSnapshot},
    traits::exchange::{MarketDataExchange, StreamProtocol, WsFrame},
};
use std::collections::HashMap;
use tickflow_error::TickflowError;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

#[derive(Clone)]
pub enum ExchangeWrapper {
    Binance(BinanceExchange),
    Bybit(BybitExchange),
    Okx(OkxExchange),
    Hyperliquid(HyperliquidExchange),
}

impl ExchangeWrapper {
    pub fn new(config: &ExchangeConfig) -> Result<Self, TickflowError> {
        let http = build_http_client(config)?;
        let exchange = match config.exchange_id {
            ExchangeId::Binance => Self::Binance(BinanceExchange::new(http, config)),
            ExchangeId::Bybit => Self::Bybit(BybitExchange::new(http, config)),
            ExchangeId::Okx => Self::Okx(OkxExchange::new(http, config)),
            ExchangeId::Hyperliquid => Self::Hyperliquid(HyperliquidExchange::new(http, config)),
        };
        Ok(exchange)
    }
}

impl MarketDataExchange for ExchangeWrapper {
    fn get_native_timeframe(&self, timeframe: Timeframe) -> Option<&'static str> {
        match self {
            Self::Binance(ex) => ex.get_native_timeframe(timeframe),
            Self::Bybit(ex) => ex.get_native_timeframe(timeframe),
            Self::Okx(ex) => ex.get_native_timeframe(timeframe),
            Self::Hyperliquid(ex) => ex.get_native_timeframe(timeframe),
        }
    }

    async fn fetch_linear_swap_markets(&self) -> Result<Vec<MarketInfo>, TickflowError> {
        match self {
            Self::Binance(ex) => ex.fetch_linear_swap_markets().await,
            Self::Bybit(ex) => ex.fetch_linear_swap_markets().await,
            Self::Okx(ex) => ex.fetch_linear_swap_markets().await,
            Self::Hyperliquid(ex) => ex.fetch_linear_swap_markets().await,
        }
    }

    async fn fetch_ticker_snapshots(
        &self,
        mapper: &SymbolMapper,
    ) -> Result<HashMap<String, TickerSnapshot>, TickflowError> {
        match self {
            Self::Binance(ex) => ex.fetch_ticker_snapshots(mapper).await,
            Self::Bybit(ex) => ex.fetch_ticker_snapshots(mapper).await,
            Self::Okx(ex) => ex.fetch_ticker_snapshots(mapper).await,
            Self::Hyperliquid(ex) => ex.fetch_ticker_snapshots(mapper).await,
        }
    }

    async fn fetch_ohlcv(
        &self,
        native_id: &str,
        native_timeframe: &'static str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Ohlcv>, TickflowError> {
        match self {
            Self::Binance(ex) => ex.fetch_ohlcv(native_id, native_timeframe, timeframe, limit).await,
            Self::Bybit(ex) => ex.fetch_ohlcv(native_id, native_timeframe, timeframe, limit).await,
            Self::Okx(ex) => ex.fetch_ohlcv(native_id, native_timeframe, timeframe, limit).await,
            Self::Hyperliquid(ex) => {
                ex.fetch_ohlcv(native_id, native_timeframe, timeframe, limit)
                    .await
            }
        }
    }
}

impl StreamProtocol for ExchangeWrapper {
    fn get_ticker_ws_url(&self) -> Result<Url, TickflowError> {
        match self {
            Self::Binance(ex) => ex.get_ticker_ws_url(),
            Self::Bybit(ex) => ex.get_ticker_ws_url(),
            Self::Okx(ex) => ex.get_ticker_ws_url(),
            Self::Hyperliquid(ex) => ex.get_ticker_ws_url(),
        }
    }

    fn get_candle_ws_url(&self) -> Result<Url, TickflowError> {
        match self {
            Self::Binance(ex) => ex.get_candle_ws_url(),
            Self::Bybit(ex) => ex.get_candle_ws_url(),
            Self::Okx(ex) => ex.get_candle_ws_url(),
            Self::Hyperliquid(ex) => ex.get_candle_ws_url(),
        }
    }

    fn ticker_subscribe_messages(
        &self,
        native_ids: &[String],
    ) -> Result<Vec<Message>, TickflowError> {
        match self {
            Self::Binance(ex) => ex.ticker_subscribe_messages(native_ids),
            Self::Bybit(ex) => ex.ticker_subscribe_messages(native_ids),
            Self::Okx(ex) => ex.ticker_subscribe_messages(native_ids),
            Self::Hyperliquid(ex) => ex.ticker_subscribe_messages(native_ids),
        }
    }

    fn candle_subscribe_message(
        &self,
        native_id: &str,
        native_timeframe: &str,
    ) -> Result<Message, TickflowError> {
        match self {
            Self::Binance(ex) => ex.candle_subscribe_message(native_id, native_timeframe),
            Self::Bybit(ex) => ex.candle_subscribe_message(native_id, native_timeframe),
            Self::Okx(ex) => ex.candle_subscribe_message(native_id, native_timeframe),
            Self::Hyperliquid(ex) => ex.candle_subscribe_message(native_id, native_timeframe),
        }
    }

    fn get_ws_ping_message(&self) -> Option<Message> {
        match self {
            Self::Binance(ex) => ex.get_ws_ping_message(),
            Self::Bybit(ex) => ex.get_ws_ping_message(),
            Self::Okx(ex) => ex.get_ws_ping_message(),
            Self::Hyperliquid(ex) => ex.get_ws_ping_message(),
        }
    }

    fn classify_frame(&self, text: &str) -> WsFrame {
        match self {
            Self::Binance(ex) => ex.classify_frame(text),
            Self::Bybit(ex) => ex.classify_frame(text),
            Self::Okx(ex) => ex.classify_frame(text),
            Self::Hyperliquid(ex) => ex.classify_frame(text),
        }
    }
}
