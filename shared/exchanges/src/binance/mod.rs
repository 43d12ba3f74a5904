pub mod enums;
pub mod functions;
pub mod structs;

use self::{
    enums::OutgoingWsMessageMethod,
    functions::{is_linear_swap, market_from_symbol_info, parse_frame, ticker_streams, BINANCE_TIMEFRAMES},
    structs::{ExchangeInfoResponse, Ticker24hr, WsOutgoingMessage},
};
use crate::{
    shared::{deserializers::candle_from_row, http::try_parse_response},
    structs::{ApiEndpoints, ExchangeConfig},
};
use common::{
    enums::timeframe::Timeframe,
    functions::is_valid_price,
    structs::{MarketInfo, Ohlcv, SymbolMapper, TickerSnapshot},
    traits::exchange::{MarketDataExchange, StreamProtocol, WsFrame},
};
use reqwest::Client;
use serde_json::{to_string, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};
use tickflow_error::TickflowError;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Streams per SUBSCRIBE request; Binance rejects more than 10 requests per second.
const PARAMS_PER_REQUEST: usize = 200;
const MAX_KLINES_LIMIT: u32 = 1_500;

#[derive(Clone)]
pub struct BinanceExchange {
    endpoints: ApiEndpoints,
    http: Client,
    request_id: Arc<AtomicU32>,
}

impl BinanceExchange {
    pub fn new(http: Client, config: &ExchangeConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            http,
            request_id: Arc::new(AtomicU32::new(1)),
        }
    }

    fn next_request_id(&self) -> u32 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn subscribe_message(&self, params: Vec<String>) -> Result<Message, TickflowError> {
        let payload = WsOutgoingMessage {
            method: OutgoingWsMessageMethod::Subscribe,
            params,
            id: self.next_request_id(),
        };
        Ok(Message::Text(to_string(&payload)?))
    }
}

impl MarketDataExchange for BinanceExchange {
    fn get_native_timeframe(&self, timeframe: Timeframe) -> Option<&'static str> {
        BINANCE_TIMEFRAMES.get(timeframe.get_token()).copied()
    }

    async fn fetch_linear_swap_markets(&self) -> Result<Vec<MarketInfo>, TickflowError> {
        let url = format!("{}/fapi/v1/exchangeInfo", self.endpoints.http);
        let response = self.http.get(url).send().await?;
        let info: ExchangeInfoResponse = try_parse_response(response).await?;
        let markets = info
            .symbols
            .iter()
            .filter(|info| is_linear_swap(info))
            .map(market_from_symbol_info)
            .collect();
        Ok(markets)
    }

    async fn fetch_ticker_snapshots(
        &self,
        mapper: &SymbolMapper,
    ) -> Result<HashMap<String, TickerSnapshot>, TickflowError> {
        let url = format!("{}/fapi/v1/ticker/24hr", self.endpoints.http);
        let response = self.http.get(url).send().await?;
        let tickers: Vec<Ticker24hr> = try_parse_response(response).await?;
        let snapshots = tickers
            .into_iter()
            .filter(|ticker| is_valid_price(ticker.last_price))
            .filter_map(|ticker| {
                let mapped = mapper.to_canonical(&ticker.symbol)?;
                let snapshot = TickerSnapshot {
                    last_price: ticker.last_price,
                    price_24h: ticker.open_price,
                    volume_24h: ticker.quote_volume,
                };
                Some((mapped.symbol.to_string(), snapshot))
            })
            .collect();
        Ok(snapshots)
    }

    async fn fetch_ohlcv(
        &self,
        native_id: &str,
        native_timeframe: &'static str,
        _timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Ohlcv>, TickflowError> {
        let url = format!("{}/fapi/v1/klines", self.endpoints.http);
        let limit = limit.clamp(1, MAX_KLINES_LIMIT).to_string();
        let response = self
            .http
            .get(url)
            .query(&[
                ("symbol", native_id),
                ("interval", native_timeframe),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let rows: Vec<Vec<Value>> = try_parse_response(response).await?;
        Ok(rows.iter().filter_map(|row| candle_from_row(row, 5)).collect())
    }
}

impl StreamProtocol for BinanceExchange {
    fn get_ticker_ws_url(&self) -> Result<Url, TickflowError> {
        Ok(Url::parse(&self.endpoints.ws)?)
    }

    fn get_candle_ws_url(&self) -> Result<Url, TickflowError> {
        Ok(Url::parse(&self.endpoints.candle_ws)?)
    }

    fn ticker_subscribe_messages(
        &self,
        native_ids: &[String],
    ) -> Result<Vec<Message>, TickflowError> {
        let streams: Vec<String> = native_ids
            .iter()
            .flat_map(|native_id| ticker_streams(native_id))
            .collect();
        streams
            .chunks(PARAMS_PER_REQUEST)
            .map(|params| self.subscribe_message(params.to_vec()))
            .collect()
    }

    fn candle_subscribe_message(
        &self,
        native_id: &str,
        native_timeframe: &str,
    ) -> Result<Message, TickflowError> {
        let stream = format!("{}@kline_{}", native_id.to_lowercase(), native_timeframe);
        self.subscribe_message(vec![stream])
    }

    fn get_ws_ping_message(&self) -> Option<Message> {
        None
    }

    fn classify_frame(&self, text: &str) -> WsFrame {
        parse_frame(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EXCHANGES_CONFIGS;
    use common::enums::exchange_id::ExchangeId;

    fn exchange() -> BinanceExchange {
        let config = EXCHANGES_CONFIGS.get(&ExchangeId::Binance).unwrap();
        BinanceExchange::new(Client::new(), config)
    }

    #[test]
    fn test_subscribe_requests_are_chunked() {
        let exchange = exchange();
        let ids: Vec<String> = (0..150).map(|i| format!("C{}USDT", i)).collect();
        let messages = exchange.ticker_subscribe_messages(&ids).unwrap();
        assert_eq!(messages.len(), 3);
        let Message::Text(first) = &messages[0] else {
            panic!("expected text message");
        };
        let payload: Value = serde_json::from_str(first).unwrap();
        assert_eq!(payload["method"], "SUBSCRIBE");
        assert_eq!(payload["params"][0], "c0usdt@ticker");
        assert_eq!(payload["params"].as_array().unwrap().len(), 200);
    }

    #[test]
    fn test_timeframes_and_heartbeat() {
        let exchange = exchange();
        assert_eq!(exchange.get_native_timeframe(Timeframe::h8), Some("8h"));
        assert!(exchange.get_ws_ping_message().is_none());
        let Message::Text(candle) = exchange.candle_subscribe_message("BTCUSDT", "1m").unwrap()
        else {
            panic!("expected text message");
        };
        assert!(candle.contains("btcusdt@kline_1m"));
    }
}
