pub mod enums;
pub mod functions;
pub mod structs;

use self::{
    functions::{is_linear_swap, market_from_instrument, parse_frame, BYBIT_TIMEFRAMES},
    structs::{
        BybitHttpResponseWrapper, HttpResultList, InstrumentInfo, KlineResult, PingWsMessage,
        TickerData, WsRequest,
    },
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
use log::warn;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::to_string;
use std::collections::HashMap;
use tickflow_error::TickflowError;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const ARGS_PER_REQUEST: usize = 10;
const INSTRUMENTS_PAGE_LIMIT: &str = "1000";
const MAX_INSTRUMENT_PAGES: usize = 20;
const MAX_KLINES_LIMIT: u32 = 1_000;

#[derive(Clone)]
pub struct BybitExchange {
    endpoints: ApiEndpoints,
    http: Client,
}

impl BybitExchange {
    pub fn new(http: Client, config: &ExchangeConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            http,
        }
    }

    async fn get_result<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TickflowError> {
        let url = format!("{}{}", self.endpoints.http, path);
        let response = self.http.get(url).query(query).send().await?;
        let wrapper: BybitHttpResponseWrapper<T> = try_parse_response(response).await?;
        if wrapper.ret_code != 0 {
            return Err(TickflowError::new_unsuccessful_response(format!(
                "{} retCode {}: {}",
                path, wrapper.ret_code, wrapper.ret_message
            )));
        }
        wrapper.result.ok_or_else(|| {
            TickflowError::new_unsuccessful_response(format!("{} returned no result", path))
        })
    }
}

impl MarketDataExchange for BybitExchange {
    fn get_native_timeframe(&self, timeframe: Timeframe) -> Option<&'static str> {
        BYBIT_TIMEFRAMES.get(timeframe.get_token()).copied()
    }

    async fn fetch_linear_swap_markets(&self) -> Result<Vec<MarketInfo>, TickflowError> {
        let mut markets = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_INSTRUMENT_PAGES {
            let mut query = vec![("category", "linear"), ("limit", INSTRUMENTS_PAGE_LIMIT)];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.as_str()));
            }
            let page: HttpResultList<InstrumentInfo> = self
                .get_result("/v5/market/instruments-info", &query)
                .await?;
            markets.extend(
                page.list
                    .iter()
                    .filter(|instrument| is_linear_swap(instrument))
                    .map(market_from_instrument),
            );
            match page.next_page_cursor.filter(|next| !next.is_empty()) {
                Some(next) => cursor = next,
                None => return Ok(markets),
            }
        }

        warn!("bybit instruments pagination stopped after {} pages", MAX_INSTRUMENT_PAGES);
        Ok(markets)
    }

    async fn fetch_ticker_snapshots(
        &self,
        mapper: &SymbolMapper,
    ) -> Result<HashMap<String, TickerSnapshot>, TickflowError> {
        let tickers: HttpResultList<TickerData> = self
            .get_result("/v5/market/tickers", &[("category", "linear")])
            .await?;
        let snapshots = tickers
            .list
            .into_iter()
            .filter_map(|ticker| {
                let last_price = ticker.last_price.filter(|price| is_valid_price(*price))?;
                let mapped = mapper.to_canonical(&ticker.symbol)?;
                let snapshot = TickerSnapshot {
                    last_price,
                    price_24h: ticker.prev_price_24h,
                    volume_24h: ticker.turnover_24h,
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
        let limit = limit.clamp(1, MAX_KLINES_LIMIT).to_string();
        let klines: KlineResult = self
            .get_result(
                "/v5/market/kline",
                &[
                    ("category", "linear"),
                    ("symbol", native_id),
                    ("interval", native_timeframe),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        // newest first on the wire
        let mut candles: Vec<Ohlcv> = klines
            .list
            .iter()
            .filter_map(|row| candle_from_row(row, 5))
            .collect();
        candles.reverse();
        Ok(candles)
    }
}

impl StreamProtocol for BybitExchange {
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
        native_ids
            .chunks(ARGS_PER_REQUEST)
            .map(|chunk| {
                let args = chunk
                    .iter()
                    .map(|native_id| format!("tickers.{}", native_id))
                    .collect();
                let request = WsRequest::new(String::from("subscribe"), args);
                Ok(Message::Text(to_string(&request)?))
            })
            .collect()
    }

    fn candle_subscribe_message(
        &self,
        native_id: &str,
        native_timeframe: &str,
    ) -> Result<Message, TickflowError> {
        let request = WsRequest::new(
            String::from("subscribe"),
            vec![format!("kline.{}.{}", native_timeframe, native_id)],
        );
        Ok(Message::Text(to_string(&request)?))
    }

    fn get_ws_ping_message(&self) -> Option<Message> {
        let ping = PingWsMessage {
            req_id: String::from("ping"),
            op: String::from("ping"),
        };
        to_string(&ping).ok().map(Message::Text)
    }

    fn classify_frame(&self, text: &str) -> WsFrame {
        parse_frame(text)
    }
}
