pub mod enums;
pub mod functions;
pub mod structs;

use self::{
    functions::{
        is_linear_swap, market_from_instrument, parse_frame, quote_volume, CANDLE_VOLUME_INDEX,
        OKX_TIMEFRAMES,
    },
    structs::{ChannelArg, Instrument, OkxHttpResponse, TickerData, WsRequest},
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
use serde::de::DeserializeOwned;
use serde_json::{to_string, Value};
use std::collections::HashMap;
use tickflow_error::TickflowError;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const ARGS_PER_REQUEST: usize = 100;
const MAX_CANDLES_LIMIT: u32 = 300;

#[derive(Clone)]
pub struct OkxExchange {
    endpoints: ApiEndpoints,
    http: Client,
}

impl OkxExchange {
    pub fn new(http: Client, config: &ExchangeConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            http,
        }
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, TickflowError> {
        let url = format!("{}{}", self.endpoints.http, path);
        let response = self.http.get(url).query(query).send().await?;
        let parsed: OkxHttpResponse<T> = try_parse_response(response).await?;
        if parsed.code != "0" {
            return Err(TickflowError::new_unsuccessful_response(format!(
                "{} code {}: {}",
                path, parsed.code, parsed.msg
            )));
        }
        Ok(parsed.data)
    }

    fn subscribe_message(&self, args: Vec<ChannelArg>) -> Result<Message, TickflowError> {
        let request = WsRequest {
            op: String::from("subscribe"),
            args,
        };
        Ok(Message::Text(to_string(&request)?))
    }
}

impl MarketDataExchange for OkxExchange {
    fn get_native_timeframe(&self, timeframe: Timeframe) -> Option<&'static str> {
        OKX_TIMEFRAMES.get(timeframe.get_token()).copied()
    }

    async fn fetch_linear_swap_markets(&self) -> Result<Vec<MarketInfo>, TickflowError> {
        let instruments: Vec<Instrument> = self
            .get_data("/api/v5/public/instruments", &[("instType", "SWAP")])
            .await?;
        Ok(instruments
            .iter()
            .filter(|instrument| is_linear_swap(instrument))
            .filter_map(market_from_instrument)
            .collect())
    }

    async fn fetch_ticker_snapshots(
        &self,
        mapper: &SymbolMapper,
    ) -> Result<HashMap<String, TickerSnapshot>, TickflowError> {
        let tickers: Vec<TickerData> = self
            .get_data("/api/v5/market/tickers", &[("instType", "SWAP")])
            .await?;
        let snapshots = tickers
            .iter()
            .filter_map(|ticker| {
                let last_price = ticker.last.filter(|price| is_valid_price(*price))?;
                let mapped = mapper.to_canonical(&ticker.inst_id)?;
                let snapshot = TickerSnapshot {
                    last_price,
                    price_24h: ticker.open_24h,
                    volume_24h: quote_volume(ticker),
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
        let limit = limit.clamp(1, MAX_CANDLES_LIMIT).to_string();
        let rows: Vec<Vec<Value>> = self
            .get_data(
                "/api/v5/market/candles",
                &[
                    ("instId", native_id),
                    ("bar", native_timeframe),
                    ("limit", limit.as_str()),
                ],
            )
            .await?;
        let mut candles: Vec<Ohlcv> = rows
            .iter()
            .filter_map(|row| candle_from_row(row, CANDLE_VOLUME_INDEX))
            .collect();
        candles.reverse();
        Ok(candles)
    }
}

impl StreamProtocol for OkxExchange {
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
        let args: Vec<ChannelArg> = native_ids
            .iter()
            .flat_map(|native_id| {
                ["tickers", "funding-rate"].map(|channel| ChannelArg {
                    channel: channel.to_string(),
                    inst_id: Some(native_id.clone()),
                })
            })
            .collect();
        args.chunks(ARGS_PER_REQUEST)
            .map(|chunk| self.subscribe_message(chunk.to_vec()))
            .collect()
    }

    fn candle_subscribe_message(
        &self,
        native_id: &str,
        native_timeframe: &str,
    ) -> Result<Message, TickflowError> {
        self.subscribe_message(vec![ChannelArg {
            channel: format!("candle{}", native_timeframe),
            inst_id: Some(native_id.to_string()),
        }])
    }

    fn get_ws_ping_message(&self) -> Option<Message> {
        Some(Message::Text(String::from("ping")))
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
    use serde_json::from_str;

    fn exchange() -> OkxExchange {
        let config = EXCHANGES_CONFIGS.get(&ExchangeId::Okx).unwrap();
        OkxExchange::new(Client::new(), config)
    }

    #[test]
    fn test_subscribes_tickers_and_funding() {
        let ids = vec![String::from("BTC-USDT-SWAP")];
        let messages = exchange().ticker_subscribe_messages(&ids).unwrap();
        let Message::Text(text) = &messages[0] else {
            panic!("expected text message");
        };
        let payload: Value = from_str(text).unwrap();
        assert_eq!(payload["args"][0]["channel"], "tickers");
        assert_eq!(payload["args"][1]["channel"], "funding-rate");
        assert_eq!(payload["args"][1]["instId"], "BTC-USDT-SWAP");
    }

    #[test]
    fn test_candle_channel_and_ping() {
        let exchange = exchange();
        let native = exchange.get_native_timeframe(Timeframe::h1).unwrap();
        let Message::Text(text) = exchange
            .candle_subscribe_message("BTC-USDT-SWAP", native)
            .unwrap()
        else {
            panic!("expected text message");
        };
        assert!(text.contains(r#""channel":"candle1H""#));
        assert_eq!(
            exchange.get_ws_ping_message(),
            Some(Message::Text(String::from("ping")))
        );
        assert!(exchange.get_native_timeframe(Timeframe::h8).is_none());
    }
}
