pub mod enums;
pub mod functions;
pub mod structs;

use self::{
    functions::{
        candle_from_data, is_linear_swap, market_from_asset, native_asset_name, parse_frame,
        HYPERLIQUID_TIMEFRAMES,
    },
    structs::{
        CandleData, CandleSnapshotRequest, InfoRequest, MetaAndAssetCtxs, Subscription, WsRequest,
    },
};
use crate::{
    shared::http::try_parse_response,
    structs::{ApiEndpoints, ExchangeConfig},
};
use common::{
    enums::timeframe::Timeframe,
    functions::{current_timestamp_ms, is_valid_price},
    structs::{MarketInfo, Ohlcv, SymbolMapper, TickerSnapshot},
    traits::exchange::{MarketDataExchange, StreamProtocol, WsFrame},
};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::to_string;
use std::collections::HashMap;
use tickflow_error::TickflowError;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

const MAX_CANDLES_LIMIT: u32 = 5_000;

#[derive(Clone)]
pub struct HyperliquidExchange {
    endpoints: ApiEndpoints,
    http: Client,
    /// Builder-deployed perp dexes streamed next to the main one.
    venues: Vec<String>,
}

impl HyperliquidExchange {
    pub fn new(http: Client, config: &ExchangeConfig) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            http,
            venues: config.venues.clone(),
        }
    }

    /// The main dex first, then every configured builder dex.
    fn dexes(&self) -> impl Iterator<Item = Option<&str>> {
        std::iter::once(None).chain(self.venues.iter().map(|venue| Some(venue.as_str())))
    }

    async fn post_info<T: DeserializeOwned>(
        &self,
        request: &InfoRequest<'_>,
    ) -> Result<T, TickflowError> {
        let url = format!("{}/info", self.endpoints.http);
        let response = self.http.post(url).json(request).send().await?;
        try_parse_response(response).await
    }

    async fn fetch_meta_and_asset_ctxs(
        &self,
        dex: Option<&str>,
    ) -> Result<MetaAndAssetCtxs, TickflowError> {
        let request = InfoRequest {
            request_type: "metaAndAssetCtxs",
            dex,
            req: None,
        };
        self.post_info(&request).await
    }

    fn subscribe_message(
        &self,
        subscription_type: &'static str,
        coin: &str,
        interval: Option<&str>,
    ) -> Result<Message, TickflowError> {
        let request = WsRequest {
            method: "subscribe",
            subscription: Some(Subscription {
                subscription_type,
                coin: coin.to_string(),
                interval: interval.map(str::to_string),
            }),
        };
        Ok(Message::Text(to_string(&request)?))
    }
}

impl MarketDataExchange for HyperliquidExchange {
    fn get_native_timeframe(&self, timeframe: Timeframe) -> Option<&'static str> {
        HYPERLIQUID_TIMEFRAMES.get(timeframe.get_token()).copied()
    }

    async fn fetch_linear_swap_markets(&self) -> Result<Vec<MarketInfo>, TickflowError> {
        let mut markets = Vec::new();
        for dex in self.dexes() {
            let (meta, _) = self.fetch_meta_and_asset_ctxs(dex).await?;
            markets.extend(
                meta.universe
                    .iter()
                    .filter(|asset| is_linear_swap(asset, &meta))
                    .map(|asset| market_from_asset(asset, dex)),
            );
        }
        Ok(markets)
    }

    async fn fetch_ticker_snapshots(
        &self,
        mapper: &SymbolMapper,
    ) -> Result<HashMap<String, TickerSnapshot>, TickflowError> {
        let mut snapshots = HashMap::new();
        for dex in self.dexes() {
            let (meta, ctxs) = self.fetch_meta_and_asset_ctxs(dex).await?;
            for (asset, ctx) in meta.universe.iter().zip(ctxs.iter()) {
                let Some(last_price) = ctx.last_price().filter(|price| is_valid_price(*price))
                else {
                    continue;
                };
                let Some(mapped) = mapper.to_canonical(&native_asset_name(asset, dex)) else {
                    continue;
                };
                let snapshot = TickerSnapshot {
                    last_price,
                    price_24h: ctx.prev_day_px,
                    volume_24h: ctx.day_ntl_vlm,
                };
                snapshots.insert(mapped.symbol.to_string(), snapshot);
            }
        }
        Ok(snapshots)
    }

    async fn fetch_ohlcv(
        &self,
        native_id: &str,
        native_timeframe: &'static str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Ohlcv>, TickflowError> {
        let limit = limit.clamp(1, MAX_CANDLES_LIMIT) as i64;
        let end_time = current_timestamp_ms();
        let start_time = end_time - timeframe.get_duration_in_ms() * limit;
        let request = InfoRequest {
            request_type: "candleSnapshot",
            dex: None,
            req: Some(CandleSnapshotRequest {
                coin: native_id,
                interval: native_timeframe,
                start_time,
                end_time,
            }),
        };
        let candles: Vec<CandleData> = self.post_info(&request).await?;
        Ok(candles.iter().map(candle_from_data).collect())
    }
}

impl StreamProtocol for HyperliquidExchange {
    fn get_ticker_ws_url(&self) -> Result<Url, TickflowError> {
        Ok(Url::parse(&self.endpoints.ws)?)
    }

    fn get_candle_ws_url(&self) -> Result<Url, TickflowError> {
        Ok(Url::parse(&self.endpoints.candle_ws)?)
    }

    /// One subscription per message.
    fn ticker_subscribe_messages(
        &self,
        native_ids: &[String],
    ) -> Result<Vec<Message>, TickflowError> {
        let mut messages = Vec::with_capacity(native_ids.len() * 2);
        for native_id in native_ids {
            messages.push(self.subscribe_message("activeAssetCtx", native_id, None)?);
            messages.push(self.subscribe_message("bbo", native_id, None)?);
        }
        Ok(messages)
    }

    fn candle_subscribe_message(
        &self,
        native_id: &str,
        native_timeframe: &str,
    ) -> Result<Message, TickflowError> {
        self.subscribe_message("candle", native_id, Some(native_timeframe))
    }

    fn get_ws_ping_message(&self) -> Option<Message> {
        let ping = WsRequest {
            method: "ping",
            subscription: None,
        };
        to_string(&ping).ok().map(Message::Text)
    }

    fn classify_frame(&self, text: &str) -> WsFrame {
        parse_frame(text)
    }
}
