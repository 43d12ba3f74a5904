use crate::{
    candle_streams::CandleStreams,
    enums::Command,
    structs::{
        DestroyedResult, RpcRequest, RpcResponse, StartedResult, StoppedResult,
        StreamStatusResult,
    },
};
use common::{
    enums::{exchange_id::ExchangeId, stream_state::StreamState},
    structs::EventEmitter,
};
use exchanges::{
    client::ExchangeClient, config::EXCHANGES_CONFIGS, shared::lock, structs::ExchangeConfig,
};
use log::{error, info};
use serde_json::{to_value, Value};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tickflow_error::TickflowError;

/// Executes host commands and owns every exchange client.
pub struct RpcGateway {
    configs: HashMap<ExchangeId, ExchangeConfig>,
    clients: Mutex<HashMap<ExchangeId, Arc<ExchangeClient>>>,
    candle_streams: CandleStreams,
    emitter: EventEmitter,
}

impl RpcGateway {
    pub fn new(emitter: EventEmitter) -> Self {
        Self::with_configs(emitter, EXCHANGES_CONFIGS.clone())
    }

    pub fn with_configs(
        emitter: EventEmitter,
        configs: HashMap<ExchangeId, ExchangeConfig>,
    ) -> Self {
        Self {
            configs,
            clients: Mutex::new(HashMap::new()),
            candle_streams: CandleStreams::new(emitter.clone()),
            emitter,
        }
    }

    /// Lazily constructs the client on first use.
    pub fn client(&self, exchange_id: ExchangeId) -> Result<Arc<ExchangeClient>, TickflowError> {
        let mut clients = lock(&self.clients);
        if let Some(client) = clients.get(&exchange_id) {
            return Ok(client.clone());
        }
        let config = self
            .configs
            .get(&exchange_id)
            .cloned()
            .ok_or_else(|| TickflowError::new_unknown_exchange(exchange_id.as_str()))?;
        let client = Arc::new(ExchangeClient::with_config(config, self.emitter.clone())?);
        info!("{} client created", exchange_id);
        clients.insert(exchange_id, client.clone());
        Ok(client)
    }

    fn existing_client(&self, exchange_id: ExchangeId) -> Option<Arc<ExchangeClient>> {
        lock(&self.clients).get(&exchange_id).cloned()
    }

    pub fn candle_streams(&self) -> &CandleStreams {
        &self.candle_streams
    }

    /// Always answers; failures become a rejected response.
    pub async fn handle(&self, request: RpcRequest) -> RpcResponse {
        let request_id = request.request_id;
        let request_type = request.request_type.clone();
        match self.execute(request).await {
            Ok(result) => RpcResponse::ok(request_id, result),
            Err(error) => {
                error!("{} request {} failed: {}", request_type, request_id, error);
                RpcResponse::rejected(request_id, &error)
            }
        }
    }

    async fn execute(&self, request: RpcRequest) -> Result<Value, TickflowError> {
        let command = Command::parse(&request.request_type, request.payload)?;
        let result = match command {
            Command::FetchMarkets { exchange_id } => {
                let catalog = self.client(exchange_id)?.load_markets(false).await?;
                to_value(&catalog.markets)?
            }
            Command::ReloadMarkets { exchange_id } => {
                let catalog = self.client(exchange_id)?.load_markets(true).await?;
                to_value(&catalog.markets)?
            }
            Command::FetchTickers { exchange_id } => {
                to_value(self.client(exchange_id)?.fetch_tickers().await?)?
            }
            Command::FetchOhlcv {
                exchange_id,
                symbol,
                timeframe,
                limit,
            } => {
                let candles = self
                    .client(exchange_id)?
                    .fetch_ohlcv(&symbol, timeframe, limit)
                    .await?;
                to_value(candles)?
            }
            Command::StartOhlcvStream {
                exchange_id,
                symbol,
                timeframe,
                stream_id,
            } => {
                let client = self.client(exchange_id)?;
                let watcher = client.candle_watcher(&symbol, timeframe).await?;
                self.candle_streams.start(
                    stream_id.clone(),
                    exchange_id,
                    watcher,
                    client.get_config().candle_retry_delay,
                );
                // destroy may have swept the exchange between the watcher and the insert
                if client.is_destroyed() {
                    self.candle_streams.stop(&stream_id);
                    return Err(TickflowError::new_client_destroyed(exchange_id.as_str()));
                }
                to_value(StartedResult { started: true })?
            }
            Command::StopStream { stream_id } => {
                self.candle_streams.stop(&stream_id);
                to_value(StoppedResult { stopped: true })?
            }
            Command::StopAllStreams => {
                self.stop_all();
                to_value(StoppedResult { stopped: true })?
            }
            Command::StartTickerStream { exchange_id } => {
                let started = self.client(exchange_id)?.start_ticker_stream().await?;
                if !started {
                    info!("{} ticker stream already running", exchange_id);
                }
                to_value(StartedResult { started: true })?
            }
            Command::StopTickerStream { exchange_id } => {
                if let Some(client) = self.existing_client(exchange_id) {
                    client.stop_ticker_stream();
                }
                to_value(StoppedResult { stopped: true })?
            }
            Command::GetStreamStatus { exchange_id } => {
                let result = match self.existing_client(exchange_id) {
                    Some(client) => StreamStatusResult {
                        status: client.ticker_status(),
                        shards: client.shard_states(),
                    },
                    None => StreamStatusResult {
                        status: StreamState::Disconnected,
                        shards: Vec::new(),
                    },
                };
                to_value(result)?
            }
            Command::DestroyExchange { exchange_id } => {
                let destroyed = self.destroy(exchange_id);
                to_value(DestroyedResult { destroyed })?
            }
        };
        Ok(result)
    }

    /// Stops every stream of the exchange and drops its client along with the
    /// cached catalog. Requests still holding the old client fail instead of
    /// starting new streams.
    pub fn destroy(&self, exchange_id: ExchangeId) -> bool {
        let removed = lock(&self.clients).remove(&exchange_id);
        if let Some(client) = &removed {
            client.destroy();
        }
        let stopped = self.candle_streams.stop_exchange(exchange_id);
        match removed {
            Some(_) => {
                info!(
                    "{} client destroyed, {} candle streams stopped",
                    exchange_id, stopped
                );
                true
            }
            None => false,
        }
    }

    /// Candle streams and ticker streams of every exchange.
    pub fn stop_all(&self) {
        let stopped = self.candle_streams.stop_all();
        let clients: Vec<Arc<ExchangeClient>> = lock(&self.clients).values().cloned().collect();
        for client in clients {
            client.stop_ticker_stream();
        }
        info!("all streams stopped ({} candle streams)", stopped);
    }

    pub fn shutdown(&self) {
        self.stop_all();
        lock(&self.clients).clear();
    }
}
