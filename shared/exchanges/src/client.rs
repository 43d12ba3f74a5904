use crate::{
    candles::CandleWatcher, controller::TickerStreamController,
    enums::ExchangeWrapper, structs::ExchangeConfig,
};
use common::{
    enums::{stream_state::StreamState, timeframe::Timeframe},
    functions::sort_candles,
    structs::{EventEmitter, MarketInfo, Ohlcv, SymbolMapper, TickerSnapshot},
    traits::{exchange::MarketDataExchange, stream_controller::StreamController},
};
use log::info;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
};
use tickflow_error::TickflowError;
use tokio::sync::Mutex as AsyncMutex;

/// Loaded catalog: markets sorted by symbol plus the mapper built from them.
#[derive(Debug)]
pub struct MarketCatalog {
    pub markets: Vec<MarketInfo>,
    pub mapper: Arc<SymbolMapper>,
}

impl MarketCatalog {
    pub fn new(mut markets: Vec<MarketInfo>) -> Self {
        markets.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        let mapper = Arc::new(SymbolMapper::from_markets(&markets));
        Self { markets, mapper }
    }
}

/// Per-exchange handle owned by the gateway: REST calls, the cached
/// catalog, the ticker stream and candle watchers.
pub struct ExchangeClient {
    config: ExchangeConfig,
    exchange: Arc<ExchangeWrapper>,
    catalog: RwLock<Option<Arc<MarketCatalog>>>,
    catalog_load: AsyncMutex<()>,
    tickers: TickerStreamController<ExchangeWrapper>,
    destroyed: AtomicBool,
}

impl ExchangeClient {
    pub fn with_config(config: ExchangeConfig, emitter: EventEmitter) -> Result<Self, TickflowError> {
        let exchange = Arc::new(ExchangeWrapper::new(&config)?);
        let tickers = TickerStreamController::new(
            config.exchange_id,
            exchange.clone(),
            config.connection.clone(),
            emitter,
        );
        Ok(Self {
            config,
            exchange,
            catalog: RwLock::new(None),
            catalog_load: AsyncMutex::new(()),
            tickers,
            destroyed: AtomicBool::new(false),
        })
    }

    pub fn get_config(&self) -> &ExchangeConfig {
        &self.config
    }

    fn cached_catalog(&self) -> Option<Arc<MarketCatalog>> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fetches the catalog once and serves it from cache afterwards, unless
    /// `reload` is set. Concurrent first loads share a single fetch.
    pub async fn load_markets(&self, reload: bool) -> Result<Arc<MarketCatalog>, TickflowError> {
        if !reload {
            if let Some(catalog) = self.cached_catalog() {
                return Ok(catalog);
            }
        }

        let _guard = self.catalog_load.lock().await;
        if !reload {
            if let Some(catalog) = self.cached_catalog() {
                return Ok(catalog);
            }
        }

        let markets = self.exchange.fetch_linear_swap_markets().await?;
        let catalog = Arc::new(MarketCatalog::new(markets));
        info!(
            "{} markets loaded: {} eligible linear swaps",
            self.config.exchange_id,
            catalog.markets.len()
        );
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Some(catalog.clone());
        Ok(catalog)
    }

    pub async fn fetch_tickers(&self) -> Result<HashMap<String, TickerSnapshot>, TickflowError> {
        let catalog = self.load_markets(false).await?;
        self.exchange.fetch_ticker_snapshots(&catalog.mapper).await
    }

    fn resolve(
        &self,
        catalog: &MarketCatalog,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<(String, &'static str), TickflowError> {
        let native_id = catalog.mapper.to_native(symbol).ok_or_else(|| {
            TickflowError::new_invalid_payload(format!(
                "{} has no market {}",
                self.config.exchange_id, symbol
            ))
        })?;
        let native_timeframe = self.exchange.get_native_timeframe(timeframe).ok_or_else(|| {
            TickflowError::new_invalid_payload(format!(
                "{} does not support timeframe {}",
                self.config.exchange_id, timeframe
            ))
        })?;
        Ok((native_id.to_string(), native_timeframe))
    }

    /// Ascending, duplicate free, at most `limit` candles (the most recent).
    pub async fn fetch_ohlcv(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: u32,
    ) -> Result<Vec<Ohlcv>, TickflowError> {
        let catalog = self.load_markets(false).await?;
        let (native_id, native_timeframe) = self.resolve(&catalog, symbol, timeframe)?;
        let mut candles = self
            .exchange
            .fetch_ohlcv(&native_id, native_timeframe, timeframe, limit)
            .await?;
        sort_candles(&mut candles);
        let limit = limit as usize;
        if candles.len() > limit {
            candles.drain(..candles.len() - limit);
        }
        Ok(candles)
    }

    fn ensure_alive(&self) -> Result<(), TickflowError> {
        if self.is_destroyed() {
            return Err(TickflowError::new_client_destroyed(
                self.config.exchange_id.as_str(),
            ));
        }
        Ok(())
    }

    pub async fn candle_watcher(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<CandleWatcher<ExchangeWrapper>, TickflowError> {
        let catalog = self.load_markets(false).await?;
        self.ensure_alive()?;
        let (native_id, native_timeframe) = self.resolve(&catalog, symbol, timeframe)?;
        Ok(CandleWatcher::new(
            self.exchange.clone(),
            native_id,
            native_timeframe,
            self.config.connection.clone(),
        ))
    }

    /// `Ok(false)` when the stream was already running. Fails once the
    /// client is destroyed, even if the catalog load was already in flight.
    pub async fn start_ticker_stream(&self) -> Result<bool, TickflowError> {
        self.ensure_alive()?;
        let catalog = self.load_markets(false).await?;
        self.tickers.start(catalog.mapper.clone())
    }

    pub fn stop_ticker_stream(&self) {
        self.tickers.stop();
    }

    /// Stops the ticker stream for good. Later starts fail.
    pub fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
        self.tickers.close();
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    pub fn ticker_status(&self) -> StreamState {
        self.tickers.status()
    }

    pub fn shard_states(&self) -> Vec<StreamState> {
        self.tickers.shard_states()
    }
}
