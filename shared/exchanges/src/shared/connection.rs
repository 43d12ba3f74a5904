use super::{
    batcher::BatchAggregator,
    heartbeat::{heartbeat_interval, next_heartbeat, sleep_until_deadline, PongMonitor},
};
use crate::structs::ConnectionSettings;
use common::{
    enums::{exchange_id::ExchangeId, stream_state::StreamState},
    structs::{SymbolMapper, TickerSlot, TickerUpdate},
    traits::exchange::{StreamProtocol, WsFrame},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, trace, warn};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tickflow_error::TickflowError;
use tokio::{net::TcpStream, select, sync::watch, time::{sleep, timeout}};
use tokio_tungstenite::{
    connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub type VenueAggregators = HashMap<Option<Arc<str>>, BatchAggregator>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// How a connected session ended.
#[derive(Debug, PartialEq)]
pub enum SessionEnd {
    Cancelled,
    PongTimeout,
    Closed(String),
}

/// Everything one ticker shard owns.
pub struct ShardContext<P: StreamProtocol> {
    pub shard_id: usize,
    pub exchange_id: ExchangeId,
    pub protocol: Arc<P>,
    pub native_ids: Vec<String>,
    pub mapper: Arc<SymbolMapper>,
    pub aggregators: Arc<VenueAggregators>,
    pub settings: ConnectionSettings,
    pub state: watch::Sender<StreamState>,
}

pub async fn open_socket(url: &str) -> Result<WsStream, TickflowError> {
    let (wss, _) = connect_async(url).await?;
    Ok(wss)
}

pub async fn close_socket(mut wss: WsStream) {
    if timeout(CLOSE_TIMEOUT, wss.close(None)).await.is_err() {
        trace!("websocket close handshake timed out");
    }
}

/// Maps decoded updates to canonical symbols, merges them into the shard's
/// per-symbol state and stages publishable results. Returns how many
/// entries were staged.
pub fn stage_ticker_updates(
    updates: &[TickerUpdate],
    mapper: &SymbolMapper,
    states: &mut HashMap<Arc<str>, TickerSlot>,
    aggregators: &VenueAggregators,
) -> usize {
    let mut staged = 0;
    for update in updates {
        let Some(mapped) = mapper.to_canonical(&update.native_id) else {
            continue;
        };
        let slot = states
            .entry(mapped.symbol.clone())
            .or_insert_with(|| TickerSlot::new(mapped.symbol.clone()));
        if !slot.apply(update) {
            debug!("{} skipped invalid last price {:?}", mapped.symbol, update.last_price);
            continue;
        }
        if !slot.is_publishable() {
            continue;
        }
        if let Some(aggregator) = aggregators.get(&mapped.venue) {
            aggregator.record(slot);
            staged += 1;
        }
    }
    staged
}

/// Runs one shard until cancelled: connect, subscribe, read, and on any
/// failure wait out the backoff and start over.
pub async fn run_ticker_shard<P: StreamProtocol>(context: ShardContext<P>, cancel: CancellationToken) {
    let mut attempt: u32 = 0;
    let mut states: HashMap<Arc<str>, TickerSlot> = HashMap::new();
    let label = format!("{} shard {}", context.exchange_id, context.shard_id);

    loop {
        context.state.send_replace(StreamState::Connecting);

        let connected = select! {
            _ = cancel.cancelled() => break,
            result = connect_and_subscribe(&context) => result,
        };

        let end = match connected {
            Ok(wss) => {
                attempt = 0;
                context.state.send_replace(StreamState::Connected);
                info!("{} connected with {} symbols", label, context.native_ids.len());
                run_session(&context, wss, &mut states, &cancel).await
            }
            Err(error) => SessionEnd::Closed(error.to_string()),
        };

        match end {
            SessionEnd::Cancelled => break,
            SessionEnd::PongTimeout => warn!("{} pong timeout, reconnecting", label),
            SessionEnd::Closed(reason) => warn!("{} disconnected: {}", label, reason),
        }

        let delay = context.settings.backoff.delay(attempt);
        attempt = attempt.saturating_add(1);
        context.state.send_replace(StreamState::Reconnecting);
        debug!("{} retrying in {:?} (attempt {})", label, delay, attempt);
        select! {
            _ = cancel.cancelled() => break,
            _ = sleep(delay) => {}
        }
    }

    context.state.send_replace(StreamState::Disconnected);
    debug!("{} stopped", label);
}

async fn connect_and_subscribe<P: StreamProtocol>(
    context: &ShardContext<P>,
) -> Result<WsStream, TickflowError> {
    let url = context.protocol.get_ticker_ws_url()?;
    let mut wss = open_socket(url.as_str()).await?;
    for message in context.protocol.ticker_subscribe_messages(&context.native_ids)? {
        wss.send(message).await?;
    }
    Ok(wss)
}

async fn run_session<P: StreamProtocol>(
    context: &ShardContext<P>,
    mut wss: WsStream,
    states: &mut HashMap<Arc<str>, TickerSlot>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let mut heartbeat = match context.protocol.get_ws_ping_message() {
        Some(_) => heartbeat_interval(context.settings.ping_interval),
        None => None,
    };
    let mut monitor = PongMonitor::new(context.settings.pong_timeout);

    loop {
        select! {
            _ = cancel.cancelled() => {
                close_socket(wss).await;
                return SessionEnd::Cancelled;
            }
            frame = wss.next() => {
                let message = match frame {
                    None => return SessionEnd::Closed(String::from("stream ended")),
                    Some(Err(error)) => return SessionEnd::Closed(error.to_string()),
                    Some(Ok(message)) => message,
                };
                match message {
                    Message::Text(text) => handle_text(context, &text, states, &mut monitor),
                    Message::Ping(payload) => {
                        if let Err(error) = wss.send(Message::Pong(payload)).await {
                            return SessionEnd::Closed(error.to_string());
                        }
                    }
                    Message::Close(frame) => {
                        return SessionEnd::Closed(format!("closed by server {:?}", frame));
                    }
                    _ => {}
                }
            }
            _ = next_heartbeat(&mut heartbeat) => {
                if let Some(ping) = context.protocol.get_ws_ping_message() {
                    if let Err(error) = wss.send(ping).await {
                        return SessionEnd::Closed(error.to_string());
                    }
                    monitor.ping_sent();
                }
            }
            _ = sleep_until_deadline(monitor.deadline()) => {
                return SessionEnd::PongTimeout;
            }
        }
    }
}

fn handle_text<P: StreamProtocol>(
    context: &ShardContext<P>,
    text: &str,
    states: &mut HashMap<Arc<str>, TickerSlot>,
    monitor: &mut PongMonitor,
) {
    match context.protocol.classify_frame(text) {
        WsFrame::Tickers(updates) => {
            stage_ticker_updates(&updates, &context.mapper, states, &context.aggregators);
        }
        WsFrame::Pong => monitor.pong_received(),
        WsFrame::SubscribeAck => trace!("{} subscription acknowledged", context.exchange_id),
        WsFrame::Error(reason) => warn!("{} rejected request: {}", context.exchange_id, reason),
        WsFrame::Malformed(error) => debug!("{} malformed frame: {}", context.exchange_id, error),
        WsFrame::Candles(_) | WsFrame::Ignored => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::pool::TickerPool;
    use common::structs::{MarketInfo, PoolKey, StreamEvent};
    use std::sync::Mutex;
    use tokio::sync::mpsc::unbounded_channel;

    fn market(symbol: &str, id: &str) -> MarketInfo {
        MarketInfo {
            symbol: symbol.to_string(),
            id: id.to_string(),
            base: String::new(),
            quote: String::from("USDT"),
            settle: String::from("USDT"),
            active: true,
            tick_size: None,
            qty_step: None,
            min_qty: None,
            max_qty: None,
            contract_size: 1.0,
            max_leverage: None,
            venue: None,
        }
    }

    fn update(native_id: &str, last_price: Option<f64>, bid: Option<f64>) -> TickerUpdate {
        let mut update = TickerUpdate::new(native_id);
        update.last_price = last_price;
        update.bid = bid;
        update
    }

    #[tokio::test(start_paused = true)]
    async fn test_stage_ticker_updates() {
        let mapper = SymbolMapper::from_markets(&[
            market("BTC/USDT:USDT", "BTCUSDT"),
            market("ETH/USDT:USDT", "ETHUSDT"),
        ]);
        let (emitter, mut receiver) = unbounded_channel();
        let aggregator = BatchAggregator::new(
            PoolKey::new(ExchangeId::Binance, None),
            Duration::from_millis(200),
            Arc::new(Mutex::new(TickerPool::new())),
            emitter,
        );
        let aggregators: VenueAggregators = HashMap::from([(None, aggregator.clone())]);
        let mut states = HashMap::new();

        let updates = vec![
            // not yet publishable: no last price
            update("ETHUSDT", None, Some(10.0)),
            // unknown native id
            update("XRPUSDT", Some(1.0), None),
            update("BTCUSDT", Some(100.0), None),
            update("BTCUSDT", Some(f64::NAN), Some(1.0)),
        ];
        assert_eq!(stage_ticker_updates(&updates, &mapper, &mut states, &aggregators), 1);
        assert_eq!(states.len(), 2);

        let later = vec![update("ETHUSDT", Some(11.0), None)];
        assert_eq!(stage_ticker_updates(&later, &mapper, &mut states, &aggregators), 1);
        assert_eq!(aggregator.flush(), 2);

        let Ok(StreamEvent::Tickers(batch)) = receiver.try_recv() else {
            panic!("expected ticker batch");
        };
        let eth = batch
            .slots()
            .iter()
            .find(|slot| &*slot.symbol == "ETH/USDT:USDT")
            .unwrap();
        assert_eq!(eth.bid, Some(10.0));
        let btc = batch
            .slots()
            .iter()
            .find(|slot| &*slot.symbol == "BTC/USDT:USDT")
            .unwrap();
        assert_eq!(btc.bid, None);
    }
}
