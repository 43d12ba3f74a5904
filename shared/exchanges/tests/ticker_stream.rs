use common::{
    enums::{exchange_id::ExchangeId, stream_state::StreamState},
    structs::{MarketInfo, StreamEvent, SymbolMapper},
    traits::{
        exchange::{StreamProtocol, WsFrame},
        stream_controller::StreamController,
    },
};
use exchanges::{
    controller::TickerStreamController, shared::backoff::Backoff, structs::ConnectionSettings,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::{from_str, json, Value};
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tickflow_error::TickflowError;
use tokio::{
    net::TcpListener,
    spawn,
    sync::mpsc::unbounded_channel,
    time::{sleep, timeout},
};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use url::Url;

struct MockProtocol {
    url: String,
    ping: bool,
}

impl StreamProtocol for MockProtocol {
    fn get_ticker_ws_url(&self) -> Result<Url, TickflowError> {
        Ok(Url::parse(&self.url)?)
    }

    fn get_candle_ws_url(&self) -> Result<Url, TickflowError> {
        Ok(Url::parse(&self.url)?)
    }

    fn ticker_subscribe_messages(
        &self,
        native_ids: &[String],
    ) -> Result<Vec<Message>, TickflowError> {
        Ok(vec![Message::Text(json!({ "subscribe": native_ids }).to_string())])
    }

    fn candle_subscribe_message(
        &self,
        native_id: &str,
        _native_timeframe: &str,
    ) -> Result<Message, TickflowError> {
        Ok(Message::Text(json!({ "candle": native_id }).to_string()))
    }

    fn get_ws_ping_message(&self) -> Option<Message> {
        self.ping.then(|| Message::Text(String::from("ping")))
    }

    fn classify_frame(&self, text: &str) -> WsFrame {
        if text == "pong" {
            return WsFrame::Pong;
        }
        let Ok(value) = from_str::<Value>(text) else {
            return WsFrame::Malformed(text.to_string());
        };
        match (value["s"].as_str(), value["p"].as_f64()) {
            (Some(native_id), Some(price)) => {
                let mut update = common::structs::TickerUpdate::new(native_id);
                update.last_price = Some(price);
                WsFrame::Tickers(vec![update])
            }
            _ => WsFrame::Ignored,
        }
    }
}

#[derive(Default)]
struct ServerLog {
    connections: AtomicUsize,
    subscriptions: Mutex<Vec<Vec<String>>>,
}

/// Accepts any number of clients; answers the subscribe request with one
/// ticker per symbol and, if `answer_pings`, replies to text pings.
async fn spawn_server(answer_pings: bool) -> (String, Arc<ServerLog>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let log = Arc::new(ServerLog::default());
    let server_log = log.clone();

    spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let log = server_log.clone();
            spawn(async move {
                let Ok(mut wss) = accept_async(stream).await else {
                    return;
                };
                log.connections.fetch_add(1, Ordering::SeqCst);
                while let Some(Ok(message)) = wss.next().await {
                    let Message::Text(text) = message else {
                        continue;
                    };
                    if text == "ping" {
                        if answer_pings && wss.send(Message::Text(String::from("pong"))).await.is_err() {
                            return;
                        }
                        continue;
                    }
                    let Ok(request) = from_str::<Value>(&text) else {
                        continue;
                    };
                    let ids: Vec<String> = request["subscribe"]
                        .as_array()
                        .map(|ids| {
                            ids.iter()
                                .filter_map(|id| id.as_str().map(str::to_string))
                                .collect()
                        })
                        .unwrap_or_default();
                    log.subscriptions.lock().unwrap().push(ids.clone());
                    for id in &ids {
                        let frame = json!({ "s": id, "p": 100.0 }).to_string();
                        if wss.send(Message::Text(frame)).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });

    (url, log)
}

fn mapper(count: usize) -> Arc<SymbolMapper> {
    let markets: Vec<MarketInfo> = (0..count)
        .map(|i| MarketInfo {
            symbol: format!("S{}/USDT:USDT", i),
            id: format!("S{}", i),
            base: format!("S{}", i),
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
        })
        .collect();
    Arc::new(SymbolMapper::from_markets(&markets))
}

fn settings(ping_interval: Option<Duration>, pong_timeout: Duration) -> ConnectionSettings {
    ConnectionSettings {
        ping_interval,
        pong_timeout,
        backoff: Backoff::new(Duration::from_millis(50), Duration::from_millis(50), 0.2),
        max_subs_per_connection: 2,
        batch_interval: Duration::from_millis(50),
    }
}

async fn wait_until<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..150 {
        if condition() {
            return true;
        }
        sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_sharded_stream_emits_batches_and_stops() {
    let (url, log) = spawn_server(true).await;
    let (emitter, mut receiver) = unbounded_channel();
    let protocol = Arc::new(MockProtocol { url, ping: false });
    let controller = TickerStreamController::new(
        ExchangeId::Binance,
        protocol,
        settings(None, Duration::from_secs(10)),
        emitter,
    );

    assert!(controller.start(Arc::new(SymbolMapper::default())).is_err());
    assert!(controller.start(mapper(5)).unwrap());
    assert!(!controller.start(mapper(5)).unwrap());
    assert_eq!(controller.shard_count(), 3);

    assert!(wait_until(|| controller.status() == StreamState::Connected).await);
    assert!(wait_until(|| log.connections.load(Ordering::SeqCst) == 3).await);

    let mut seen = HashSet::new();
    while seen.len() < 5 {
        let event = timeout(Duration::from_secs(3), receiver.recv())
            .await
            .unwrap()
            .unwrap();
        let StreamEvent::Tickers(batch) = event else {
            panic!("expected ticker batch");
        };
        assert_eq!(batch.key.exchange_id, ExchangeId::Binance);
        assert!(batch.len <= 5);
        for slot in batch.slots() {
            assert_eq!(slot.last_price, 100.0);
            seen.insert(slot.symbol.to_string());
        }
    }
    assert!(seen.contains("S4/USDT:USDT"));

    let mut sizes: Vec<usize> = log.subscriptions.lock().unwrap().iter().map(Vec::len).collect();
    sizes.sort();
    assert_eq!(sizes, vec![1, 2, 2]);

    controller.stop();
    assert!(!controller.is_active());
    assert_eq!(controller.status(), StreamState::Disconnected);
    controller.stop();
    assert_eq!(controller.status(), StreamState::Disconnected);

    sleep(Duration::from_millis(150)).await;
    while let Ok(event) = receiver.try_recv() {
        assert!(matches!(event, StreamEvent::Tickers(_)));
    }
    sleep(Duration::from_millis(150)).await;
    assert!(receiver.try_recv().is_err());
}

#[tokio::test]
async fn test_missing_pong_forces_single_reconnect() {
    let (url, log) = spawn_server(false).await;
    let (emitter, _receiver) = unbounded_channel();
    let protocol = Arc::new(MockProtocol { url, ping: true });
    let controller = TickerStreamController::new(
        ExchangeId::Bybit,
        protocol,
        settings(Some(Duration::from_millis(100)), Duration::from_millis(300)),
        emitter,
    );

    assert!(controller.start(mapper(1)).unwrap());
    assert!(wait_until(|| log.connections.load(Ordering::SeqCst) == 1).await);

    // ping at 100ms, deadline at 400ms, reconnect after ~50ms
    sleep(Duration::from_millis(650)).await;
    assert_eq!(log.connections.load(Ordering::SeqCst), 2);

    controller.stop();
}

#[tokio::test]
async fn test_answered_pings_keep_connection() {
    let (url, log) = spawn_server(true).await;
    let (emitter, _receiver) = unbounded_channel();
    let protocol = Arc::new(MockProtocol { url, ping: true });
    let controller = TickerStreamController::new(
        ExchangeId::Okx,
        protocol,
        settings(Some(Duration::from_millis(100)), Duration::from_millis(300)),
        emitter,
    );

    assert!(controller.start(mapper(2)).unwrap());
    assert!(wait_until(|| controller.status() == StreamState::Connected).await);
    sleep(Duration::from_millis(800)).await;
    assert_eq!(log.connections.load(Ordering::SeqCst), 1);
    assert_eq!(controller.status(), StreamState::Connected);

    controller.stop();
}

#[tokio::test]
async fn test_shard_reports_connecting_after_backoff() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let accepts = Arc::new(AtomicUsize::new(0));
    let server_accepts = accepts.clone();
    spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            // first handshake fails, later ones never complete
            if server_accepts.fetch_add(1, Ordering::SeqCst) > 0 {
                held.push(stream);
            }
        }
    });

    let (emitter, _receiver) = unbounded_channel();
    let protocol = Arc::new(MockProtocol { url, ping: false });
    let mut settings = settings(None, Duration::from_secs(10));
    settings.backoff = Backoff::new(Duration::from_millis(300), Duration::from_millis(300), 0.0);
    let controller = TickerStreamController::new(ExchangeId::Bybit, protocol, settings, emitter);

    assert!(controller.start(mapper(1)).unwrap());
    assert!(wait_until(|| controller.shard_states() == vec![StreamState::Reconnecting]).await);
    assert!(wait_until(|| accepts.load(Ordering::SeqCst) == 2).await);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.shard_states(), vec![StreamState::Connecting]);

    controller.stop();
}
