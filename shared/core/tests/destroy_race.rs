use common::enums::{exchange_id::ExchangeId, stream_state::StreamState};
use exchanges::config::EXCHANGES_CONFIGS;
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tickflow_core::{gateway::RpcGateway, structs::RpcRequest};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    spawn,
    sync::mpsc::unbounded_channel,
    time::sleep,
};

const EXCHANGE_INFO: &str = r#"{"symbols":[{"symbol":"BTCUSDT","contractType":"PERPETUAL","status":"TRADING","baseAsset":"BTC","quoteAsset":"USDT","marginAsset":"USDT","filters":[]}]}"#;

/// Serves the exchange info body to every request after `delay`.
async fn spawn_slow_http(delay: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            spawn(async move {
                let mut buffer = [0u8; 4096];
                if stream.read(&mut buffer).await.is_err() {
                    return;
                }
                sleep(delay).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    EXCHANGE_INFO.len(),
                    EXCHANGE_INFO
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    url
}

/// Counts socket accepts without ever completing a handshake.
async fn spawn_ws_counter() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = accepts.clone();
    spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(stream);
        }
    });
    (url, accepts)
}

async fn gateway() -> (Arc<RpcGateway>, Arc<AtomicUsize>) {
    let http = spawn_slow_http(Duration::from_millis(300)).await;
    let (ws, accepts) = spawn_ws_counter().await;
    let mut config = EXCHANGES_CONFIGS[&ExchangeId::Binance].clone();
    config.endpoints.http = http;
    config.endpoints.ws = ws.clone();
    config.endpoints.candle_ws = ws;
    config.proxy = None;

    let (emitter, _receiver) = unbounded_channel();
    let configs = HashMap::from([(ExchangeId::Binance, config)]);
    (Arc::new(RpcGateway::with_configs(emitter, configs)), accepts)
}

#[tokio::test]
async fn test_destroy_during_ticker_start_leaves_nothing_running() {
    let (gateway, accepts) = gateway().await;
    let client = gateway.client(ExchangeId::Binance).unwrap();

    let starter = gateway.clone();
    let start = spawn(async move {
        starter
            .handle(RpcRequest::new(
                "START_TICKER_STREAM",
                json!({"exchangeId": "binance"}),
                1,
            ))
            .await
    });

    sleep(Duration::from_millis(50)).await;
    let response = gateway
        .handle(RpcRequest::new(
            "DESTROY_EXCHANGE",
            json!({"exchangeId": "binance"}),
            2,
        ))
        .await;
    assert_eq!(response.result, Some(json!({"destroyed": true})));

    let response = start.await.unwrap();
    assert_eq!(response.request_id, 1);
    assert!(response.result.is_none());
    assert!(response.error.unwrap().starts_with("Client Destroyed"));

    sleep(Duration::from_millis(400)).await;
    assert_eq!(accepts.load(Ordering::SeqCst), 0);
    assert!(client.is_destroyed());
    assert!(client.shard_states().is_empty());
    assert_eq!(client.ticker_status(), StreamState::Disconnected);

    let response = gateway
        .handle(RpcRequest::new(
            "GET_STREAM_STATUS",
            json!({"exchangeId": "binance"}),
            3,
        ))
        .await;
    assert_eq!(
        response.result,
        Some(json!({"status": "disconnected", "shards": []}))
    );
}

#[tokio::test]
async fn test_destroy_during_candle_start_leaves_nothing_running() {
    let (gateway, _accepts) = gateway().await;
    gateway.client(ExchangeId::Binance).unwrap();

    let starter = gateway.clone();
    let start = spawn(async move {
        starter
            .handle(RpcRequest::new(
                "START_OHLCV_STREAM",
                json!({
                    "exchangeId": "binance",
                    "symbol": "BTC/USDT:USDT",
                    "timeframe": "1m",
                    "streamId": "btc-1m",
                }),
                1,
            ))
            .await
    });

    sleep(Duration::from_millis(50)).await;
    assert!(gateway.destroy(ExchangeId::Binance));

    let response = start.await.unwrap();
    assert_eq!(response.result, None::<Value>);
    assert!(response.error.unwrap().starts_with("Client Destroyed"));
    assert!(gateway.candle_streams().is_empty());
    assert!(!gateway.candle_streams().contains("btc-1m"));
}
