use crate::{
    shared::backoff::Backoff,
    structs::{ApiEndpoints, ConnectionSettings, ExchangeConfig, ProxyConfig},
};
use common::{
    constants::{CANDLE_RETRY_DELAY_MS, DEFAULT_BATCH_INTERVAL_MS, PONG_TIMEOUT_MS},
    enums::exchange_id::ExchangeId,
};
use dotenv::dotenv;
use std::{collections::HashMap, env::var, sync::LazyLock, time::Duration};

fn env_or(name: &str, default: &str) -> String {
    var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_millis(name: &str, default: u64) -> Duration {
    let millis = var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default);
    Duration::from_millis(millis)
}

fn endpoints_from_env(exchange_id: ExchangeId, http: &str, ws: &str, candle_ws: &str) -> ApiEndpoints {
    let prefix = exchange_id.env_prefix();
    ApiEndpoints {
        http: env_or(&format!("{}_HTTP_URL", prefix), http),
        ws: env_or(&format!("{}_WS_URL", prefix), ws),
        candle_ws: env_or(&format!("{}_CANDLE_WS_URL", prefix), candle_ws),
    }
}

fn proxy_from_env() -> Option<ProxyConfig> {
    let url = var("TICKFLOW_PROXY_URL")
        .ok()
        .filter(|value| !value.trim().is_empty())?;
    let auth_header = var("TICKFLOW_PROXY_AUTH")
        .ok()
        .filter(|value| !value.trim().is_empty());
    Some(ProxyConfig { url, auth_header })
}

fn venues_from_env(name: &str) -> Vec<String> {
    var(name)
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|venue| !venue.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub static EXCHANGES_CONFIGS: LazyLock<HashMap<ExchangeId, ExchangeConfig>> =
    LazyLock::new(|| {
        dotenv().ok();
        let batch_interval = env_millis("TICKFLOW_BATCH_INTERVAL_MS", DEFAULT_BATCH_INTERVAL_MS);
        let pong_timeout = Duration::from_millis(PONG_TIMEOUT_MS);
        let candle_retry_delay = Duration::from_millis(CANDLE_RETRY_DELAY_MS);
        let proxy = proxy_from_env();
        let mut configs = HashMap::new();

        {
            let exchange_id = ExchangeId::Binance;
            let config = ExchangeConfig {
                exchange_id,
                endpoints: endpoints_from_env(
                    exchange_id,
                    "https://fapi.binance.com",
                    "wss://fstream.binance.com/ws",
                    "wss://fstream.binance.com/ws",
                ),
                proxy: proxy.clone(),
                connection: ConnectionSettings {
                    // server-initiated pings only
                    ping_interval: None,
                    pong_timeout,
                    backoff: Backoff::default(),
                    max_subs_per_connection: 200,
                    batch_interval,
                },
                candle_retry_delay,
                venues: vec![],
            };
            configs.insert(exchange_id, config);
        }

        {
            let exchange_id = ExchangeId::Bybit;
            let config = ExchangeConfig {
                exchange_id,
                endpoints: endpoints_from_env(
                    exchange_id,
                    "https://api.bybit.com",
                    "wss://stream.bybit.com/v5/public/linear",
                    "wss://stream.bybit.com/v5/public/linear",
                ),
                proxy: proxy.clone(),
                connection: ConnectionSettings {
                    ping_interval: Some(Duration::from_secs(20)),
                    pong_timeout,
                    backoff: Backoff::default(),
                    max_subs_per_connection: 200,
                    batch_interval,
                },
                candle_retry_delay,
                venues: vec![],
            };
            configs.insert(exchange_id, config);
        }

        {
            let exchange_id = ExchangeId::Okx;
            let config = ExchangeConfig {
                exchange_id,
                endpoints: endpoints_from_env(
                    exchange_id,
                    "https://www.okx.com",
                    "wss://ws.okx.com:8443/ws/v5/public",
                    "wss://ws.okx.com:8443/ws/v5/business",
                ),
                proxy: proxy.clone(),
                connection: ConnectionSettings {
                    ping_interval: Some(Duration::from_secs(20)),
                    pong_timeout,
                    backoff: Backoff::default(),
                    max_subs_per_connection: 150,
                    batch_interval,
                },
                candle_retry_delay,
                venues: vec![],
            };
            configs.insert(exchange_id, config);
        }

        {
            let exchange_id = ExchangeId::Hyperliquid;
            let config = ExchangeConfig {
                exchange_id,
                endpoints: endpoints_from_env(
                    exchange_id,
                    "https://api.hyperliquid.xyz",
                    "wss://api.hyperliquid.xyz/ws",
                    "wss://api.hyperliquid.xyz/ws",
                ),
                proxy,
                connection: ConnectionSettings {
                    ping_interval: Some(Duration::from_secs(30)),
                    pong_timeout,
                    backoff: Backoff::default(),
                    max_subs_per_connection: 100,
                    batch_interval,
                },
                candle_retry_delay,
                venues: venues_from_env("HYPERLIQUID_DEXES"),
            };
            configs.insert(exchange_id, config);
        }

        configs
    });
