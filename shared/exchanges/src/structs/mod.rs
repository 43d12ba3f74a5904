use crate::shared::backoff::Backoff;
use common::enums::exchange_id::ExchangeId;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub http: String,
    pub ws: String,
    pub candle_ws: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub url: String,
    /// Sent as `Proxy-Authorization`.
    pub auth_header: Option<String>,
}

/// Everything a shard connection needs besides the protocol itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionSettings {
    pub ping_interval: Option<Duration>,
    pub pong_timeout: Duration,
    pub backoff: Backoff,
    pub max_subs_per_connection: usize,
    pub batch_interval: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeConfig {
    pub exchange_id: ExchangeId,
    pub endpoints: ApiEndpoints,
    pub proxy: Option<ProxyConfig>,
    pub connection: ConnectionSettings,
    pub candle_retry_delay: Duration,
    /// Extra venues sharing this exchange's endpoints, each with its own pool.
    pub venues: Vec<String>,
}
