pub const DEFAULT_BATCH_INTERVAL_MS: u64 = 200;
pub const RPC_TIMEOUT_MS: u64 = 30_000;
pub const PONG_TIMEOUT_MS: u64 = 10_000;
pub const CANDLE_RETRY_DELAY_MS: u64 = 5_000;

pub const BACKOFF_BASE_MS: u64 = 1_000;
pub const BACKOFF_MAX_MS: u64 = 30_000;
pub const BACKOFF_JITTER: f64 = 0.2;

pub const DEFAULT_OHLCV_LIMIT: u32 = 500;
pub const MILLIS_IN_SECOND: i64 = 1_000;
pub const MILLIS_IN_MINUTE: i64 = 60 * MILLIS_IN_SECOND;
pub const MILLIS_IN_HOUR: i64 = 60 * MILLIS_IN_MINUTE;
