use super::{Ohlcv, TickerSlot};
use crate::enums::exchange_id::ExchangeId;
use std::{
    fmt::{Display, Formatter, Result as FormatterResult},
    sync::Arc,
};
use tokio::sync::mpsc::UnboundedSender;

/// Identifies one object pool: an exchange, or one venue of an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub exchange_id: ExchangeId,
    pub venue: Option<Arc<str>>,
}

impl PoolKey {
    pub fn new(exchange_id: ExchangeId, venue: Option<Arc<str>>) -> Self {
        Self { exchange_id, venue }
    }
}

impl Display for PoolKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatterResult {
        match &self.venue {
            Some(venue) => write!(f, "{}:{}", self.exchange_id, venue),
            None => write!(f, "{}", self.exchange_id),
        }
    }
}

/// One flushed batch. `slots` is the pooled array itself; only the first
/// `len` entries belong to this batch.
#[derive(Debug, Clone)]
pub struct TickerBatch {
    pub key: PoolKey,
    pub generation: u64,
    pub slots: Arc<Vec<TickerSlot>>,
    pub len: usize,
}

impl TickerBatch {
    pub fn slots(&self) -> &[TickerSlot] {
        &self.slots[..self.len]
    }
}

#[derive(Debug, Clone)]
pub enum StreamEvent {
    Tickers(TickerBatch),
    Candle { stream_id: String, candle: Ohlcv },
}

pub type EventEmitter = UnboundedSender<StreamEvent>;
