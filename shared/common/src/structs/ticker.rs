use crate::functions::is_valid_price;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Partial ticker fields decoded from one exchange frame. Fields an exchange
/// did not send in that frame stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickerUpdate {
    pub native_id: String,
    pub last_price: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub open_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub funding_rate: Option<f64>,
    pub next_funding_time: Option<i64>,
    pub funding_time_estimated: bool,
}

impl TickerUpdate {
    pub fn new(native_id: &str) -> Self {
        Self {
            native_id: native_id.to_string(),
            ..Default::default()
        }
    }
}

/// Pooled ticker record handed to the host. Slots are overwritten in place
/// between flushes; see `exchanges::shared::pool`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TickerSlot {
    pub symbol: Arc<str>,
    pub last_price: f64,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub open_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub funding_rate: Option<f64>,
    pub next_funding_time: Option<i64>,
    pub funding_time_estimated: bool,
}

fn merge(target: &mut Option<f64>, value: Option<f64>) {
    if let Some(value) = value.filter(|v| v.is_finite()) {
        *target = Some(value);
    }
}

impl TickerSlot {
    pub fn new(symbol: Arc<str>) -> Self {
        Self {
            symbol,
            ..Default::default()
        }
    }

    /// Merges `update` into this slot. Returns false, leaving the slot
    /// untouched, when the update carries a non-finite or non-positive last
    /// price.
    pub fn apply(&mut self, update: &TickerUpdate) -> bool {
        if let Some(last_price) = update.last_price {
            if !is_valid_price(last_price) {
                return false;
            }
            self.last_price = last_price;
        }
        merge(&mut self.bid, update.bid);
        merge(&mut self.ask, update.ask);
        merge(&mut self.open_24h, update.open_24h);
        merge(&mut self.volume_24h, update.volume_24h);
        merge(&mut self.funding_rate, update.funding_rate);
        if let Some(next_funding_time) = update.next_funding_time {
            self.next_funding_time = Some(next_funding_time);
            self.funding_time_estimated = update.funding_time_estimated;
        }
        true
    }

    /// A slot without a valid last price is never emitted.
    pub fn is_publishable(&self) -> bool {
        is_valid_price(self.last_price)
    }

    /// Copies `source` into this slot without allocating.
    pub fn overwrite_from(&mut self, source: &TickerSlot) {
        if !Arc::ptr_eq(&self.symbol, &source.symbol) {
            self.symbol = source.symbol.clone();
        }
        self.last_price = source.last_price;
        self.bid = source.bid;
        self.ask = source.ask;
        self.open_24h = source.open_24h;
        self.volume_24h = source.volume_24h;
        self.funding_rate = source.funding_rate;
        self.next_funding_time = source.next_funding_time;
        self.funding_time_estimated = source.funding_time_estimated;
    }
}

/// FETCH_TICKERS entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerSnapshot {
    pub last_price: f64,
    pub price_24h: Option<f64>,
    pub volume_24h: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_merges_partial_updates() {
        let mut slot = TickerSlot::new(Arc::from("BTC/USDT:USDT"));
        let mut book = TickerUpdate::new("BTCUSDT");
        book.bid = Some(99.5);
        book.ask = Some(100.5);
        assert!(slot.apply(&book));
        assert!(!slot.is_publishable());

        let mut ticker = TickerUpdate::new("BTCUSDT");
        ticker.last_price = Some(100.0);
        ticker.volume_24h = Some(f64::NAN);
        assert!(slot.apply(&ticker));
        assert!(slot.is_publishable());
        assert_eq!(slot.bid, Some(99.5));
        assert_eq!(slot.volume_24h, None);
    }

    #[test]
    fn test_apply_rejects_poisoned_last_price() {
        let mut slot = TickerSlot::new(Arc::from("BTC/USDT:USDT"));
        let mut update = TickerUpdate::new("BTCUSDT");
        update.last_price = Some(100.0);
        assert!(slot.apply(&update));

        for poisoned in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let mut bad = TickerUpdate::new("BTCUSDT");
            bad.last_price = Some(poisoned);
            bad.bid = Some(1.0);
            assert!(!slot.apply(&bad));
        }
        assert_eq!(slot.last_price, 100.0);
        assert_eq!(slot.bid, None);
    }
}
