use crate::{constants::MILLIS_IN_HOUR, structs::Ohlcv};
use chrono::Utc;

// gives current timestamp in milliseconds
#[inline]
pub fn current_timestamp_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Start of the hour following `timestamp_ms`. A timestamp exactly on the
/// hour yields the next one.
pub fn next_hour_start_ms(timestamp_ms: i64) -> i64 {
    timestamp_ms - timestamp_ms.rem_euclid(MILLIS_IN_HOUR) + MILLIS_IN_HOUR
}

#[inline]
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

/// Sorts candles ascending by open time, keeping the last occurrence of a
/// duplicated time.
pub fn sort_candles(candles: &mut Vec<Ohlcv>) {
    candles.sort_by_key(|candle| candle.time);
    candles.dedup_by(|next, previous| {
        if next.time == previous.time {
            *previous = next.clone();
            true
        } else {
            false
        }
    });
}

/// Splits `items` into chunks of at most `size` elements; a zero size yields
/// a single chunk.
pub fn chunk_by<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return vec![items.to_vec()];
    }
    items.chunks(size).map(|chunk| chunk.to_vec()).collect()
}
