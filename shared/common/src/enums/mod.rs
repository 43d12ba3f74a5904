pub mod exchange_id;
pub mod stream_state;
pub mod timeframe;
