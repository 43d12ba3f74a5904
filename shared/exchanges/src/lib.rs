pub mod binance;
pub mod bybit;
pub mod candles;
pub mod client;
pub mod config;
pub mod controller;
pub mod enums;
pub mod hyperliquid;
pub mod okx;
pub mod shared;
pub mod structs;
