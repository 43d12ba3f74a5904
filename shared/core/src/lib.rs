pub mod candle_streams;
pub mod enums;
pub mod events;
pub mod gateway;
pub mod rpc_client;
pub mod structs;
