pub mod exchange;
pub mod stream_controller;
