mod market_info;
pub use market_info::*;

mod ohlcv;
pub use ohlcv::*;

mod stream_event;
pub use stream_event::*;

mod symbol;
pub use symbol::*;

mod symbol_mapper;
pub use symbol_mapper::*;

mod ticker;
pub use ticker::*;
