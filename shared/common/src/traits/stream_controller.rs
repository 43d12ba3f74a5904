use crate::{enums::stream_state::StreamState, structs::SymbolMapper};
use std::sync::Arc;
use tickflow_error::TickflowError;

/// Lifecycle of one exchange's streaming engine.
pub trait StreamController {
    /// Opens the shard set for every symbol in `mapper`. Returns `Ok(false)`
    /// when the controller was already running.
    fn start(&self, mapper: Arc<SymbolMapper>) -> Result<bool, TickflowError>;
    /// Terminal and idempotent.
    fn stop(&self);
    fn is_active(&self) -> bool;
    fn status(&self) -> StreamState;
}
