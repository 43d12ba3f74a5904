use crate::{
    shared::{
        batcher::BatchAggregator,
        connection::{run_ticker_shard, ShardContext, VenueAggregators},
        lock,
        pool::TickerPool,
        shards::partition_symbols,
    },
    structs::ConnectionSettings,
};
use common::{
    enums::{exchange_id::ExchangeId, stream_state::StreamState},
    structs::{EventEmitter, PoolKey, SymbolMapper},
    traits::{exchange::StreamProtocol, stream_controller::StreamController},
};
use log::info;
use std::sync::{Arc, Mutex};
use tickflow_error::TickflowError;
use tokio::{spawn, sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

struct ShardHandle {
    state: watch::Receiver<StreamState>,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct ControllerState {
    closed: bool,
    cancel: Option<CancellationToken>,
    shards: Vec<ShardHandle>,
    aggregators: Vec<BatchAggregator>,
}

/// Runs the sharded ticker connections of one exchange.
pub struct TickerStreamController<P: StreamProtocol> {
    exchange_id: ExchangeId,
    protocol: Arc<P>,
    settings: ConnectionSettings,
    pool: Arc<Mutex<TickerPool>>,
    emitter: EventEmitter,
    state: Arc<Mutex<ControllerState>>,
}

impl<P: StreamProtocol> TickerStreamController<P> {
    pub fn new(
        exchange_id: ExchangeId,
        protocol: Arc<P>,
        settings: ConnectionSettings,
        emitter: EventEmitter,
    ) -> Self {
        Self {
            exchange_id,
            protocol,
            settings,
            pool: Arc::new(Mutex::new(TickerPool::new())),
            emitter,
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    pub fn shard_states(&self) -> Vec<StreamState> {
        lock(&self.state)
            .shards
            .iter()
            .map(|shard| *shard.state.borrow())
            .collect()
    }

    pub fn shard_count(&self) -> usize {
        lock(&self.state).shards.len()
    }

    /// Stops the stream and refuses every later `start`.
    pub fn close(&self) {
        lock(&self.state).closed = true;
        self.stop();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

impl<P: StreamProtocol> StreamController for TickerStreamController<P> {
    fn start(&self, mapper: Arc<SymbolMapper>) -> Result<bool, TickflowError> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(TickflowError::new_client_destroyed(self.exchange_id.as_str()));
        }
        if state.cancel.is_some() {
            return Ok(false);
        }
        if mapper.is_empty() {
            return Err(TickflowError::new(
                String::from("No Markets"),
                format!("{} has no eligible markets to stream", self.exchange_id),
            ));
        }

        let aggregators: VenueAggregators = mapper
            .venues()
            .iter()
            .map(|venue| {
                let aggregator = BatchAggregator::new(
                    PoolKey::new(self.exchange_id, venue.clone()),
                    self.settings.batch_interval,
                    self.pool.clone(),
                    self.emitter.clone(),
                );
                (venue.clone(), aggregator)
            })
            .collect();
        let aggregators = Arc::new(aggregators);

        let partitions =
            partition_symbols(&mapper.native_ids(), self.settings.max_subs_per_connection);
        info!(
            "{} ticker stream starting: {} symbols over {} shards",
            self.exchange_id,
            mapper.len(),
            partitions.len()
        );

        let cancel = CancellationToken::new();
        for (shard_id, native_ids) in partitions.into_iter().enumerate() {
            let (state_sender, state_receiver) = watch::channel(StreamState::Connecting);
            let context = ShardContext {
                shard_id,
                exchange_id: self.exchange_id,
                protocol: self.protocol.clone(),
                native_ids,
                mapper: mapper.clone(),
                aggregators: aggregators.clone(),
                settings: self.settings.clone(),
                state: state_sender,
            };
            let task = spawn(run_ticker_shard(context, cancel.child_token()));
            state.shards.push(ShardHandle {
                state: state_receiver,
                task,
            });
        }
        state.aggregators = aggregators.values().cloned().collect();
        state.cancel = Some(cancel);
        Ok(true)
    }

    fn stop(&self) {
        let mut state = lock(&self.state);
        let Some(cancel) = state.cancel.take() else {
            return;
        };
        cancel.cancel();
        for shard in state.shards.drain(..) {
            shard.task.abort();
        }
        for aggregator in state.aggregators.drain(..) {
            aggregator.stop();
        }
        drop(state);

        lock(&self.pool).clear_exchange(self.exchange_id);
        info!("{} ticker stream stopped", self.exchange_id);
    }

    fn is_active(&self) -> bool {
        lock(&self.state).cancel.is_some()
    }

    fn status(&self) -> StreamState {
        StreamState::aggregate(&self.shard_states())
    }
}
