use super::{lock, pool::TickerPool};
use common::structs::{EventEmitter, PoolKey, StreamEvent, TickerBatch, TickerSlot};
use log::{debug, trace};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{spawn, task::JoinHandle, time::sleep};

/// Last-value-wins staging area keyed by canonical symbol.
#[derive(Debug, Default)]
pub struct StagedUpdates {
    entries: HashMap<Arc<str>, TickerSlot>,
}

impl StagedUpdates {
    pub fn stage(&mut self, slot: &TickerSlot) {
        match self.entries.get_mut(&slot.symbol) {
            Some(staged) => staged.overwrite_from(slot),
            None => {
                self.entries.insert(slot.symbol.clone(), slot.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Copies every staged entry into the pool and clears the staging area.
    pub fn drain_into(&mut self, pool: &mut TickerPool, key: &PoolKey) -> Option<TickerBatch> {
        if self.entries.is_empty() {
            return None;
        }
        let len = self.entries.len();
        let array = pool.acquire(key, len);
        for (slot, staged) in array.slots_mut().iter_mut().zip(self.entries.values()) {
            slot.overwrite_from(staged);
        }
        self.entries.clear();
        Some(array.share(key.clone(), len))
    }
}

struct AggregatorState {
    key: PoolKey,
    interval: Duration,
    staged: StagedUpdates,
    pool: Arc<Mutex<TickerPool>>,
    emitter: EventEmitter,
    flush_timer: Option<JoinHandle<()>>,
    timer_epoch: u64,
    stopped: bool,
}

/// Coalesces ticker updates of one pool key and emits them at most once per
/// interval. The timer is armed by the first update after a flush, so an
/// idle stream never wakes up.
#[derive(Clone)]
pub struct BatchAggregator {
    state: Arc<Mutex<AggregatorState>>,
}

impl BatchAggregator {
    pub fn new(
        key: PoolKey,
        interval: Duration,
        pool: Arc<Mutex<TickerPool>>,
        emitter: EventEmitter,
    ) -> Self {
        let state = AggregatorState {
            key,
            interval,
            staged: StagedUpdates::default(),
            pool,
            emitter,
            flush_timer: None,
            timer_epoch: 0,
            stopped: false,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn record(&self, slot: &TickerSlot) {
        let mut state = lock(&self.state);
        if state.stopped {
            return;
        }
        state.staged.stage(slot);
        if state.flush_timer.is_none() {
            state.timer_epoch += 1;
            let epoch = state.timer_epoch;
            let aggregator = self.clone();
            let interval = state.interval;
            state.flush_timer = Some(spawn(async move {
                sleep(interval).await;
                aggregator.flush_due(epoch);
            }));
        }
    }

    /// Timer path: a timer superseded by a direct flush does nothing.
    fn flush_due(&self, epoch: u64) -> usize {
        let mut state = lock(&self.state);
        if state.timer_epoch != epoch || state.flush_timer.take().is_none() {
            return 0;
        }
        Self::emit_staged(&mut state)
    }

    /// Emits whatever is staged and cancels the pending timer. Returns the
    /// number of entries emitted.
    pub fn flush(&self) -> usize {
        let mut state = lock(&self.state);
        if let Some(timer) = state.flush_timer.take() {
            timer.abort();
        }
        Self::emit_staged(&mut state)
    }

    fn emit_staged(state: &mut AggregatorState) -> usize {
        if state.stopped {
            return 0;
        }

        let batch = {
            let mut pool = lock(&state.pool);
            state.staged.drain_into(&mut pool, &state.key)
        };
        let Some(batch) = batch else {
            trace!("{} flush skipped, nothing staged", state.key);
            return 0;
        };

        let len = batch.len;
        if state.emitter.send(StreamEvent::Tickers(batch)).is_err() {
            debug!("{} ticker batch dropped, receiver closed", state.key);
        }
        len
    }

    pub fn pending(&self) -> usize {
        lock(&self.state).staged.len()
    }

    pub fn stop(&self) {
        let mut state = lock(&self.state);
        state.stopped = true;
        if let Some(timer) = state.flush_timer.take() {
            timer.abort();
        }
        state.staged.clear();
    }
}
