use common::{
    enums::exchange_id::ExchangeId,
    structs::{EventEmitter, StreamEvent},
};
use exchanges::{candles::CandleSource, shared::lock};
use log::{debug, info, warn};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{select, spawn, task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

struct CandleStreamHandle {
    exchange_id: ExchangeId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl CandleStreamHandle {
    fn stop(self) {
        self.cancel.cancel();
        self.task.abort();
    }
}

/// Registry of running OHLCV streams keyed by the host's stream id.
#[derive(Clone)]
pub struct CandleStreams {
    streams: Arc<Mutex<HashMap<String, CandleStreamHandle>>>,
    emitter: EventEmitter,
}

impl CandleStreams {
    pub fn new(emitter: EventEmitter) -> Self {
        Self {
            streams: Arc::new(Mutex::new(HashMap::new())),
            emitter,
        }
    }

    /// Starting an id that is already running replaces the old stream.
    pub fn start<S: CandleSource>(
        &self,
        stream_id: String,
        exchange_id: ExchangeId,
        source: S,
        retry_delay: Duration,
    ) {
        let cancel = CancellationToken::new();
        let task = spawn(run_candle_stream(
            stream_id.clone(),
            source,
            self.emitter.clone(),
            cancel.clone(),
            retry_delay,
        ));
        let handle = CandleStreamHandle {
            exchange_id,
            cancel,
            task,
        };
        info!("candle stream {} started on {}", stream_id, exchange_id);
        if let Some(previous) = lock(&self.streams).insert(stream_id, handle) {
            previous.stop();
        }
    }

    pub fn stop(&self, stream_id: &str) -> bool {
        match lock(&self.streams).remove(stream_id) {
            Some(handle) => {
                handle.stop();
                info!("candle stream {} stopped", stream_id);
                true
            }
            None => false,
        }
    }

    pub fn stop_exchange(&self, exchange_id: ExchangeId) -> usize {
        let mut streams = lock(&self.streams);
        let ids: Vec<String> = streams
            .iter()
            .filter(|(_, handle)| handle.exchange_id == exchange_id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &ids {
            if let Some(handle) = streams.remove(id) {
                handle.stop();
            }
        }
        ids.len()
    }

    pub fn stop_all(&self) -> usize {
        let drained: Vec<CandleStreamHandle> =
            lock(&self.streams).drain().map(|(_, handle)| handle).collect();
        let count = drained.len();
        drained.into_iter().for_each(CandleStreamHandle::stop);
        count
    }

    pub fn contains(&self, stream_id: &str) -> bool {
        lock(&self.streams).contains_key(stream_id)
    }

    pub fn len(&self) -> usize {
        lock(&self.streams).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Emits every candle update until cancelled. Failures wait `retry_delay`
/// before the next attempt; a failure observed after cancellation ends the
/// loop silently.
pub async fn run_candle_stream<S: CandleSource>(
    stream_id: String,
    mut source: S,
    emitter: EventEmitter,
    cancel: CancellationToken,
    retry_delay: Duration,
) {
    while !cancel.is_cancelled() {
        let result = select! {
            _ = cancel.cancelled() => break,
            result = source.next_candle() => result,
        };
        if cancel.is_cancelled() {
            break;
        }

        match result {
            Ok(candle) => {
                let event = StreamEvent::Candle {
                    stream_id: stream_id.clone(),
                    candle,
                };
                if emitter.send(event).is_err() {
                    debug!("candle stream {} has no receiver", stream_id);
                    break;
                }
            }
            Err(error) => {
                warn!(
                    "candle stream {} failed: {}; retrying in {:?}",
                    stream_id, error, retry_delay
                );
                select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(retry_delay) => {}
                }
            }
        }
    }
    debug!("candle stream {} loop ended", stream_id);
}
