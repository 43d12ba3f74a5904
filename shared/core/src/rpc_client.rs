use crate::structs::{RpcRequest, RpcResponse};
use common::constants::RPC_TIMEOUT_MS;
use exchanges::shared::lock;
use log::{debug, warn};
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tickflow_error::TickflowError;
use tokio::{
    spawn,
    sync::{mpsc::UnboundedSender, oneshot},
    task::JoinHandle,
    time::sleep,
};

type Responder = oneshot::Sender<Result<Value, TickflowError>>;

struct PendingRequest {
    responder: Responder,
    timeout: JoinHandle<()>,
}

/// Host side of the command channel. Correlates responses by request id
/// and fails any request that gets no answer within the timeout.
#[derive(Clone)]
pub struct RpcClient {
    next_request_id: Arc<AtomicU64>,
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    outbound: UnboundedSender<RpcRequest>,
    timeout: Duration,
}

impl RpcClient {
    pub fn new(outbound: UnboundedSender<RpcRequest>) -> Self {
        Self::with_timeout(outbound, Duration::from_millis(RPC_TIMEOUT_MS))
    }

    pub fn with_timeout(outbound: UnboundedSender<RpcRequest>, timeout: Duration) -> Self {
        Self {
            next_request_id: Arc::new(AtomicU64::new(1)),
            pending: Arc::new(Mutex::new(HashMap::new())),
            outbound,
            timeout,
        }
    }

    pub async fn call(&self, request_type: &str, payload: Value) -> Result<Value, TickflowError> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let (responder, receiver) = oneshot::channel();

        {
            let mut pending = lock(&self.pending);
            let timeout = spawn(expire(
                self.pending.clone(),
                request_id,
                request_type.to_string(),
                self.timeout,
            ));
            pending.insert(request_id, PendingRequest { responder, timeout });
        }

        let request = RpcRequest::new(request_type, payload, request_id);
        if self.outbound.send(request).is_err() {
            if let Some(entry) = lock(&self.pending).remove(&request_id) {
                entry.timeout.abort();
            }
            return Err(TickflowError::new_transport(String::from(
                "worker channel closed",
            )));
        }

        receiver.await.unwrap_or_else(|_| {
            Err(TickflowError::new_transport(format!(
                "request {} dropped",
                request_id
            )))
        })
    }

    /// Routes a response to its caller. Returns false for late or unknown
    /// responses, which are dropped.
    pub fn resolve(&self, response: RpcResponse) -> bool {
        let Some(entry) = lock(&self.pending).remove(&response.request_id) else {
            debug!("dropping response for unknown request {}", response.request_id);
            return false;
        };
        entry.timeout.abort();
        let _ = entry.responder.send(response.into_result());
        true
    }

    /// Fails every outstanding call, e.g. when the worker exits.
    pub fn reject_all(&self, reason: &str) -> usize {
        let drained: Vec<PendingRequest> =
            lock(&self.pending).drain().map(|(_, entry)| entry).collect();
        let count = drained.len();
        for entry in drained {
            entry.timeout.abort();
            let _ = entry
                .responder
                .send(Err(TickflowError::new_transport(reason.to_string())));
        }
        count
    }

    pub fn pending_len(&self) -> usize {
        lock(&self.pending).len()
    }
}

async fn expire(
    pending: Arc<Mutex<HashMap<u64, PendingRequest>>>,
    request_id: u64,
    request_type: String,
    timeout: Duration,
) {
    sleep(timeout).await;
    let Some(entry) = lock(&pending).remove(&request_id) else {
        return;
    };
    warn!("{} request {} timed out", request_type, request_id);
    let _ = entry.responder.send(Err(TickflowError::new_timeout(format!(
        "{} request {} got no response within {:?}",
        request_type, request_id, timeout
    ))));
}
