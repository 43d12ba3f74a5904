extern crate dotenv;

use common::structs::StreamEvent;
use dotenv::dotenv;
use log::{debug, error, info, warn};
use serde_json::to_string;
use std::{sync::Arc, time::Duration};
use tickflow_core::{
    events::{encode_event, encode_ready},
    gateway::RpcGateway,
    structs::{RpcRequest, RpcResponse},
};
use tickflow_error::TickflowError;
use tokio::{
    io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader},
    spawn,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    time::timeout,
};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Single writer so response and event lines never interleave.
async fn write_lines(mut lines: UnboundedReceiver<String>) -> Result<(), TickflowError> {
    let mut out = stdout();
    while let Some(mut line) = lines.recv().await {
        line.push('\n');
        out.write_all(line.as_bytes()).await?;
        out.flush().await?;
    }
    Ok(())
}

async fn forward_events(mut events: UnboundedReceiver<StreamEvent>, lines: UnboundedSender<String>) {
    while let Some(event) = events.recv().await {
        match encode_event(&event) {
            Ok(line) => {
                if lines.send(line).is_err() {
                    break;
                }
            }
            Err(error) => error!("failed to encode event: {}", error),
        }
    }
}

fn send_response(response: &RpcResponse, lines: &UnboundedSender<String>) {
    match to_string(response) {
        Ok(line) => {
            let _ = lines.send(line);
        }
        Err(error) => error!("failed to encode response {}: {}", response.request_id, error),
    }
}

fn dispatch(gateway: Arc<RpcGateway>, line: &str, lines: UnboundedSender<String>) {
    let request = match RpcRequest::parse_line(line) {
        Ok(request) => request,
        Err((Some(request_id), error)) => {
            warn!("rejecting malformed request {}: {}", request_id, error);
            send_response(&RpcResponse::rejected(request_id, &error), &lines);
            return;
        }
        Err((None, error)) => {
            warn!("dropping malformed request {}: {}", line, error);
            return;
        }
    };
    debug!("{} request {}", request.request_type, request.request_id);

    spawn(async move {
        let response = gateway.handle(request).await;
        send_response(&response, &lines);
    });
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), TickflowError> {
    env_logger::init();
    dotenv().ok();

    let (emitter, events) = unbounded_channel();
    let (lines, outbound) = unbounded_channel();
    let writer = spawn(write_lines(outbound));
    spawn(forward_events(events, lines.clone()));

    let gateway = Arc::new(RpcGateway::new(emitter));
    let _ = lines.send(encode_ready()?);
    info!("worker ready");

    let mut input = BufReader::new(stdin()).lines();
    while let Some(line) = input.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        dispatch(gateway.clone(), line, lines.clone());
    }

    info!("stdin closed, shutting down");
    gateway.shutdown();
    drop(lines);
    drop(gateway);
    if timeout(SHUTDOWN_GRACE, writer).await.is_err() {
        warn!("pending output dropped on exit");
    }
    Ok(())
}
