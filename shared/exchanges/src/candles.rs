use crate::{
    shared::{
        connection::{open_socket, WsStream},
        heartbeat::{heartbeat_interval, next_heartbeat, sleep_until_deadline, PongMonitor},
    },
    structs::ConnectionSettings,
};
use common::{
    structs::Ohlcv,
    traits::exchange::{StreamProtocol, WsFrame},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, trace};
use std::{future::Future, sync::Arc};
use tickflow_error::TickflowError;
use tokio::{select, time::Interval};
use tokio_tungstenite::tungstenite::Message;

/// Anything that yields candle updates one at a time.
pub trait CandleSource: Send + 'static {
    fn next_candle(&mut self) -> impl Future<Output = Result<Ohlcv, TickflowError>> + Send;
}

/// Single-symbol candle subscription.
///
/// Connects lazily on the first `next` call. Any failure drops the socket,
/// so the following call reconnects and resubscribes.
pub struct CandleWatcher<P: StreamProtocol> {
    protocol: Arc<P>,
    native_id: String,
    native_timeframe: &'static str,
    settings: ConnectionSettings,
    socket: Option<WsStream>,
    heartbeat: Option<Interval>,
    monitor: PongMonitor,
}

impl<P: StreamProtocol> CandleWatcher<P> {
    pub fn new(
        protocol: Arc<P>,
        native_id: String,
        native_timeframe: &'static str,
        settings: ConnectionSettings,
    ) -> Self {
        let monitor = PongMonitor::new(settings.pong_timeout);
        Self {
            protocol,
            native_id,
            native_timeframe,
            settings,
            socket: None,
            heartbeat: None,
            monitor,
        }
    }

    /// Waits for the latest candle update.
    pub async fn next(&mut self) -> Result<Ohlcv, TickflowError> {
        if self.socket.is_none() {
            self.connect().await?;
        }
        let result = self.read_candle().await;
        if result.is_err() {
            self.socket = None;
            self.heartbeat = None;
        }
        result
    }

    async fn connect(&mut self) -> Result<(), TickflowError> {
        let url = self.protocol.get_candle_ws_url()?;
        let mut wss = open_socket(url.as_str()).await?;
        let subscribe = self
            .protocol
            .candle_subscribe_message(&self.native_id, self.native_timeframe)?;
        wss.send(subscribe).await?;
        debug!("candle stream {} {} subscribed", self.native_id, self.native_timeframe);

        self.heartbeat = match self.protocol.get_ws_ping_message() {
            Some(_) => heartbeat_interval(self.settings.ping_interval),
            None => None,
        };
        self.monitor.pong_received();
        self.socket = Some(wss);
        Ok(())
    }

    async fn read_candle(&mut self) -> Result<Ohlcv, TickflowError> {
        let Some(wss) = self.socket.as_mut() else {
            return Err(TickflowError::new_transport(String::from(
                "candle socket not connected",
            )));
        };

        loop {
            select! {
                frame = wss.next() => {
                    let message = match frame {
                        None => return Err(TickflowError::new_transport(String::from("candle stream ended"))),
                        Some(message) => message?,
                    };
                    match message {
                        Message::Text(text) => match self.protocol.classify_frame(&text) {
                            WsFrame::Candles(candles) => {
                                if let Some(latest) = candles.into_iter().max_by_key(|candle| candle.time) {
                                    return Ok(latest);
                                }
                            }
                            WsFrame::Pong => self.monitor.pong_received(),
                            WsFrame::Error(reason) => return Err(TickflowError::new_protocol(reason)),
                            WsFrame::Malformed(error) => trace!("candle stream malformed frame: {}", error),
                            _ => {}
                        },
                        Message::Ping(payload) => wss.send(Message::Pong(payload)).await?,
                        Message::Close(frame) => {
                            return Err(TickflowError::new_transport(format!("closed by server {:?}", frame)));
                        }
                        _ => {}
                    }
                }
                _ = next_heartbeat(&mut self.heartbeat) => {
                    if let Some(ping) = self.protocol.get_ws_ping_message() {
                        wss.send(ping).await?;
                        self.monitor.ping_sent();
                    }
                }
                _ = sleep_until_deadline(self.monitor.deadline()) => {
                    return Err(TickflowError::new_transport(String::from("candle stream pong timeout")));
                }
            }
        }
    }
}

impl<P: StreamProtocol> CandleSource for CandleWatcher<P> {
    async fn next_candle(&mut self) -> Result<Ohlcv, TickflowError> {
        self.next().await
    }
}
