use crate::structs::{ExchangePayload, OhlcvPayload, OhlcvStreamPayload, StreamIdPayload};
use common::{
    constants::DEFAULT_OHLCV_LIMIT,
    enums::{exchange_id::ExchangeId, timeframe::Timeframe},
};
use serde::de::DeserializeOwned;
use serde_json::{from_value, Value};
use tickflow_error::TickflowError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FetchMarkets {
        exchange_id: ExchangeId,
    },
    ReloadMarkets {
        exchange_id: ExchangeId,
    },
    FetchTickers {
        exchange_id: ExchangeId,
    },
    FetchOhlcv {
        exchange_id: ExchangeId,
        symbol: String,
        timeframe: Timeframe,
        limit: u32,
    },
    StartOhlcvStream {
        exchange_id: ExchangeId,
        symbol: String,
        timeframe: Timeframe,
        stream_id: String,
    },
    StopStream {
        stream_id: String,
    },
    StopAllStreams,
    StartTickerStream {
        exchange_id: ExchangeId,
    },
    StopTickerStream {
        exchange_id: ExchangeId,
    },
    GetStreamStatus {
        exchange_id: ExchangeId,
    },
    DestroyExchange {
        exchange_id: ExchangeId,
    },
}

fn parse_payload<T: DeserializeOwned>(request_type: &str, payload: Value) -> Result<T, TickflowError> {
    from_value(payload).map_err(|error| {
        TickflowError::new_invalid_payload(format!("{} payload: {}", request_type, error))
    })
}

fn parse_exchange_id(request_type: &str, payload: Value) -> Result<ExchangeId, TickflowError> {
    let parsed: ExchangePayload = parse_payload(request_type, payload)?;
    parsed.exchange_id.parse()
}

impl Command {
    pub fn parse(request_type: &str, payload: Value) -> Result<Self, TickflowError> {
        let command = match request_type {
            "FETCH_MARKETS" => Self::FetchMarkets {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            "RELOAD_MARKETS" => Self::ReloadMarkets {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            "FETCH_TICKERS" => Self::FetchTickers {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            "FETCH_OHLCV" => {
                let parsed: OhlcvPayload = parse_payload(request_type, payload)?;
                Self::FetchOhlcv {
                    exchange_id: parsed.exchange_id.parse()?,
                    symbol: parsed.symbol,
                    timeframe: parsed.timeframe.parse()?,
                    limit: parsed
                        .limit
                        .filter(|limit| *limit > 0)
                        .unwrap_or(DEFAULT_OHLCV_LIMIT),
                }
            }
            "START_OHLCV_STREAM" => {
                let parsed: OhlcvStreamPayload = parse_payload(request_type, payload)?;
                Self::StartOhlcvStream {
                    exchange_id: parsed.exchange_id.parse()?,
                    symbol: parsed.symbol,
                    timeframe: parsed.timeframe.parse()?,
                    stream_id: parsed.stream_id,
                }
            }
            "STOP_STREAM" => {
                let parsed: StreamIdPayload = parse_payload(request_type, payload)?;
                Self::StopStream {
                    stream_id: parsed.stream_id,
                }
            }
            "STOP_ALL_STREAMS" => Self::StopAllStreams,
            "START_TICKER_STREAM" => Self::StartTickerStream {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            "STOP_TICKER_STREAM" => Self::StopTickerStream {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            "GET_STREAM_STATUS" => Self::GetStreamStatus {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            "DESTROY_EXCHANGE" => Self::DestroyExchange {
                exchange_id: parse_exchange_id(request_type, payload)?,
            },
            unknown => return Err(TickflowError::new_unknown_command(unknown)),
        };
        Ok(command)
    }
}
