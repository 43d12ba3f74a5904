use super::{
    enums::OkxWsMessage,
    structs::{EventMessage, FundingRateData, Instrument, PushMessage, TickerData},
};
use crate::shared::deserializers::candle_from_row;
use common::{
    r#static::is_stablecoin_settle,
    structs::{CanonicalSymbol, MarketInfo, TickerUpdate},
    traits::exchange::WsFrame,
};
use phf::phf_map;
use serde_json::{from_str, from_value, Value};

/// Instruments announced but not yet trading still stream tickers.
pub const PRE_LISTING_EXCEPTION: &str = "preopen";

pub const PONG_FRAME: &str = "pong";

/// Base currency volume column in candle rows.
pub const CANDLE_VOLUME_INDEX: usize = 6;

pub static OKX_TIMEFRAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "1m" => "1m",
    "3m" => "3m",
    "5m" => "5m",
    "15m" => "15m",
    "30m" => "30m",
    "1h" => "1H",
    "2h" => "2H",
    "4h" => "4H",
    "6h" => "6Hutc",
    "12h" => "12Hutc",
    "1d" => "1Dutc",
    "3d" => "3Dutc",
    "1w" => "1Wutc",
    "1M" => "1Mutc",
};

pub fn is_linear_swap(instrument: &Instrument) -> bool {
    instrument.inst_type == "SWAP"
        && instrument.ct_type == "linear"
        && (instrument.state == "live" || instrument.state == PRE_LISTING_EXCEPTION)
        && is_stablecoin_settle(&instrument.settle_ccy)
}

/// `BTC-USDT-SWAP` / underlying `BTC-USDT` -> `BTC/USDT:USDT`.
pub fn market_from_instrument(instrument: &Instrument) -> Option<MarketInfo> {
    let mut parts = instrument.uly.split('-');
    let base = match instrument.ct_val_ccy.as_str() {
        "" => parts.next()?.to_string(),
        ct_val_ccy => {
            parts.next();
            ct_val_ccy.to_string()
        }
    };
    let quote = parts.next()?;
    let symbol = CanonicalSymbol::new(&base, quote, &instrument.settle_ccy);
    Some(MarketInfo {
        symbol: symbol.to_string(),
        id: instrument.inst_id.clone(),
        base: symbol.base,
        quote: symbol.quote,
        settle: symbol.settle,
        active: instrument.state == "live",
        tick_size: instrument.tick_sz,
        qty_step: instrument.lot_sz,
        min_qty: instrument.min_sz,
        max_qty: instrument.max_lmt_sz,
        contract_size: instrument.ct_val.unwrap_or(1.0),
        max_leverage: instrument.lever,
        venue: None,
    })
}

/// Quote volume from base volume, since OKX reports derivatives volume in base units.
pub fn quote_volume(ticker: &TickerData) -> Option<f64> {
    Some(ticker.vol_ccy_24h? * ticker.last?)
}

pub fn ticker_update_from_data(ticker: &TickerData) -> TickerUpdate {
    let mut update = TickerUpdate::new(&ticker.inst_id);
    update.last_price = ticker.last;
    update.bid = ticker.bid_px;
    update.ask = ticker.ask_px;
    update.open_24h = ticker.open_24h;
    update.volume_24h = quote_volume(ticker);
    update
}

pub fn parse_frame(text: &str) -> WsFrame {
    if text == PONG_FRAME {
        return WsFrame::Pong;
    }
    match from_str::<OkxWsMessage>(text) {
        Ok(OkxWsMessage::Event(event)) => frame_from_event(event),
        Ok(OkxWsMessage::Push(push)) => frame_from_push(push),
        Ok(OkxWsMessage::None) => WsFrame::Ignored,
        Err(error) => WsFrame::Malformed(error.to_string()),
    }
}

fn frame_from_event(event: EventMessage) -> WsFrame {
    match event.event.as_str() {
        "subscribe" => WsFrame::SubscribeAck,
        "error" => WsFrame::Error(format!(
            "{} {}",
            event.code.unwrap_or_default(),
            event.msg.unwrap_or_default()
        )),
        _ => WsFrame::Ignored,
    }
}

fn frame_from_push(push: PushMessage) -> WsFrame {
    let channel = push.arg.channel.as_str();
    match channel {
        "tickers" => match from_value::<Vec<TickerData>>(push.data) {
            Ok(tickers) => WsFrame::Tickers(tickers.iter().map(ticker_update_from_data).collect()),
            Err(error) => WsFrame::Malformed(error.to_string()),
        },
        "funding-rate" => match from_value::<Vec<FundingRateData>>(push.data) {
            Ok(rates) => WsFrame::Tickers(
                rates
                    .into_iter()
                    .map(|rate| {
                        let mut update = TickerUpdate::new(&rate.inst_id);
                        update.funding_rate = rate.funding_rate;
                        update.next_funding_time = rate.funding_time.filter(|time| *time > 0);
                        update
                    })
                    .collect(),
            ),
            Err(error) => WsFrame::Malformed(error.to_string()),
        },
        _ if channel.starts_with("candle") => match from_value::<Vec<Vec<Value>>>(push.data) {
            Ok(rows) => WsFrame::Candles(
                rows.iter()
                    .filter_map(|row| candle_from_row(row, CANDLE_VOLUME_INDEX))
                    .collect(),
            ),
            Err(error) => WsFrame::Malformed(error.to_string()),
        },
        _ => WsFrame::Ignored,
    }
}
