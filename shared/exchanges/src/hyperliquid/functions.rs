use super::{
    enums::WsChannel,
    structs::{ActiveAssetCtxData, AssetCtx, BboData, CandleData, PerpAsset, PerpMeta, WsMessage},
};
use common::{
    functions::{current_timestamp_ms, next_hour_start_ms},
    r#static::is_stablecoin_settle,
    structs::{CanonicalSymbol, MarketInfo, Ohlcv, TickerUpdate},
    traits::exchange::WsFrame,
};
use phf::phf_map;
use serde_json::{from_str, from_value, Value};

pub const HYPERLIQUID_SETTLE: &str = "USDC";

/// USDC is token 0 in the spot token list.
const USDC_TOKEN_INDEX: u32 = 0;

/// Perp prices carry at most this many decimals, minus the size decimals.
const MAX_PERP_DECIMALS: i32 = 6;

pub static HYPERLIQUID_TIMEFRAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "1m" => "1m",
    "3m" => "3m",
    "5m" => "5m",
    "15m" => "15m",
    "30m" => "30m",
    "1h" => "1h",
    "2h" => "2h",
    "4h" => "4h",
    "8h" => "8h",
    "12h" => "12h",
    "1d" => "1d",
    "3d" => "3d",
    "1w" => "1w",
    "1M" => "1M",
};

/// Settle asset of a perp dex, `None` when it margins in anything but USDC.
pub fn dex_settle(meta: &PerpMeta) -> Option<&'static str> {
    match meta.collateral_token.unwrap_or(USDC_TOKEN_INDEX) {
        USDC_TOKEN_INDEX => Some(HYPERLIQUID_SETTLE),
        _ => None,
    }
}

pub fn is_linear_swap(asset: &PerpAsset, meta: &PerpMeta) -> bool {
    !asset.is_delisted && dex_settle(meta).is_some_and(is_stablecoin_settle)
}

/// Assets of a builder dex are addressed as `dex:NAME`.
pub fn native_asset_name(asset: &PerpAsset, venue: Option<&str>) -> String {
    match venue {
        Some(dex) if !asset.name.contains(':') => format!("{}:{}", dex, asset.name),
        _ => asset.name.clone(),
    }
}

pub fn market_from_asset(asset: &PerpAsset, venue: Option<&str>) -> MarketInfo {
    let native_id = native_asset_name(asset, venue);
    let base = native_id.replace(':', "-");
    let symbol = CanonicalSymbol::new(&base, HYPERLIQUID_SETTLE, HYPERLIQUID_SETTLE);
    let price_decimals = (MAX_PERP_DECIMALS - asset.sz_decimals as i32).max(0);
    MarketInfo {
        symbol: symbol.to_string(),
        id: native_id,
        base: symbol.base,
        quote: symbol.quote,
        settle: symbol.settle,
        active: !asset.is_delisted,
        tick_size: Some(10f64.powi(-price_decimals)),
        qty_step: Some(10f64.powi(-(asset.sz_decimals as i32))),
        min_qty: None,
        max_qty: None,
        contract_size: 1.0,
        max_leverage: asset.max_leverage,
        venue: venue.map(str::to_string),
    }
}

/// Funding settles hourly; the next settlement time is synthesized.
pub fn ticker_update_from_ctx(coin: &str, ctx: &AssetCtx, now_ms: i64) -> TickerUpdate {
    let mut update = TickerUpdate::new(coin);
    update.last_price = ctx.last_price();
    update.open_24h = ctx.prev_day_px;
    update.volume_24h = ctx.day_ntl_vlm;
    update.funding_rate = ctx.funding;
    if ctx.funding.is_some() {
        update.next_funding_time = Some(next_hour_start_ms(now_ms));
        update.funding_time_estimated = true;
    }
    update
}

pub fn parse_frame(text: &str) -> WsFrame {
    let message = match from_str::<WsMessage>(text) {
        Ok(message) => message,
        Err(error) => return WsFrame::Malformed(error.to_string()),
    };
    let channel = match from_value::<WsChannel>(Value::String(message.channel)) {
        Ok(channel) => channel,
        Err(error) => return WsFrame::Malformed(error.to_string()),
    };

    match channel {
        WsChannel::ActiveAssetCtx => match from_value::<ActiveAssetCtxData>(message.data) {
            Ok(data) => WsFrame::Tickers(vec![ticker_update_from_ctx(
                &data.coin,
                &data.ctx,
                current_timestamp_ms(),
            )]),
            Err(error) => WsFrame::Malformed(error.to_string()),
        },
        WsChannel::Bbo => match from_value::<BboData>(message.data) {
            Ok(data) => {
                let mut update = TickerUpdate::new(&data.coin);
                let mut sides = data.bbo.into_iter();
                update.bid = sides.next().flatten().map(|level| level.px);
                update.ask = sides.next().flatten().map(|level| level.px);
                WsFrame::Tickers(vec![update])
            }
            Err(error) => WsFrame::Malformed(error.to_string()),
        },
        WsChannel::Candle => match from_value::<CandleData>(message.data) {
            Ok(candle) => WsFrame::Candles(vec![candle_from_data(&candle)]),
            Err(error) => WsFrame::Malformed(error.to_string()),
        },
        WsChannel::Pong => WsFrame::Pong,
        WsChannel::SubscriptionResponse => WsFrame::SubscribeAck,
        WsChannel::Error => WsFrame::Error(match message.data {
            Value::String(reason) => reason,
            other => other.to_string(),
        }),
        WsChannel::Other => WsFrame::Ignored,
    }
}

pub fn candle_from_data(candle: &CandleData) -> Ohlcv {
    Ohlcv {
        time: candle.t,
        open: candle.o,
        high: candle.h,
        low: candle.l,
        close: candle.c,
        volume: candle.v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperliquid::structs::MetaAndAssetCtxs;
    use common::constants::MILLIS_IN_HOUR;

    #[test]
    fn test_markets_from_meta() {
        let response = r#"[{"universe":[
            {"name":"BTC","szDecimals":5,"maxLeverage":40},
            {"name":"OLD","szDecimals":0,"maxLeverage":3,"isDelisted":true}
        ]},[
            {"funding":"0.0000125","openInterest":"1","prevDayPx":"64000","dayNtlVlm":"1000000","premium":"0","oraclePx":"65000","markPx":"65001","midPx":"65000.5","impactPxs":["65000","65001"]},
            {"funding":"0","openInterest":"0","prevDayPx":"1","dayNtlVlm":"0","premium":null,"oraclePx":"1","markPx":"1","midPx":null,"impactPxs":null}
        ]]"#;
        let (meta, ctxs): MetaAndAssetCtxs = from_str(response).unwrap();
        let markets: Vec<MarketInfo> = meta
            .universe
            .iter()
            .filter(|asset| is_linear_swap(asset, &meta))
            .map(|asset| market_from_asset(asset, None))
            .collect();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].symbol, "BTC/USDC:USDC");
        assert_eq!(markets[0].id, "BTC");
        assert_eq!(markets[0].tick_size, Some(0.1));
        assert_eq!(ctxs[0].last_price(), Some(65000.5));
        assert_eq!(ctxs[1].last_price(), Some(1.0));
    }

    #[test]
    fn test_dex_collateral_must_be_usdc() {
        let usdc: PerpMeta =
            from_str(r#"{"universe":[{"name":"TSLA","szDecimals":2}],"collateralToken":0}"#)
                .unwrap();
        let usdh: PerpMeta =
            from_str(r#"{"universe":[{"name":"TSLA","szDecimals":2}],"collateralToken":360}"#)
                .unwrap();
        assert_eq!(dex_settle(&usdc), Some("USDC"));
        assert_eq!(dex_settle(&usdh), None);
        assert!(is_linear_swap(&usdc.universe[0], &usdc));
        assert!(!is_linear_swap(&usdh.universe[0], &usdh));
    }

    #[test]
    fn test_dex_assets_carry_venue() {
        let asset = PerpAsset {
            name: String::from("TSLA"),
            sz_decimals: 2,
            max_leverage: Some(10.0),
            is_delisted: false,
        };
        let market = market_from_asset(&asset, Some("xyz"));
        assert_eq!(market.id, "xyz:TSLA");
        assert_eq!(market.symbol, "XYZ-TSLA/USDC:USDC");
        assert_eq!(market.venue.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_funding_time_is_estimated_next_hour() {
        let ctx = AssetCtx {
            funding: Some(0.0001),
            prev_day_px: None,
            day_ntl_vlm: None,
            mark_px: Some(10.0),
            mid_px: None,
        };
        let now = 5 * MILLIS_IN_HOUR + 1_234;
        let update = ticker_update_from_ctx("BTC", &ctx, now);
        assert_eq!(update.next_funding_time, Some(6 * MILLIS_IN_HOUR));
        assert!(update.funding_time_estimated);
        assert_eq!(update.last_price, Some(10.0));
    }

    #[test]
    fn test_frames() {
        let bbo = r#"{"channel":"bbo","data":{"coin":"BTC","time":1,"bbo":[{"px":"64999","sz":"1","n":2},null]}}"#;
        let WsFrame::Tickers(updates) = parse_frame(bbo) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].bid, Some(64999.0));
        assert_eq!(updates[0].ask, None);

        let ctx = r#"{"channel":"activeAssetCtx","data":{"coin":"ETH","ctx":{"funding":"0.00001","prevDayPx":"3000","dayNtlVlm":"5000","markPx":"3100","midPx":"3100.5"}}}"#;
        let WsFrame::Tickers(updates) = parse_frame(ctx) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].native_id, "ETH");
        assert_eq!(updates[0].volume_24h, Some(5000.0));

        assert_eq!(parse_frame(r#"{"channel":"pong"}"#), WsFrame::Pong);
        assert_eq!(
            parse_frame(r#"{"channel":"subscriptionResponse","data":{"method":"subscribe"}}"#),
            WsFrame::SubscribeAck
        );
        assert_eq!(
            parse_frame(r#"{"channel":"error","data":"Invalid subscription"}"#),
            WsFrame::Error(String::from("Invalid subscription"))
        );
        let candle = r#"{"channel":"candle","data":{"t":1700000000000,"T":1700000059999,"s":"BTC","i":"1m","o":"1","c":"1.5","h":"2","l":"0.5","v":"10","n":3}}"#;
        let WsFrame::Candles(candles) = parse_frame(candle) else {
            panic!("expected candles");
        };
        assert_eq!(candles[0].close, 1.5);
    }
}
