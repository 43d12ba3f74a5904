use super::{
    enums::BybitWsMessage,
    structs::{InstrumentInfo, KlineData, OpWsMessage, TickerData, TopicWsMessage},
};
use common::{
    r#static::is_stablecoin_settle,
    structs::{CanonicalSymbol, MarketInfo, Ohlcv, TickerUpdate},
    traits::exchange::WsFrame,
};
use phf::phf_map;
use serde_json::{from_str, from_value};

pub static BYBIT_TIMEFRAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "1m" => "1",
    "3m" => "3",
    "5m" => "5",
    "15m" => "15",
    "30m" => "30",
    "1h" => "60",
    "2h" => "120",
    "4h" => "240",
    "6h" => "360",
    "12h" => "720",
    "1d" => "D",
    "1w" => "W",
    "1M" => "M",
};

pub fn is_linear_swap(instrument: &InstrumentInfo) -> bool {
    instrument.contract_type == "LinearPerpetual"
        && instrument.status == "Trading"
        && is_stablecoin_settle(&instrument.settle_coin)
}

pub fn market_from_instrument(instrument: &InstrumentInfo) -> MarketInfo {
    let symbol = CanonicalSymbol::new(
        &instrument.base_coin,
        &instrument.quote_coin,
        &instrument.settle_coin,
    );
    MarketInfo {
        symbol: symbol.to_string(),
        id: instrument.symbol.clone(),
        base: symbol.base,
        quote: symbol.quote,
        settle: symbol.settle,
        active: instrument.status == "Trading",
        tick_size: instrument.price_filter.tick_size,
        qty_step: instrument.lot_size_filter.qty_step,
        min_qty: instrument.lot_size_filter.min_order_qty,
        max_qty: instrument.lot_size_filter.max_order_qty,
        contract_size: 1.0,
        max_leverage: instrument.leverage_filter.max_leverage,
        venue: None,
    }
}

pub fn ticker_update_from_data(data: &TickerData) -> TickerUpdate {
    let mut update = TickerUpdate::new(&data.symbol);
    update.last_price = data.last_price;
    update.bid = data.bid_price;
    update.ask = data.ask_price;
    update.open_24h = data.prev_price_24h;
    update.volume_24h = data.turnover_24h;
    update.funding_rate = data.funding_rate;
    update.next_funding_time = data.next_funding_time.filter(|time| *time > 0);
    update
}

pub fn parse_frame(text: &str) -> WsFrame {
    match from_str::<BybitWsMessage>(text) {
        Ok(BybitWsMessage::Op(message)) => frame_from_op(message),
        Ok(BybitWsMessage::Topic(message)) => frame_from_topic(message),
        Ok(BybitWsMessage::None) => WsFrame::Ignored,
        Err(error) => WsFrame::Malformed(error.to_string()),
    }
}

fn frame_from_op(message: OpWsMessage) -> WsFrame {
    if message.success == Some(false) {
        return WsFrame::Error(format!("{} failed: {}", message.op, message.ret_msg));
    }
    match message.op.as_str() {
        "ping" | "pong" => WsFrame::Pong,
        "subscribe" => WsFrame::SubscribeAck,
        _ => WsFrame::Ignored,
    }
}

fn frame_from_topic(message: TopicWsMessage) -> WsFrame {
    if message.topic.starts_with("tickers.") {
        return match from_value::<TickerData>(message.data) {
            Ok(data) => WsFrame::Tickers(vec![ticker_update_from_data(&data)]),
            Err(error) => WsFrame::Malformed(error.to_string()),
        };
    }
    if message.topic.starts_with("kline.") {
        return match from_value::<Vec<KlineData>>(message.data) {
            Ok(klines) => WsFrame::Candles(
                klines
                    .into_iter()
                    .map(|kline| Ohlcv {
                        time: kline.start,
                        open: kline.open,
                        high: kline.high,
                        low: kline.low,
                        close: kline.close,
                        volume: kline.volume,
                    })
                    .collect(),
            ),
            Err(error) => WsFrame::Malformed(error.to_string()),
        };
    }
    WsFrame::Ignored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bybit::structs::{BybitHttpResponseWrapper, HttpResultList};

    #[test]
    fn test_instrument_eligibility() {
        let response = r#"{"retCode":0,"retMsg":"OK","result":{"category":"linear","nextPageCursor":"abc","list":[
            {"symbol":"BTCUSDT","contractType":"LinearPerpetual","status":"Trading","baseCoin":"BTC","quoteCoin":"USDT","settleCoin":"USDT",
             "priceFilter":{"tickSize":"0.10"},"lotSizeFilter":{"qtyStep":"0.001","minOrderQty":"0.001","maxOrderQty":"190"},"leverageFilter":{"maxLeverage":"100.00"}},
            {"symbol":"BTC-27DEC24","contractType":"LinearFutures","status":"Trading","baseCoin":"BTC","quoteCoin":"USDC","settleCoin":"USDC",
             "priceFilter":{"tickSize":"0.5"},"lotSizeFilter":{},"leverageFilter":{}},
            {"symbol":"NEWUSDT","contractType":"LinearPerpetual","status":"PreLaunch","baseCoin":"NEW","quoteCoin":"USDT","settleCoin":"USDT",
             "priceFilter":{},"lotSizeFilter":{},"leverageFilter":{}}
        ]},"retExtInfo":{},"time":1}"#;
        let parsed: BybitHttpResponseWrapper<HttpResultList<InstrumentInfo>> =
            from_str(response).unwrap();
        let list = parsed.result.unwrap();
        assert_eq!(list.next_page_cursor.as_deref(), Some("abc"));
        let markets: Vec<MarketInfo> = list
            .list
            .iter()
            .filter(|instrument| is_linear_swap(instrument))
            .map(market_from_instrument)
            .collect();
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].symbol, "BTC/USDT:USDT");
        assert_eq!(markets[0].max_leverage, Some(100.0));
    }

    #[test]
    fn test_snapshot_then_delta() {
        let snapshot = r#"{"topic":"tickers.BTCUSDT","type":"snapshot","data":{"symbol":"BTCUSDT","lastPrice":"65000","bid1Price":"64999","ask1Price":"65001","prevPrice24h":"64000","turnover24h":"1000000","fundingRate":"0.0001","nextFundingTime":"1700006400000"},"cs":1,"ts":1}"#;
        let WsFrame::Tickers(updates) = parse_frame(snapshot) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].last_price, Some(65000.0));
        assert_eq!(updates[0].next_funding_time, Some(1_700_006_400_000));

        let delta = r#"{"topic":"tickers.BTCUSDT","type":"delta","data":{"symbol":"BTCUSDT","bid1Price":"65010"},"cs":2,"ts":2}"#;
        let WsFrame::Tickers(updates) = parse_frame(delta) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].bid, Some(65010.0));
        assert_eq!(updates[0].last_price, None);
    }

    #[test]
    fn test_control_frames() {
        assert_eq!(
            parse_frame(r#"{"success":true,"ret_msg":"pong","conn_id":"x","req_id":"1","op":"ping"}"#),
            WsFrame::Pong
        );
        assert_eq!(
            parse_frame(r#"{"success":true,"ret_msg":"","conn_id":"x","op":"subscribe"}"#),
            WsFrame::SubscribeAck
        );
        assert!(matches!(
            parse_frame(r#"{"success":false,"ret_msg":"error:handler not found","conn_id":"x","op":"subscribe"}"#),
            WsFrame::Error(_)
        ));

        let kline = r#"{"topic":"kline.1.BTCUSDT","type":"snapshot","ts":1,"data":[{"start":1700000000000,"end":1700000059999,"interval":"1","open":"1","close":"1.5","high":"2","low":"0.5","volume":"10","turnover":"15","confirm":false,"timestamp":1}]}"#;
        let WsFrame::Candles(candles) = parse_frame(kline) else {
            panic!("expected candles");
        };
        assert_eq!(candles[0].high, 2.0);
    }
}
