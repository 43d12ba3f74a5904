use super::{
    enums::{IncomingWsMessage, MarketEvent},
    structs::{SymbolFilter, SymbolInfo},
};
use common::{
    r#static::is_stablecoin_settle,
    structs::{CanonicalSymbol, MarketInfo, Ohlcv, TickerUpdate},
    traits::exchange::WsFrame,
};
use phf::phf_map;
use serde_json::from_str;

pub static BINANCE_TIMEFRAMES: phf::Map<&'static str, &'static str> = phf_map! {
    "1m" => "1m",
    "3m" => "3m",
    "5m" => "5m",
    "15m" => "15m",
    "30m" => "30m",
    "1h" => "1h",
    "2h" => "2h",
    "4h" => "4h",
    "6h" => "6h",
    "8h" => "8h",
    "12h" => "12h",
    "1d" => "1d",
    "3d" => "3d",
    "1w" => "1w",
    "1M" => "1M",
};

pub fn is_linear_swap(info: &SymbolInfo) -> bool {
    info.contract_type == "PERPETUAL"
        && info.status == "TRADING"
        && is_stablecoin_settle(&info.margin_asset)
}

pub fn market_from_symbol_info(info: &SymbolInfo) -> MarketInfo {
    let symbol = CanonicalSymbol::new(&info.base_asset, &info.quote_asset, &info.margin_asset);
    let mut market = MarketInfo {
        symbol: symbol.to_string(),
        id: info.symbol.clone(),
        base: symbol.base,
        quote: symbol.quote,
        settle: symbol.settle,
        active: info.status == "TRADING",
        tick_size: None,
        qty_step: None,
        min_qty: None,
        max_qty: None,
        contract_size: 1.0,
        max_leverage: None,
        venue: None,
    };
    for filter in &info.filters {
        match filter {
            SymbolFilter::Price { tick_size } => market.tick_size = Some(*tick_size),
            SymbolFilter::LotSize {
                step_size,
                min_qty,
                max_qty,
            } => {
                market.qty_step = Some(*step_size);
                market.min_qty = Some(*min_qty);
                market.max_qty = Some(*max_qty);
            }
            SymbolFilter::Other => {}
        }
    }
    market
}

/// Stream names a symbol needs for a full ticker: last/24h, top of book and funding.
pub fn ticker_streams(native_id: &str) -> [String; 3] {
    let lower = native_id.to_lowercase();
    [
        format!("{}@ticker", lower),
        format!("{}@bookTicker", lower),
        format!("{}@markPrice@1s", lower),
    ]
}

pub fn parse_frame(text: &str) -> WsFrame {
    let message = match from_str::<IncomingWsMessage>(text) {
        Ok(message) => message,
        Err(error) => return WsFrame::Malformed(error.to_string()),
    };
    match message {
        IncomingWsMessage::Event(event) => frame_from_event(event),
        IncomingWsMessage::Error(error) => {
            WsFrame::Error(format!("{} {}", error.error.code, error.error.msg))
        }
        IncomingWsMessage::Response(_) => WsFrame::SubscribeAck,
        IncomingWsMessage::None => WsFrame::Ignored,
    }
}

fn frame_from_event(event: MarketEvent) -> WsFrame {
    match event {
        MarketEvent::Ticker(ticker) => {
            let mut update = TickerUpdate::new(&ticker.symbol);
            update.last_price = Some(ticker.last_price);
            update.open_24h = ticker.open;
            update.volume_24h = ticker.quote_volume;
            WsFrame::Tickers(vec![update])
        }
        MarketEvent::BookTicker(book) => {
            let mut update = TickerUpdate::new(&book.symbol);
            update.bid = book.bid;
            update.ask = book.ask;
            WsFrame::Tickers(vec![update])
        }
        MarketEvent::MarkPrice(mark) => {
            let mut update = TickerUpdate::new(&mark.symbol);
            update.funding_rate = mark.funding_rate;
            update.next_funding_time = mark.next_funding_time.filter(|time| *time > 0);
            WsFrame::Tickers(vec![update])
        }
        MarketEvent::Kline(kline) => {
            let kline = kline.kline;
            WsFrame::Candles(vec![Ohlcv {
                time: kline.start_time,
                open: kline.open,
                high: kline.high,
                low: kline.low,
                close: kline.close,
                volume: kline.volume,
            }])
        }
        MarketEvent::Unknown => WsFrame::Ignored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binance::structs::ExchangeInfoResponse;

    const EXCHANGE_INFO: &str = r#"{"symbols":[
        {"symbol":"BTCUSDT","contractType":"PERPETUAL","status":"TRADING","baseAsset":"BTC","quoteAsset":"USDT","marginAsset":"USDT",
         "filters":[{"filterType":"PRICE_FILTER","tickSize":"0.10","minPrice":"556.80"},
                    {"filterType":"LOT_SIZE","stepSize":"0.001","minQty":"0.001","maxQty":"1000"},
                    {"filterType":"MAX_NUM_ORDERS","limit":200}]},
        {"symbol":"BTCUSDT_250328","contractType":"CURRENT_QUARTER","status":"TRADING","baseAsset":"BTC","quoteAsset":"USDT","marginAsset":"USDT","filters":[]},
        {"symbol":"ETHBTC","contractType":"PERPETUAL","status":"TRADING","baseAsset":"ETH","quoteAsset":"BTC","marginAsset":"BTC","filters":[]},
        {"symbol":"OLDUSDT","contractType":"PERPETUAL","status":"SETTLING","baseAsset":"OLD","quoteAsset":"USDT","marginAsset":"USDT","filters":[]}
    ]}"#;

    #[test]
    fn test_only_trading_stablecoin_perpetuals_are_eligible() {
        let info: ExchangeInfoResponse = from_str(EXCHANGE_INFO).unwrap();
        let markets: Vec<MarketInfo> = info
            .symbols
            .iter()
            .filter(|info| is_linear_swap(info))
            .map(market_from_symbol_info)
            .collect();
        assert_eq!(markets.len(), 1);
        let btc = &markets[0];
        assert_eq!(btc.symbol, "BTC/USDT:USDT");
        assert_eq!(btc.id, "BTCUSDT");
        assert_eq!(btc.tick_size, Some(0.1));
        assert_eq!(btc.qty_step, Some(0.001));
        assert_eq!(btc.max_qty, Some(1000.0));
    }

    #[test]
    fn test_parse_ticker_frames() {
        let ticker = r#"{"e":"24hrTicker","E":1,"s":"BTCUSDT","c":"65000.5","o":"64000","q":"123456.7","h":"1","l":"1"}"#;
        let WsFrame::Tickers(updates) = parse_frame(ticker) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].native_id, "BTCUSDT");
        assert_eq!(updates[0].last_price, Some(65000.5));
        assert_eq!(updates[0].volume_24h, Some(123456.7));

        let book = r#"{"e":"bookTicker","u":1,"s":"BTCUSDT","b":"64999.9","B":"1","a":"65000.1","A":"2"}"#;
        let WsFrame::Tickers(updates) = parse_frame(book) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].bid, Some(64999.9));
        assert_eq!(updates[0].last_price, None);

        let mark = r#"{"e":"markPriceUpdate","E":1,"s":"BTCUSDT","p":"65000","r":"0.0001","T":1700006400000}"#;
        let WsFrame::Tickers(updates) = parse_frame(mark) else {
            panic!("expected tickers");
        };
        assert_eq!(updates[0].funding_rate, Some(0.0001));
        assert_eq!(updates[0].next_funding_time, Some(1_700_006_400_000));
        assert!(!updates[0].funding_time_estimated);
    }

    #[test]
    fn test_parse_control_frames() {
        assert_eq!(parse_frame(r#"{"result":null,"id":1}"#), WsFrame::SubscribeAck);
        assert_eq!(
            parse_frame(r#"{"error":{"code":2,"msg":"Invalid request"},"id":1}"#),
            WsFrame::Error(String::from("2 Invalid request"))
        );
        assert_eq!(parse_frame(r#"{"e":"aggTrade","s":"BTCUSDT"}"#), WsFrame::Ignored);
        assert!(matches!(parse_frame("not json"), WsFrame::Malformed(_)));

        let kline = r#"{"e":"kline","s":"BTCUSDT","k":{"t":1700000000000,"o":"1","h":"2","l":"0.5","c":"1.5","v":"10","x":false}}"#;
        let WsFrame::Candles(candles) = parse_frame(kline) else {
            panic!("expected candles");
        };
        assert_eq!(candles[0].time, 1_700_000_000_000);
        assert_eq!(candles[0].close, 1.5);
    }
}
