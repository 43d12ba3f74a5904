use common::structs::Ohlcv;
use serde::{
    de::{self, Visitor},
    Deserializer,
};
use serde_json::Value;
use std::fmt::{self, Formatter};

struct FlexibleF64Visitor;

impl<'de> Visitor<'de> for FlexibleF64Visitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
        formatter.write_str("a number or a numeric string")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(Some(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Some(value as f64))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Some(value as f64))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(None);
        }
        value.parse::<f64>().map(Some).map_err(de::Error::custom)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(FlexibleF64Visitor)
    }
}

/// Accepts `"1.5"`, `1.5` or `1`.
pub fn parse_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer
        .deserialize_any(FlexibleF64Visitor)?
        .ok_or_else(|| de::Error::custom("missing numeric value"))
}

/// Empty strings and nulls become `None`. Pair with `#[serde(default)]`.
pub fn parse_f64_option<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(FlexibleF64Visitor)
}

pub fn parse_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_f64(deserializer)? as i64)
}

pub fn parse_i64_option<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_f64_option(deserializer)?.map(|value| value as i64))
}

pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(string) => string.trim().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn value_to_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| number.as_f64().map(|n| n as i64)),
        Value::String(string) => string.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Reads `[open_time, open, high, low, close, ...]` rows; `volume_index` points at the base volume.
pub fn candle_from_row(row: &[Value], volume_index: usize) -> Option<Ohlcv> {
    Some(Ohlcv {
        time: value_to_i64(row.first()?)?,
        open: value_to_f64(row.get(1)?)?,
        high: value_to_f64(row.get(2)?)?,
        low: value_to_f64(row.get(3)?)?,
        close: value_to_f64(row.get(4)?)?,
        volume: value_to_f64(row.get(volume_index)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::{from_str, json};

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "parse_f64")]
        price: f64,
        #[serde(default, deserialize_with = "parse_f64_option")]
        bid: Option<f64>,
        #[serde(default, deserialize_with = "parse_i64_option")]
        next: Option<i64>,
    }

    #[test]
    fn test_flexible_numbers() {
        let sample: Sample = from_str(r#"{"price":"101.5","bid":"","next":"1700000000000"}"#).unwrap();
        assert_eq!(sample.price, 101.5);
        assert_eq!(sample.bid, None);
        assert_eq!(sample.next, Some(1_700_000_000_000));

        let sample: Sample = from_str(r#"{"price":7,"bid":null}"#).unwrap();
        assert_eq!(sample.price, 7.0);
        assert_eq!(sample.bid, None);
        assert_eq!(sample.next, None);

        assert!(from_str::<Sample>(r#"{"price":"abc"}"#).is_err());
    }

    #[test]
    fn test_candle_from_row() {
        let row = json!([1700000000000i64, "1", "2", "0.5", "1.5", "10", "20"]);
        let candle = candle_from_row(row.as_array().unwrap(), 6).unwrap();
        assert_eq!(candle.time, 1_700_000_000_000);
        assert_eq!(candle.volume, 20.0);
        assert!(candle_from_row(&row.as_array().unwrap()[..3], 5).is_none());
    }
}
