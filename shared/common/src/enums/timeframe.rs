use crate::constants::{MILLIS_IN_HOUR, MILLIS_IN_MINUTE};
use serde::{Deserialize, Serialize};
use std::{
    fmt::{Debug, Display, Formatter, Result as FormatterResult},
    str::FromStr,
    time::Duration,
};
use tickflow_error::TickflowError;

/// Generic timeframe token shared by every exchange; each exchange maps it to
/// its own native interval string.
#[allow(non_camel_case_types)]
#[derive(Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1m")]
    m1,
    #[serde(rename = "3m")]
    m3,
    #[serde(rename = "5m")]
    m5,
    #[serde(rename = "15m")]
    m15,
    #[serde(rename = "30m")]
    m30,
    #[serde(rename = "1h")]
    h1,
    #[serde(rename = "2h")]
    h2,
    #[serde(rename = "4h")]
    h4,
    #[serde(rename = "6h")]
    h6,
    #[serde(rename = "8h")]
    h8,
    #[serde(rename = "12h")]
    h12,
    #[serde(rename = "1d")]
    d1,
    #[serde(rename = "3d")]
    d3,
    #[serde(rename = "1w")]
    w1,
    #[serde(rename = "1M")]
    M1,
}

impl Timeframe {
    pub fn get_token(&self) -> &'static str {
        match self {
            Self::m1 => "1m",
            Self::m3 => "3m",
            Self::m5 => "5m",
            Self::m15 => "15m",
            Self::m30 => "30m",
            Self::h1 => "1h",
            Self::h2 => "2h",
            Self::h4 => "4h",
            Self::h6 => "6h",
            Self::h8 => "8h",
            Self::h12 => "12h",
            Self::d1 => "1d",
            Self::d3 => "3d",
            Self::w1 => "1w",
            Self::M1 => "1M",
        }
    }

    pub fn get_duration_in_ms(&self) -> i64 {
        match self {
            Self::m1 => MILLIS_IN_MINUTE,
            Self::m3 => 3 * MILLIS_IN_MINUTE,
            Self::m5 => 5 * MILLIS_IN_MINUTE,
            Self::m15 => 15 * MILLIS_IN_MINUTE,
            Self::m30 => 30 * MILLIS_IN_MINUTE,
            Self::h1 => MILLIS_IN_HOUR,
            Self::h2 => 2 * MILLIS_IN_HOUR,
            Self::h4 => 4 * MILLIS_IN_HOUR,
            Self::h6 => 6 * MILLIS_IN_HOUR,
            Self::h8 => 8 * MILLIS_IN_HOUR,
            Self::h12 => 12 * MILLIS_IN_HOUR,
            Self::d1 => 24 * MILLIS_IN_HOUR,
            Self::d3 => 3 * 24 * MILLIS_IN_HOUR,
            Self::w1 => 7 * 24 * MILLIS_IN_HOUR,
            Self::M1 => 30 * 24 * MILLIS_IN_HOUR,
        }
    }

    pub fn get_duration(&self) -> Duration {
        Duration::from_millis(self.get_duration_in_ms() as u64)
    }
}

impl FromStr for Timeframe {
    type Err = TickflowError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let timeframe = match token {
            "1m" => Self::m1,
            "3m" => Self::m3,
            "5m" => Self::m5,
            "15m" => Self::m15,
            "30m" => Self::m30,
            "1h" => Self::h1,
            "2h" => Self::h2,
            "4h" => Self::h4,
            "6h" => Self::h6,
            "8h" => Self::h8,
            "12h" => Self::h12,
            "1d" => Self::d1,
            "3d" => Self::d3,
            "1w" => Self::w1,
            "1M" => Self::M1,
            _ => {
                return Err(TickflowError::new_invalid_payload(format!(
                    "unsupported timeframe {}",
                    token
                )))
            }
        };
        Ok(timeframe)
    }
}

impl Display for Timeframe {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatterResult {
        write!(f, "{}", self.get_token())
    }
}

impl Debug for Timeframe {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatterResult {
        let str = match self {
            Self::m1 => "1 minute",
            Self::m3 => "3 minutes",
            Self::m5 => "5 minutes",
            Self::m15 => "15 minutes",
            Self::m30 => "30 minutes",
            Self::h1 => "1 hour",
            Self::h2 => "2 hours",
            Self::h4 => "4 hours",
            Self::h6 => "6 hours",
            Self::h8 => "8 hours",
            Self::h12 => "12 hours",
            Self::d1 => "1 day",
            Self::d3 => "3 days",
            Self::w1 => "1 week",
            Self::M1 => "1 month",
        };
        write!(f, "{}", str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip_and_rejection() {
        let timeframe: Timeframe = "4h".parse().unwrap();
        assert_eq!(timeframe, Timeframe::h4);
        assert_eq!(timeframe.get_duration_in_ms(), 4 * 60 * 60 * 1_000);
        assert_eq!("1M".parse::<Timeframe>().unwrap(), Timeframe::M1);
        assert!("7m".parse::<Timeframe>().is_err());
    }
}
