use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Formatter, Result as FormatterResult},
    str::FromStr,
};
use tickflow_error::TickflowError;

/// `BASE/QUOTE:SETTLE`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalSymbol {
    pub base: String,
    pub quote: String,
    pub settle: String,
}

impl CanonicalSymbol {
    pub fn new(base: &str, quote: &str, settle: &str) -> Self {
        Self {
            base: base.to_uppercase(),
            quote: quote.to_uppercase(),
            settle: settle.to_uppercase(),
        }
    }
}

impl Display for CanonicalSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatterResult {
        write!(f, "{}/{}:{}", self.base, self.quote, self.settle)
    }
}

impl FromStr for CanonicalSymbol {
    type Err = TickflowError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            TickflowError::new_invalid_payload(format!(
                "symbol {} is not in BASE/QUOTE:SETTLE form",
                value
            ))
        };
        let (pair, settle) = value.split_once(':').ok_or_else(invalid)?;
        let (base, quote) = pair.split_once('/').ok_or_else(invalid)?;
        if base.is_empty() || quote.is_empty() || settle.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(base, quote, settle))
    }
}
