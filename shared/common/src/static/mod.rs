use phf::{phf_set, Set};

/// Settle assets accepted for linear swaps.
pub static STABLECOIN_SETTLES: Set<&'static str> = phf_set! {
    "USDT",
    "USDC",
    "USD",
    "FDUSD",
    "USDE",
};

pub fn is_stablecoin_settle(asset: &str) -> bool {
    STABLECOIN_SETTLES.contains(asset.to_uppercase().as_str())
}
