use super::MarketInfo;
use std::{collections::HashMap, sync::Arc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedSymbol {
    pub symbol: Arc<str>,
    pub venue: Option<Arc<str>>,
}

/// Bidirectional native id <-> canonical symbol lookup for one exchange.
///
/// Built once from an already filtered catalog (only eligible linear swaps
/// reach it) and shared read-only behind an `Arc`. A catalog reload builds a
/// new mapper and swaps the `Arc`; a mapper is never edited in place.
#[derive(Debug, Default)]
pub struct SymbolMapper {
    by_native: HashMap<String, MappedSymbol>,
    by_canonical: HashMap<Arc<str>, String>,
    venues: Vec<Option<Arc<str>>>,
}

impl SymbolMapper {
    pub fn from_markets(markets: &[MarketInfo]) -> Self {
        let mut by_native = HashMap::with_capacity(markets.len());
        let mut by_canonical = HashMap::with_capacity(markets.len());
        let mut venues: Vec<Option<Arc<str>>> = Vec::new();

        for market in markets {
            let symbol: Arc<str> = Arc::from(market.symbol.as_str());
            let venue = market.venue.as_deref().map(Arc::<str>::from);
            if !venues.contains(&venue) {
                venues.push(venue.clone());
            }
            by_canonical.insert(symbol.clone(), market.id.clone());
            by_native.insert(market.id.clone(), MappedSymbol { symbol, venue });
        }

        Self {
            by_native,
            by_canonical,
            venues,
        }
    }

    pub fn to_canonical(&self, native_id: &str) -> Option<&MappedSymbol> {
        self.by_native.get(native_id)
    }

    pub fn to_native(&self, symbol: &str) -> Option<&str> {
        self.by_canonical.get(symbol).map(String::as_str)
    }

    /// Native ids sorted, so shard partitions are stable across restarts.
    pub fn native_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.by_native.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn venues(&self) -> &[Option<Arc<str>>] {
        &self.venues
    }

    pub fn len(&self) -> usize {
        self.by_native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_native.is_empty()
    }
}
