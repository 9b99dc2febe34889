use serde::{Deserialize, Serialize};

pub const MAX_RECENT_SEARCHES: usize = 5;

/// Recently searched symbols, most recent first, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentSearches {
    symbols: Vec<String>,
}

impl RecentSearches {
    pub fn from_symbols(symbols: Vec<String>) -> Self {
        let mut recent = Self::default();
        for symbol in symbols.into_iter().rev() {
            recent.record(&symbol);
        }
        recent
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Moves `symbol` (upper-cased) to the front and caps the list.
    pub fn record(&mut self, symbol: &str) {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return;
        }
        self.symbols.retain(|s| *s != symbol);
        self.symbols.insert(0, symbol);
        self.symbols.truncate(MAX_RECENT_SEARCHES);
    }
}
