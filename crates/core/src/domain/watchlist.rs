use crate::domain::analysis::{AnalysisResult, Signal};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub symbol: String,
    pub company_name: String,
    pub last_signal: Signal,
    pub last_price: String,
    /// Strength flag of the last stored result. Older records lack it.
    #[serde(default)]
    pub last_strong: bool,
    /// Date the entry last changed (creation or refresh).
    pub added_at: NaiveDate,
}

impl WatchlistEntry {
    pub fn from_result(result: &AnalysisResult, today: NaiveDate) -> Self {
        Self {
            symbol: result.symbol.clone(),
            company_name: result.company_name.clone(),
            last_signal: result.signal,
            last_price: result.price.clone(),
            last_strong: result.is_strong,
            added_at: today,
        }
    }

    /// Copy of this entry carrying the refreshed verdict.
    pub fn refreshed(&self, result: &AnalysisResult, today: NaiveDate) -> Self {
        Self {
            last_signal: result.signal,
            last_price: result.price.clone(),
            last_strong: result.is_strong,
            added_at: today,
            ..self.clone()
        }
    }
}

/// Ordered tracking list, most recently added first, one entry per symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    entries: Vec<WatchlistEntry>,
}

impl Watchlist {
    /// Builds a list from stored entries, dropping later duplicates of a symbol.
    pub fn from_entries(entries: Vec<WatchlistEntry>) -> Self {
        let mut list = Self::default();
        for entry in entries {
            if !list.contains(&entry.symbol) {
                list.entries.push(entry);
            }
        }
        list
    }

    pub fn entries(&self) -> &[WatchlistEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.iter().any(|e| e.symbol == symbol)
    }

    pub fn get(&self, symbol: &str) -> Option<&WatchlistEntry> {
        self.entries.iter().find(|e| e.symbol == symbol)
    }

    /// Inserts at the front. Returns false if the symbol is already tracked.
    pub fn insert(&mut self, entry: WatchlistEntry) -> bool {
        if self.contains(&entry.symbol) {
            return false;
        }
        self.entries.insert(0, entry);
        true
    }

    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.symbol != symbol);
        self.entries.len() != before
    }

    /// Overwrites entries whose symbol appears in `updates`. Symbols no longer
    /// tracked are ignored, order is preserved. Returns how many were replaced.
    pub fn apply_updates(&mut self, updates: &[WatchlistEntry]) -> usize {
        let mut replaced = 0;
        for update in updates {
            if let Some(slot) = self.entries.iter_mut().find(|e| e.symbol == update.symbol) {
                *slot = update.clone();
                replaced += 1;
            }
        }
        replaced
    }
}
