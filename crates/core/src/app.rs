use crate::domain::analysis::AnalysisResult;
use crate::domain::recent::RecentSearches;
use crate::domain::watchlist::{Watchlist, WatchlistEntry};
use crate::storage::records::{self, StoredState, DISCLAIMER_KEY, NOTIFICATIONS_KEY};
use crate::storage::StateStore;
use std::sync::{Arc, Mutex, MutexGuard};

/// Owns the client's shared state. `init` loads the persisted records and
/// every mutation writes its record back before returning.
pub struct AppController {
    store: Arc<dyn StateStore>,
    state: Mutex<StoredState>,
}

impl AppController {
    pub fn init(store: Arc<dyn StateStore>) -> Self {
        let state = records::load_all(store.as_ref());
        tracing::debug!(
            watchlist_len = state.watchlist.len(),
            disclaimer_accepted = state.disclaimer_accepted,
            notifications_enabled = state.notifications_enabled,
            "loaded persisted state"
        );
        Self {
            store,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoredState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn has_accepted_disclaimer(&self) -> bool {
        self.state().disclaimer_accepted
    }

    pub fn accept_disclaimer(&self) -> anyhow::Result<()> {
        let mut state = self.state();
        records::save_flag(self.store.as_ref(), DISCLAIMER_KEY, true)?;
        state.disclaimer_accepted = true;
        Ok(())
    }

    pub fn watchlist(&self) -> Watchlist {
        self.state().watchlist.clone()
    }

    /// Rereads the watchlist record so edits made by another process sharing
    /// the data dir are seen. An unreadable record keeps the in-memory copy.
    pub fn reload_watchlist(&self) -> Watchlist {
        let mut state = self.state();
        self.reload_into(&mut state);
        state.watchlist.clone()
    }

    fn reload_into(&self, state: &mut StoredState) {
        match records::read_watchlist(self.store.as_ref()) {
            Ok(watchlist) => state.watchlist = watchlist,
            Err(err) => {
                tracing::warn!(error = %err, "failed to reread watchlist; keeping in-memory copy")
            }
        }
    }

    pub fn is_watched(&self, symbol: &str) -> bool {
        self.state().watchlist.contains(symbol)
    }

    /// Adds the result's symbol to the front of the watchlist, or removes it if
    /// already tracked. Returns whether the symbol is watched afterwards.
    pub fn toggle_watch(&self, result: &AnalysisResult) -> anyhow::Result<bool> {
        let mut state = self.state();
        self.reload_into(&mut state);

        let mut watchlist = state.watchlist.clone();
        let watched = if watchlist.remove(&result.symbol) {
            false
        } else {
            let today = result.timestamp.date_naive();
            watchlist.insert(WatchlistEntry::from_result(result, today));
            true
        };
        records::save_watchlist(self.store.as_ref(), &watchlist)?;
        state.watchlist = watchlist;
        tracing::info!(symbol = %result.symbol, watched, "watchlist toggled");
        Ok(watched)
    }

    pub fn remove_from_watchlist(&self, symbol: &str) -> anyhow::Result<bool> {
        let mut state = self.state();
        self.reload_into(&mut state);

        let mut watchlist = state.watchlist.clone();
        if !watchlist.remove(symbol) {
            return Ok(false);
        }
        records::save_watchlist(self.store.as_ref(), &watchlist)?;
        state.watchlist = watchlist;
        Ok(true)
    }

    /// Single write at the end of a refresh cycle. The record is reread first,
    /// so entries removed while the cycle ran stay removed and entries added
    /// meanwhile are kept.
    pub fn apply_refresh(&self, updates: &[WatchlistEntry]) -> anyhow::Result<usize> {
        let mut state = self.state();
        self.reload_into(&mut state);

        let mut watchlist = state.watchlist.clone();
        let replaced = watchlist.apply_updates(updates);
        records::save_watchlist(self.store.as_ref(), &watchlist)?;
        state.watchlist = watchlist;
        Ok(replaced)
    }

    pub fn recent_searches(&self) -> RecentSearches {
        self.state().recent_searches.clone()
    }

    pub fn record_search(&self, symbol: &str) -> anyhow::Result<()> {
        let mut state = self.state();
        let mut recent = state.recent_searches.clone();
        recent.record(symbol);
        records::save_recent_searches(self.store.as_ref(), &recent)?;
        state.recent_searches = recent;
        Ok(())
    }

    pub fn notifications_enabled(&self) -> bool {
        self.state().notifications_enabled
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        let mut state = self.state();
        records::save_flag(self.store.as_ref(), NOTIFICATIONS_KEY, enabled)?;
        state.notifications_enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{Signal, TimeHorizon};
    use crate::storage::records::{RECENT_SEARCHES_KEY, WATCHLIST_KEY};
    use crate::storage::{scratch_dir, FileStore, MemoryStore};

    /// Reads fine, refuses every write.
    struct ReadOnlyStore;

    impl StateStore for ReadOnlyStore {
        fn load(&self, _key: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn save(&self, key: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("disk full while writing {key}")
        }
    }

    fn result(symbol: &str) -> AnalysisResult {
        AnalysisResult {
            symbol: symbol.to_string(),
            company_name: format!("{symbol} Inc."),
            signal: Signal::Hold,
            is_strong: false,
            price: "$10".into(),
            change: "0%".into(),
            reasoning: String::new(),
            technical_analysis: String::new(),
            sentiment: String::new(),
            sources: Vec::new(),
            timestamp: chrono::Local::now(),
            horizon: TimeHorizon::Short,
        }
    }

    #[test]
    fn toggle_adds_then_removes_and_persists_each_time() {
        let store = Arc::new(MemoryStore::new());
        let app = AppController::init(store.clone());

        assert!(app.toggle_watch(&result("AAPL")).unwrap());
        assert!(app.toggle_watch(&result("MSFT")).unwrap());
        assert_eq!(app.watchlist().entries()[0].symbol, "MSFT");
        assert!(!app.toggle_watch(&result("AAPL")).unwrap());
        assert!(!app.is_watched("AAPL"));
        assert_eq!(store.writes(WATCHLIST_KEY), 3);

        let reloaded = AppController::init(store);
        assert_eq!(reloaded.watchlist().len(), 1);
    }

    #[test]
    fn flags_and_recent_searches_survive_reload() {
        let store = Arc::new(MemoryStore::new());
        let app = AppController::init(store.clone());
        assert!(!app.has_accepted_disclaimer());

        app.accept_disclaimer().unwrap();
        app.set_notifications_enabled(true).unwrap();
        app.record_search("nvda").unwrap();
        app.record_search("aapl").unwrap();

        let reloaded = AppController::init(store.clone());
        assert!(reloaded.has_accepted_disclaimer());
        assert!(reloaded.notifications_enabled());
        assert_eq!(reloaded.recent_searches().symbols(), ["AAPL", "NVDA"]);
        assert_eq!(store.writes(RECENT_SEARCHES_KEY), 2);
    }

    #[test]
    fn remove_missing_symbol_does_not_write() {
        let store = Arc::new(MemoryStore::new());
        let app = AppController::init(store.clone());
        assert!(!app.remove_from_watchlist("AAPL").unwrap());
        assert_eq!(store.writes(WATCHLIST_KEY), 0);
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let app = AppController::init(Arc::new(ReadOnlyStore));

        assert!(app.toggle_watch(&result("AAPL")).is_err());
        assert!(app.watchlist().is_empty());
        assert!(app.record_search("AAPL").is_err());
        assert!(app.recent_searches().symbols().is_empty());
        assert!(app.set_notifications_enabled(true).is_err());
        assert!(!app.notifications_enabled());
        assert!(app.accept_disclaimer().is_err());
        assert!(!app.has_accepted_disclaimer());
    }

    #[test]
    fn edits_from_another_controller_are_seen() {
        let dir = scratch_dir("app-shared");
        let first = AppController::init(Arc::new(FileStore::open(&dir).unwrap()));
        let second = AppController::init(Arc::new(FileStore::open(&dir).unwrap()));

        first.toggle_watch(&result("AAPL")).unwrap();
        assert!(!second.is_watched("AAPL"));
        assert_eq!(second.reload_watchlist().len(), 1);

        // Toggling from a stale copy removes instead of inserting a duplicate.
        let stale = AppController::init(Arc::new(FileStore::open(&dir).unwrap()));
        second.remove_from_watchlist("AAPL").unwrap();
        first.toggle_watch(&result("MSFT")).unwrap();
        assert!(!stale.toggle_watch(&result("MSFT")).unwrap());
        assert!(first.reload_watchlist().is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
