use crate::domain::recent::RecentSearches;
use crate::domain::watchlist::{Watchlist, WatchlistEntry};
use crate::storage::StateStore;
use anyhow::Context;

pub const DISCLAIMER_KEY: &str = "disclaimer_accepted";
pub const WATCHLIST_KEY: &str = "watchlist";
pub const RECENT_SEARCHES_KEY: &str = "recent_searches";
pub const NOTIFICATIONS_KEY: &str = "notifications_enabled";

/// Snapshot of every persisted record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredState {
    pub disclaimer_accepted: bool,
    pub watchlist: Watchlist,
    pub recent_searches: RecentSearches,
    pub notifications_enabled: bool,
}

/// Loads all records. Unreadable or malformed content falls back to defaults
/// so a corrupt file never blocks startup.
pub fn load_all(store: &dyn StateStore) -> StoredState {
    StoredState {
        disclaimer_accepted: load_flag(store, DISCLAIMER_KEY),
        watchlist: load_watchlist(store),
        recent_searches: load_json::<Vec<String>>(store, RECENT_SEARCHES_KEY)
            .map(RecentSearches::from_symbols)
            .unwrap_or_default(),
        notifications_enabled: load_flag(store, NOTIFICATIONS_KEY),
    }
}

pub fn load_watchlist(store: &dyn StateStore) -> Watchlist {
    load_json::<Vec<WatchlistEntry>>(store, WATCHLIST_KEY)
        .map(Watchlist::from_entries)
        .unwrap_or_default()
}

/// Strict read of the watchlist record for callers that must not mistake a
/// transient failure for an empty list. A missing record is an empty list.
pub fn read_watchlist(store: &dyn StateStore) -> anyhow::Result<Watchlist> {
    let Some(raw) = store.load(WATCHLIST_KEY)? else {
        return Ok(Watchlist::default());
    };
    let entries: Vec<WatchlistEntry> =
        serde_json::from_str(&raw).context("malformed watchlist record")?;
    Ok(Watchlist::from_entries(entries))
}

pub fn save_watchlist(store: &dyn StateStore, watchlist: &Watchlist) -> anyhow::Result<()> {
    save_json(store, WATCHLIST_KEY, watchlist)
}

pub fn save_recent_searches(
    store: &dyn StateStore,
    recent: &RecentSearches,
) -> anyhow::Result<()> {
    save_json(store, RECENT_SEARCHES_KEY, recent)
}

pub fn save_flag(store: &dyn StateStore, key: &str, value: bool) -> anyhow::Result<()> {
    save_json(store, key, &value)
}

fn load_flag(store: &dyn StateStore, key: &str) -> bool {
    load_json::<bool>(store, key).unwrap_or(false)
}

fn load_json<T: serde::de::DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let raw = match store.load(key) {
        Ok(raw) => raw?,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to read persisted record; using default");
            return None;
        }
    };
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(key, error = %err, "malformed persisted record; using default");
            None
        }
    }
}

fn save_json<T: serde::Serialize + ?Sized>(
    store: &dyn StateStore,
    key: &str,
    value: &T,
) -> anyhow::Result<()> {
    let text = serde_json::to_string(value)
        .with_context(|| format!("failed to serialize record {key}"))?;
    store
        .save(key, &text)
        .with_context(|| format!("failed to persist record {key}"))
}
