pub mod records;

use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Textual key/value persistence for the client's local records.
pub trait StateStore: Send + Sync {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>>;

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// One `<key>.json` file per record under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create data dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StateStore for FileStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path_for(key);
        // Per-process temp name; several shells may share one data dir.
        let tmp = self
            .dir
            .join(format!(".{key}.json.{}.tmp", std::process::id()));
        std::fs::write(&tmp, value)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// In-process store; counts writes per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    writes: Mutex<HashMap<String, usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        self
    }

    pub fn writes(&self, key: &str) -> usize {
        self.writes
            .lock()
            .map(|w| w.get(key).copied().unwrap_or(0))
            .unwrap_or(0)
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?
            .insert(key.to_string(), value.to_string());
        *self
            .writes
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?
            .entry(key.to_string())
            .or_insert(0) += 1;
        Ok(())
    }
}

/// Fresh, not yet created directory under the system temp dir.
#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "stockmate-{name}-{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_reports_missing() {
        let dir = scratch_dir("roundtrip");
        let store = FileStore::open(&dir).unwrap();

        assert_eq!(store.load("watchlist").unwrap(), None);
        store.save("watchlist", "[]").unwrap();
        store.save("watchlist", "[1]").unwrap();
        assert_eq!(store.load("watchlist").unwrap().as_deref(), Some("[1]"));
        assert!(dir.join("watchlist.json").exists());
        let leftovers = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn memory_store_counts_writes() {
        let store = MemoryStore::new().with_value("a", "1");
        assert_eq!(store.load("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.writes("a"), 0);
        store.save("a", "2").unwrap();
        store.save("a", "3").unwrap();
        assert_eq!(store.writes("a"), 2);
    }
}
