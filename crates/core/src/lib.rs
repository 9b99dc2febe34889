pub mod app;
pub mod domain;
pub mod llm;
pub mod monitor;
pub mod notify;
pub mod prompt;
pub mod service;
pub mod storage;

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;
    use std::time::Duration;

    const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 15 * 60;
    const DEFAULT_ENTRY_TIMEOUT_SECS: u64 = 120;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gemini_api_key: Option<String>,
        pub gemini_base_url: Option<String>,
        pub gemini_model: Option<String>,
        pub gemini_timeout_secs: Option<u64>,
        pub data_dir: Option<PathBuf>,
        pub refresh_interval_secs: u64,
        pub entry_timeout_secs: u64,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                gemini_api_key: std::env::var("GEMINI_API_KEY")
                    .or_else(|_| std::env::var("API_KEY"))
                    .ok()
                    .filter(|s| !s.trim().is_empty()),
                gemini_base_url: std::env::var("GEMINI_BASE_URL").ok(),
                gemini_model: std::env::var("GEMINI_MODEL").ok(),
                gemini_timeout_secs: parse_env("GEMINI_TIMEOUT_SECS")?,
                data_dir: std::env::var("STOCKMATE_DATA_DIR").ok().map(PathBuf::from),
                refresh_interval_secs: parse_env("STOCKMATE_REFRESH_INTERVAL_SECS")?
                    .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
                entry_timeout_secs: parse_env("STOCKMATE_ENTRY_TIMEOUT_SECS")?
                    .unwrap_or(DEFAULT_ENTRY_TIMEOUT_SECS),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
            })
        }

        pub fn require_gemini_api_key(&self) -> anyhow::Result<&str> {
            self.gemini_api_key
                .as_deref()
                .context("GEMINI_API_KEY is required")
        }

        /// Directory holding the persisted local records.
        pub fn resolve_data_dir(&self) -> anyhow::Result<PathBuf> {
            if let Some(dir) = &self.data_dir {
                return Ok(dir.clone());
            }
            let base = dirs::data_local_dir()
                .context("no local data directory; set STOCKMATE_DATA_DIR")?;
            Ok(base.join("stockmate"))
        }

        pub fn refresh_interval(&self) -> Duration {
            Duration::from_secs(self.refresh_interval_secs.max(1))
        }

        pub fn entry_timeout(&self) -> Duration {
            Duration::from_secs(self.entry_timeout_secs.max(1))
        }
    }

    fn parse_env(name: &str) -> anyhow::Result<Option<u64>> {
        match std::env::var(name) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse::<u64>()
                .map(Some)
                .with_context(|| format!("{name} must be a non-negative integer (got {raw:?})")),
            _ => Ok(None),
        }
    }
}
