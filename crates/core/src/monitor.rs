use crate::app::AppController;
use crate::domain::analysis::{AnalysisResult, TimeHorizon};
use crate::domain::notification::NotificationEvent;
use crate::domain::watchlist::WatchlistEntry;
use crate::notify::NotificationSink;
use crate::service::AnalysisClient;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Refreshes always use this horizon, whatever the entry was added under.
pub const REFRESH_HORIZON: TimeHorizon = TimeHorizon::MediumLong;
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_ENTRY_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was already running; this request was dropped.
    SkippedBusy,
    SkippedEmpty,
    Completed(CycleReport),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub refreshed: usize,
    pub failed: Vec<String>,
    pub events: Vec<NotificationEvent>,
}

/// Periodically re-analyzes every watchlist entry and raises notifications on
/// signal changes. At most one cycle runs at a time.
pub struct WatchlistMonitor {
    analysis: AnalysisClient,
    controller: Arc<AppController>,
    sink: Arc<dyn NotificationSink>,
    interval: Duration,
    entry_timeout: Duration,
    refreshing: AtomicBool,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl WatchlistMonitor {
    pub fn new(
        analysis: AnalysisClient,
        controller: Arc<AppController>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            analysis,
            controller,
            sink,
            interval: DEFAULT_REFRESH_INTERVAL,
            entry_timeout: DEFAULT_ENTRY_TIMEOUT,
            refreshing: AtomicBool::new(false),
            timer: Mutex::new(None),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_entry_timeout(mut self, entry_timeout: Duration) -> Self {
        self.entry_timeout = entry_timeout;
        self
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::Acquire)
    }

    /// One full sequential pass over the watchlist as it was when the cycle
    /// started. Per-entry failures are logged and leave the entry untouched.
    pub async fn run_cycle(&self) -> CycleOutcome {
        // Taken before the first await so overlapping requests see it.
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh cycle already running; request dropped");
            return CycleOutcome::SkippedBusy;
        }
        let _busy = BusyGuard(&self.refreshing);

        let snapshot = self.controller.reload_watchlist();
        if snapshot.is_empty() {
            tracing::debug!("watchlist empty; refresh cycle skipped");
            return CycleOutcome::SkippedEmpty;
        }

        tracing::info!(entries = snapshot.len(), "watchlist refresh cycle started");
        let today = chrono::Local::now().date_naive();
        let mut report = CycleReport::default();
        let mut updates = Vec::with_capacity(snapshot.len());

        for entry in snapshot.entries() {
            let result = match self.refresh_entry(entry).await {
                Ok(result) => result,
                Err(err) => {
                    tracing::warn!(symbol = %entry.symbol, error = %err, "watchlist refresh failed; keeping stale entry");
                    report.failed.push(entry.symbol.clone());
                    continue;
                }
            };

            if let Some(event) = evaluate_change(entry, &result) {
                tracing::info!(symbol = %entry.symbol, urgent = event.urgent, title = %event.title, "watchlist notification");
                self.sink.deliver(&event);
                report.events.push(event);
            }
            updates.push(entry.refreshed(&result, today));
            report.refreshed += 1;
        }

        if let Err(err) = self.controller.apply_refresh(&updates) {
            tracing::error!(error = %err, "failed to persist refreshed watchlist");
        }

        tracing::info!(
            refreshed = report.refreshed,
            failed = report.failed.len(),
            notifications = report.events.len(),
            "watchlist refresh cycle finished"
        );
        CycleOutcome::Completed(report)
    }

    async fn refresh_entry(&self, entry: &WatchlistEntry) -> anyhow::Result<AnalysisResult> {
        let call = self.analysis.analyze(&entry.symbol, REFRESH_HORIZON);
        match tokio::time::timeout(self.entry_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => anyhow::bail!("no answer within {:?}", self.entry_timeout),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.timer()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Persists the flag, then starts or stops the recurring timer.
    pub fn set_enabled(self: &Arc<Self>, enabled: bool) -> anyhow::Result<()> {
        self.controller.set_notifications_enabled(enabled)?;
        if enabled {
            self.start_timer();
        } else {
            self.stop_timer();
        }
        Ok(())
    }

    /// Restarts the timer if the persisted flag says monitoring is on.
    /// Returns whether the timer is running afterwards.
    pub fn resume(self: &Arc<Self>) -> bool {
        if !self.controller.notifications_enabled() {
            tracing::debug!("alerts disabled; watchlist monitor not resumed");
            return false;
        }
        self.start_timer();
        true
    }

    /// Cancels the timer. A cycle already in flight finishes on its own.
    pub fn teardown(&self) {
        self.stop_timer();
    }

    fn timer(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn start_timer(self: &Arc<Self>) {
        let mut timer = self.timer();
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let monitor = Arc::downgrade(self);
        let period = self.interval;
        tracing::info!(?period, "watchlist monitor enabled");
        *timer = Some(tokio::spawn(timer_loop(monitor, period)));
    }

    fn stop_timer(&self) {
        if let Some(handle) = self.timer().take() {
            handle.abort();
            tracing::info!("watchlist monitor disabled");
        }
    }
}

/// First tick fires immediately. Each cycle runs as its own task so aborting
/// the timer never cuts a cycle short.
async fn timer_loop(monitor: Weak<WatchlistMonitor>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let Some(monitor) = monitor.upgrade() else {
            break;
        };
        tokio::spawn(async move {
            monitor.run_cycle().await;
        });
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Decides whether a refreshed verdict is worth a notification.
///
/// A changed signal always notifies (urgent when the new one is strong). An
/// unchanged BUY or SELL notifies urgently only when it has just turned strong.
pub fn evaluate_change(
    entry: &WatchlistEntry,
    result: &AnalysisResult,
) -> Option<NotificationEvent> {
    if result.signal != entry.last_signal {
        return Some(NotificationEvent::signal_changed(
            &result.symbol,
            &result.company_name,
            entry.last_signal,
            result.signal,
            &result.price,
            result.is_strong,
        ));
    }

    if result.is_strong && result.signal.is_directional() && !entry.last_strong {
        return Some(NotificationEvent::strong_signal(
            &result.symbol,
            &result.company_name,
            result.signal,
            &result.price,
        ));
    }

    None
}
