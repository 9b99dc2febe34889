use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use std::sync::Arc;
use stockmate_core::app::AppController;
use stockmate_core::config::Settings;
use stockmate_core::domain::analysis::{normalize_symbol, TimeHorizon};
use stockmate_core::domain::notification::NotificationEvent;
use stockmate_core::llm::gemini::GeminiClient;
use stockmate_core::llm::{LlmClient, LlmError};
use stockmate_core::monitor::{CycleOutcome, WatchlistMonitor};
use stockmate_core::notify::{NotificationPermission, NotificationSink, PermissionGated};
use stockmate_core::service::{AnalysisClient, DiscoveryClient};
use stockmate_core::storage::FileStore;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;
mod terminal;

#[derive(Debug, Parser)]
#[command(name = "stockmate", about = "AI-assisted stock signals with a monitored watchlist")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Accept the risk disclaimer. Required once before any analysis.
    AcceptDisclaimer,

    /// Analyze one ticker.
    Analyze {
        symbol: String,

        #[arg(long, value_enum, default_value_t = HorizonArg::MediumLong)]
        horizon: HorizonArg,

        /// Add the result to the watchlist, or remove it if already watched.
        #[arg(long)]
        watch: bool,
    },

    /// Scan the market for a handful of candidate tickers.
    Discover {
        #[arg(long, value_enum, default_value_t = HorizonArg::MediumLong)]
        horizon: HorizonArg,
    },

    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },

    /// Show recently analyzed symbols.
    Recent,

    /// Turn watchlist alerts on or off.
    Notifications {
        #[arg(value_enum)]
        state: Toggle,
    },

    /// Refresh every watchlist entry once.
    Refresh,

    /// Keep refreshing the watchlist on a timer until Ctrl-C. Requires alerts on.
    Monitor,
}

#[derive(Debug, Subcommand)]
enum WatchlistAction {
    List,
    Remove { symbol: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HorizonArg {
    Intraday,
    Short,
    MediumLong,
}

impl From<HorizonArg> for TimeHorizon {
    fn from(value: HorizonArg) -> Self {
        match value {
            HorizonArg::Intraday => TimeHorizon::Intraday,
            HorizonArg::Short => TimeHorizon::Short,
            HorizonArg::MediumLong => TimeHorizon::MediumLong,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match run(args.command, &settings).await {
        Ok(code) => Ok(code),
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            Err(err)
        }
    }
}

async fn run(command: Command, settings: &Settings) -> anyhow::Result<ExitCode> {
    let store = FileStore::open(settings.resolve_data_dir()?)?;
    tracing::debug!(data_dir = %store.dir().display(), "opened local state");
    let controller = Arc::new(AppController::init(Arc::new(store)));

    if matches!(command, Command::AcceptDisclaimer) {
        controller.accept_disclaimer()?;
        println!("{}", render::DISCLAIMER);
        println!("Disclaimer accepted.");
        return Ok(ExitCode::SUCCESS);
    }
    if !controller.has_accepted_disclaimer() {
        eprintln!("{}", render::DISCLAIMER);
        eprintln!("Run `stockmate accept-disclaimer` to continue.");
        return Ok(ExitCode::FAILURE);
    }

    match command {
        Command::AcceptDisclaimer => Ok(ExitCode::SUCCESS),
        Command::Analyze {
            symbol,
            horizon,
            watch,
        } => analyze(settings, &controller, &symbol, horizon.into(), watch).await,
        Command::Discover { horizon } => discover(settings, horizon.into()).await,
        Command::Watchlist { action } => {
            match action {
                WatchlistAction::List => render::print_watchlist(&controller.watchlist()),
                WatchlistAction::Remove { symbol } => {
                    let symbol = normalize_symbol(&symbol).unwrap_or_default();
                    if controller.remove_from_watchlist(&symbol)? {
                        println!("Removed {symbol} from the watchlist.");
                    } else {
                        println!("{symbol} is not in the watchlist.");
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Recent => {
            for symbol in controller.recent_searches().symbols() {
                println!("{symbol}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Notifications { state } => {
            let enabled = matches!(state, Toggle::On);
            controller.set_notifications_enabled(enabled)?;
            if enabled {
                notification_sink(&controller).deliver(&NotificationEvent {
                    title: "StockMate AI".to_string(),
                    body: "Alerts enabled. You will be notified of important signal changes."
                        .to_string(),
                    urgent: false,
                });
            } else {
                println!("Alerts disabled.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Refresh => {
            let monitor = build_monitor(settings, &controller)?;
            match monitor.run_cycle().await {
                CycleOutcome::Completed(report) => render::print_cycle_report(&report),
                CycleOutcome::SkippedEmpty => println!("The watchlist is empty."),
                CycleOutcome::SkippedBusy => println!("A refresh is already running."),
            }
            render::print_watchlist(&controller.watchlist());
            Ok(ExitCode::SUCCESS)
        }
        Command::Monitor => {
            let monitor = Arc::new(build_monitor(settings, &controller)?);
            if !monitor.resume() {
                eprintln!("Alerts are off. Run `stockmate notifications on` to enable monitoring.");
                return Ok(ExitCode::FAILURE);
            }
            tracing::info!(
                interval_secs = settings.refresh_interval_secs,
                "monitoring watchlist; press Ctrl-C to stop"
            );
            until_shutdown(tokio::signal::ctrl_c(), || monitor.teardown()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Waits for the shutdown signal, then tears down. A signal listener that
/// cannot be installed still tears down and is reported as an error.
async fn until_shutdown(
    signal: impl std::future::Future<Output = std::io::Result<()>>,
    teardown: impl FnOnce(),
) -> anyhow::Result<()> {
    let waited = signal.await;
    teardown();
    waited.context("failed to listen for Ctrl-C")
}

async fn analyze(
    settings: &Settings,
    controller: &AppController,
    raw_symbol: &str,
    horizon: TimeHorizon,
    watch: bool,
) -> anyhow::Result<ExitCode> {
    let Some(symbol) = normalize_symbol(raw_symbol) else {
        return Ok(ExitCode::SUCCESS);
    };

    let client = AnalysisClient::new(llm_client(settings)?);
    let result = match client.analyze(&symbol, horizon).await {
        Ok(result) => result,
        Err(err) => return Ok(report_failure(&err, "analysis failed")),
    };

    controller.record_search(&result.symbol)?;
    render::print_analysis(&result, controller.is_watched(&result.symbol));

    if watch {
        let watched = controller.toggle_watch(&result)?;
        if watched {
            println!("Added {} to the watchlist.", result.symbol);
        } else {
            println!("Removed {} from the watchlist.", result.symbol);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn discover(settings: &Settings, horizon: TimeHorizon) -> anyhow::Result<ExitCode> {
    let client = DiscoveryClient::new(llm_client(settings)?);
    match client.discover(horizon).await {
        Ok(candidates) => {
            render::print_candidates(&candidates);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => Ok(report_failure(&err, "discovery failed")),
    }
}

fn report_failure(err: &LlmError, what: &str) -> ExitCode {
    tracing::error!(error = %err, "{what}");
    if let Some(raw) = err.raw_output() {
        tracing::debug!(raw_output = raw, "model output of the failed request");
    }
    eprintln!("{}", err.user_message());
    ExitCode::FAILURE
}

fn llm_client(settings: &Settings) -> anyhow::Result<Arc<dyn LlmClient>> {
    Ok(Arc::new(GeminiClient::from_settings(settings)?))
}

fn notification_sink(controller: &AppController) -> Arc<dyn NotificationSink> {
    let permission = if controller.notifications_enabled() {
        NotificationPermission::Granted
    } else {
        NotificationPermission::NotRequested
    };
    Arc::new(PermissionGated::new(terminal::TerminalSink, permission))
}

fn build_monitor(
    settings: &Settings,
    controller: &Arc<AppController>,
) -> anyhow::Result<WatchlistMonitor> {
    let analysis = AnalysisClient::new(llm_client(settings)?);
    Ok(WatchlistMonitor::new(analysis, controller.clone(), notification_sink(controller))
        .with_interval(settings.refresh_interval())
        .with_entry_timeout(settings.entry_timeout()))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_analyze_with_horizon() {
        let args = Args::try_parse_from(["stockmate", "analyze", "aapl", "--horizon", "medium-long", "--watch"])
            .unwrap();
        match args.command {
            Command::Analyze {
                symbol,
                horizon,
                watch,
            } => {
                assert_eq!(symbol, "aapl");
                assert_eq!(TimeHorizon::from(horizon), TimeHorizon::MediumLong);
                assert!(watch);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn horizon_defaults_to_medium_long() {
        let args = Args::try_parse_from(["stockmate", "discover"]).unwrap();
        let Command::Discover { horizon } = args.command else {
            panic!("expected discover");
        };
        assert_eq!(TimeHorizon::from(horizon), TimeHorizon::MediumLong);
    }

    #[tokio::test]
    async fn shutdown_tears_down_even_when_signal_fails() {
        let torn_down = std::cell::Cell::new(false);
        let err = until_shutdown(
            std::future::ready(Err(std::io::Error::other("no signal driver"))),
            || torn_down.set(true),
        )
        .await
        .unwrap_err();

        assert!(torn_down.get());
        assert!(format!("{err:#}").contains("no signal driver"));

        torn_down.set(false);
        until_shutdown(std::future::ready(Ok(())), || torn_down.set(true))
            .await
            .unwrap();
        assert!(torn_down.get());
    }
}
