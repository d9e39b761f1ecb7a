// src/main.rs
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use honeywatch::alert::{AlertDispatcher, TelegramNotifier};
use honeywatch::config::{load_config, Config, DEFAULT_CONFIG_FILE};
use honeywatch::dashboard::{self, DashboardState, StaticCredentials};
use honeywatch::geo::IpApiResolver;
use honeywatch::session::{display_sessions, SessionAggregator};
use honeywatch::snapshot::{DockerCpFetcher, SnapshotFetcher};
use honeywatch::tracker::CompletionTracker;
use honeywatch::watcher::{collect_sessions, Watcher};

#[derive(Parser)]
#[command(name = "honeywatch", version, about = "Honeypot session alerts and IDS dashboard")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the honeypot log and notify on every closed session
    Watch,
    /// Serve the authenticated dashboard
    Serve,
    /// Run one aggregation pass and print the sessions as JSON
    Once,
}

/// Exit status for configuration failures.
const EXIT_CONFIG: u8 = 2;

fn fetcher_for(cfg: &Config, command: &str) -> Arc<dyn SnapshotFetcher> {
    Arc::new(DockerCpFetcher::new(
        &cfg.honeypot.container,
        &cfg.honeypot.internal_log_path,
        &cfg.honeypot.snapshot_path_for(command),
        cfg.honeypot.fetch_timeout(),
    ))
}

/// The SIGINT handler is installed on first poll; `Watcher::run` polls
/// this before its first pass.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "cannot listen for interrupt");
        std::future::pending::<()>().await;
    }
    info!("interrupt received");
}

async fn run_watch(cfg: Config) -> honeywatch::Result<()> {
    let (token, chat_id) = cfg.require_notify()?;
    let geo = IpApiResolver::new(&cfg.geo.endpoint, Duration::from_secs(cfg.geo.timeout_secs))?;
    let notifier = TelegramNotifier::new(
        &cfg.notify.api_base,
        &token,
        &chat_id,
        Duration::from_secs(cfg.notify.timeout_secs),
    )?;

    let mut watcher = Watcher::new(
        fetcher_for(&cfg, "watch"),
        SessionAggregator::default(),
        CompletionTracker::default(),
        AlertDispatcher::new(Arc::new(geo), Arc::new(notifier)),
    );
    watcher.run(cfg.watch.poll_interval(), shutdown_signal()).await;
    Ok(())
}

async fn run_serve(cfg: Config) -> honeywatch::Result<()> {
    let (user, pass) = cfg.require_dashboard()?;
    let state = DashboardState::new(
        cfg.ids.log_path.clone(),
        fetcher_for(&cfg, "serve"),
        SessionAggregator::default(),
        Arc::new(StaticCredentials::new(&user, &pass)),
    );
    dashboard::serve(&cfg.dashboard.bind_address(), state, shutdown_signal()).await
}

async fn run_once(cfg: Config) -> honeywatch::Result<()> {
    let fetcher = fetcher_for(&cfg, "once");
    let sessions = collect_sessions(fetcher.as_ref(), &SessionAggregator::default()).await?;
    let out = serde_json::to_string_pretty(&display_sessions(&sessions))?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let cfg = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(path = %cli.config.display(), error = %e, "failed to load config");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    let result = match cli.command {
        Command::Watch => run_watch(cfg).await,
        Command::Serve => run_serve(cfg).await,
        Command::Once => run_once(cfg).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ honeywatch::HoneywatchError::Config(_)) => {
            error!(error = %e, "refusing to start");
            ExitCode::from(EXIT_CONFIG)
        }
        Err(e) => {
            error!(error = %e, "exiting");
            ExitCode::FAILURE
        }
    }
}
