//! feedtoot — Binary Entrypoint
//! Checks privileges, loads the configuration, drops to the configured user,
//! then polls the feed on a fixed schedule until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedtoot::config::{self, Config};
use feedtoot::ingest::{self, providers::rss::RssFeedSource, scheduler};
use feedtoot::notify::mastodon::MastodonClient;
use feedtoot::privilege;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(version, about = "Republish new RSS entries as Mastodon statuses")]
struct Cli {
    /// Log at debug level instead of info.
    #[arg(long)]
    debug: bool,

    /// Configuration file (defaults to $FEEDTOOT_CONFIG_PATH, then /etc/feedtoot/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

/// `--debug` sets the base level; RUST_LOG directives still apply on top.
fn init_tracing(debug: bool, format: LogFormat) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Text => registry.with(fmt::layer().compact()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }

    if debug {
        tracing::debug!("debug logging enabled");
    }
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("installing Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("installing SIGTERM handler")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => {
            res?;
            tracing::info!("received SIGINT, shutting down");
        },
        res = terminate => {
            res?;
            tracing::info!("received SIGTERM, shutting down");
        },
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    privilege::ensure_root()?;

    let path = config::resolve_path(cli.config.as_deref());
    let cfg = Config::load_from_file(&path)?;
    tracing::info!(path = %path.display(), "configuration acquired");

    privilege::drop_privileges(cfg.run_as).context("dropping root privileges")?;

    if let Some(m) = &cfg.metrics {
        feedtoot::metrics::init(m)?;
    }

    let source = Arc::new(RssFeedSource::from_config(&cfg.feed)?);
    let publisher = Arc::new(MastodonClient::new(&cfg.server)?);
    let interval = cfg.schedule.interval();
    tracing::info!(
        interval = ?interval,
        feed = %cfg.feed.url,
        endpoint = publisher.endpoint(),
        "execution interval set"
    );

    let handle = scheduler::spawn(interval, move || {
        let source = source.clone();
        let publisher = publisher.clone();
        async move {
            ingest::run_once(source.as_ref(), publisher.as_ref(), interval).await;
        }
    });
    tracing::info!(job_id = %handle.id(), "scheduler started, waiting for SIGINT/SIGTERM");

    if let Err(e) = shutdown_signal().await {
        tracing::error!(error = ?e, "signal handling failed, shutting down");
    }

    if let Err(e) = handle.shutdown().await {
        tracing::error!(error = ?e, "scheduler stop failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.debug, cli.log_format);

    if let Err(e) = run(cli).await {
        tracing::error!(error = ?e, "startup failed");
        std::process::exit(1);
    }
}
