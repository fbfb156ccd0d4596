//! studio-api - HTTP server for multi-platform publishing

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use libstudiocast::logging::{LogFormat, LoggingConfig};
use libstudiocast::{Config, StudioService};
use studio_api::{router, AppState};
use tracing::{error, info};

/// How often expired OAuth link requests are deleted
const STATE_PURGE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Parser, Debug)]
#[command(name = "studio-api")]
#[command(version)]
#[command(about = "HTTP API for multi-platform publishing and account linking")]
#[command(long_about = "\
studio-api - HTTP API for multi-platform publishing and account linking

DESCRIPTION:
    Serves the publishing pipeline: publish stored posts to LinkedIn,
    Twitter/X, Facebook and Instagram, post ad-hoc content to a single
    platform, link accounts through OAuth, and manage linked accounts.

USAGE:
    # Run with the default config file
    studio-api

    # Custom config and port, JSON logs
    studio-api --config ./studio.toml --port 9000 --log-format json

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (in-flight requests complete)

CONFIGURATION:
    Configuration file: ~/.config/studiocast/config.toml
    Override with --config or STUDIOCAST_CONFIG.
")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, env = "STUDIOCAST_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address to bind (overrides server.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides server.port)
    #[arg(short, long)]
    port: Option<u16>,

    /// Log output format: text, json or pretty
    #[arg(long, env = "STUDIOCAST_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = std::env::var("STUDIOCAST_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    LoggingConfig::new(cli.log_format, level, cli.verbose)
        .init()
        .context("Failed to initialise logging")?;

    let mut config = match &cli.config {
        Some(path) => Config::load_from_path(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let service = StudioService::from_config(config)
        .await
        .context("Failed to start service")?;
    let state = Arc::new(AppState::new(service));

    let purge = tokio::spawn(purge_expired_states(Arc::clone(&state)));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("studio-api listening on {}", addr);

    axum::serve(listener, router(Arc::clone(&state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    purge.abort();
    state.service.database().close().await;
    info!("studio-api stopped");
    Ok(())
}

/// Periodically delete OAuth link requests nobody came back for
async fn purge_expired_states(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(STATE_PURGE_INTERVAL);
    loop {
        interval.tick().await;
        let now = chrono::Utc::now().timestamp();
        if let Err(e) = state.service.oauth_states().purge_expired(now).await {
            error!("Failed to purge expired OAuth states: {}", e);
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use futures::stream::StreamExt;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook_tokio::Signals;

    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            if let Some(signal) = signals.next().await {
                info!("Received signal {}, shutting down gracefully", signal);
            }
            signals.handle().close();
        }
        Err(e) => {
            error!("Signal setup failed: {}, falling back to Ctrl-C", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Ctrl-C handler failed: {}", e);
            }
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Ctrl-C handler failed: {}", e);
    }
    info!("Received Ctrl-C, shutting down gracefully");
}
