//! logfind - exact-timestamp log line lookup server
//!
//! Indexes a directory of timestamp-sorted log files and serves
//! `GET /logs?timestamp=...` over HTTP.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use logfind_core::LogService;
use logfind_server::{LogServer, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = &dotenv {
        if !e.not_found() {
            warn!(error = %e, "failed to load .env file");
        }
    }

    let config = ServerConfig::parse();
    let bind_addr = config.bind_addr();
    info!(
        log_dir = %config.log_dir.display(),
        addr = %bind_addr,
        max_open_files = config.max_open_files,
        cache_ttl = %humantime::format_duration(config.cache_ttl),
        file_cache_ttl = %humantime::format_duration(config.file_cache_ttl),
        refresh_interval = %humantime::format_duration(config.refresh_interval),
        rate_limit = config.rate_limit,
        "starting logfind"
    );

    let service = Arc::new(
        LogService::open(&config.engine_config())
            .with_context(|| format!("failed to open {}", config.log_dir.display()))?,
    );
    let server = LogServer::new(Arc::clone(&service), config.rate_limit);

    let shutdown = shutdown_signal().context("failed to install signal handlers")?;
    let served = server.serve_with_shutdown(bind_addr, shutdown).await;

    service.close().await;
    served?;

    info!("logfind stopped");
    Ok(())
}

/// Completes on Ctrl-C or SIGTERM.
#[cfg(unix)]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
            _ = tokio::signal::ctrl_c() => info!("received SIGINT, initiating shutdown"),
        }
    })
}

/// Completes on Ctrl-C.
#[cfg(not(unix))]
fn shutdown_signal() -> std::io::Result<impl Future<Output = ()> + Send + 'static> {
    Ok(async {
        let _ = tokio::signal::ctrl_c().await;
        info!("received Ctrl-C, initiating shutdown");
    })
}
