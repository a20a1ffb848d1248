// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use std::net::SocketAddr;
use thiserror::Error;
use xcm_monitor_server::{app, logging, metrics, state::AppState};

#[cfg(not(target_os = "windows"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] xcm_monitor_config::ConfigError),

    #[error(transparent)]
    State(#[from] xcm_monitor_server::state::StateError),

    #[error(transparent)]
    Logging(#[from] logging::LoggingError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = xcm_monitor_config::MonitorConfig::from_env()?;

    let loki_url = if config.metrics.enabled {
        Some(format!(
            "http://{}:{}",
            config.metrics.loki_host, config.metrics.loki_port
        ))
    } else {
        None
    };

    logging::init_with_config(logging::LoggingConfig {
        level: &config.log.level,
        json_format: config.log.json,
        strip_ansi: config.log.strip_ansi,
        write_to_file: config.log.write,
        write_path: &config.log.write_path,
        write_max_file_size: config.log.write_max_file_size,
        write_max_files: config.log.write_max_files,
        loki_url: loki_url.as_deref(),
    })?;

    if config.metrics.enabled {
        metrics::init();
    }

    let bind_host = config.http.bind_host.clone();
    let port = config.http.port;
    let chain_count = config.chains.urls.len();

    let state = AppState::new(config).await?;

    tracing::info!(chains = chain_count, "loaded persisted subscriptions and started switchboard");

    let app = app::create_app(state);
    let addr: SocketAddr = format!("{bind_host}:{port}").parse().map_err(|e| {
        std::io::Error::other(format!("invalid bind address '{bind_host}:{port}': {e}"))
    })?;

    tracing::info!(%addr, "starting xcm-monitor-server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(StartupError::Io)?;

    Ok(())
}
