// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP server command
//!
//! Builds the healing runtime from configuration, optionally starts the
//! Prometheus exporter and serves the API until a shutdown signal arrives.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use selfheal_core::application::HealingRuntime;
use selfheal_core::domain::config::ServiceConfigManifest;
use selfheal_core::presentation::api;

pub async fn run(config: ServiceConfigManifest) -> Result<()> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let network = &config.spec.network;
    let metrics = &config.spec.observability.metrics;

    if metrics.enabled {
        let metrics_addr: SocketAddr = format!("{}:{}", network.bind_address, metrics.port)
            .parse()
            .with_context(|| format!("Invalid metrics address {}:{}", network.bind_address, metrics.port))?;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!("Prometheus metrics exposed on {}", metrics_addr);
    }

    let runtime = Arc::new(HealingRuntime::from_config(&config));
    let app = api::app(runtime);

    let addr = format!("{}:{}", network.bind_address, network.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(
        service = %config.metadata.name,
        "Self-healing service listening on {}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Self-healing service shutting down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
