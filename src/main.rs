// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::Result;
use nomad_dns_controller::{
    cloudflare::{CloudflareClient, DnsProvider},
    config::Config,
    constants::{METRICS_SERVER_BIND_ADDRESS, TOKIO_THREAD_NAME, TOKIO_WORKER_THREADS},
    controller::{Controller, ControllerSettings},
    health,
    metrics::Metrics,
    nomad::{NomadClient, Orchestrator},
    shutdown::{is_shutdown, listen_for_signals, shutdown_channel},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name(TOKIO_THREAD_NAME)
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Default filter directive when `RUST_LOG` is unset, from `LOG_LEVEL`.
///
/// Unknown levels fall back to `info`.
fn log_filter_directive(log_level: &str) -> &'static str {
    match log_level.trim().to_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" => "error",
        _ => "info",
    }
}

/// Initialize logging.
///
/// Respects `RUST_LOG` if set, otherwise uses `LOG_LEVEL` (default INFO).
/// `RUST_LOG_FORMAT=json` switches to JSON output.
fn init_logging(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter_directive(log_level)));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    let config = Config::load();
    init_logging(config.as_ref().map_or("info", |c| c.log_level.as_str()));

    let config = config.inspect_err(|e| error!(error = %e, "Invalid configuration"))?;

    info!("Starting Nomad DNS Controller");
    debug!(config = ?config, "Configuration loaded");

    let metrics = Arc::new(Metrics::new()?);
    let nomad: Arc<dyn Orchestrator> = Arc::new(NomadClient::new(&config)?);
    let dns: Arc<dyn DnsProvider> = Arc::new(CloudflareClient::new(&config)?);

    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let listener = TcpListener::bind((METRICS_SERVER_BIND_ADDRESS, config.metrics_port)).await?;
    let server = tokio::spawn(health::serve(
        listener,
        metrics.clone(),
        shutdown_rx.clone(),
    ));

    // Dropping the sender (when this task ends or is aborted) also stops
    // everything that watches the shutdown signal.
    let signal_watch = shutdown_rx.clone();
    let signals = tokio::spawn(listen_for_signals(shutdown_tx));

    let controller = Controller::new(
        nomad,
        dns,
        metrics,
        ControllerSettings::from_config(&config),
    );
    let result = controller.run(shutdown_rx).await;

    // Stopped cleanly without a signal: the signal task ended on its own.
    let sender_gone = result.is_ok() && !is_shutdown(&signal_watch);
    let signal_result = finish_signal_task(signals, sender_gone).await;

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Metrics server failed"),
        Err(e) => error!(error = %e, "Metrics server task failed"),
    }

    if let Err(e) = signal_result {
        error!(error = %e, "Failed to install signal handlers");
        return Err(e.into());
    }

    match result {
        Ok(()) => {
            info!("Nomad DNS Controller stopped");
            Ok(())
        }
        Err(e) => {
            error!("CRITICAL: control loop exited: {e}");
            Err(e.into())
        }
    }
}

/// Collect the signal task's result, or abort it if it is still waiting.
///
/// `sender_gone` means the task already returned and dropped its sender, so
/// its result is awaited and an install failure is surfaced.
async fn finish_signal_task(
    signals: JoinHandle<std::io::Result<()>>,
    sender_gone: bool,
) -> std::io::Result<()> {
    if !sender_gone {
        signals.abort();
        return Ok(());
    }
    match signals.await {
        Ok(result) => result,
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(std::io::Error::other(e)),
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
