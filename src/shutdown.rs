// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Cooperative cancellation shared by the control loop, the event watcher and
//! the health server.
//!
//! A single `watch` channel carries the shutdown flag. Dropping the sender is
//! treated the same as requesting shutdown, so no task outlives `main`.

use tokio::sync::watch;
use tracing::info;

/// Receiving half handed to every long-running task.
pub type ShutdownReceiver = watch::Receiver<bool>;

/// Sending half owned by `main`.
pub type ShutdownSender = watch::Sender<bool>;

/// Create a new, not-yet-triggered shutdown signal.
#[must_use]
pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    watch::channel(false)
}

/// Resolve once shutdown has been requested (or the sender is gone).
///
/// Cancel-safe: it can be polled repeatedly from `tokio::select!`.
pub async fn wait_for_shutdown(shutdown: &mut ShutdownReceiver) {
    // An Err means the sender was dropped, which also means "stop".
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Whether shutdown has already been requested.
#[must_use]
pub fn is_shutdown(shutdown: &ShutdownReceiver) -> bool {
    *shutdown.borrow()
}

/// Wait for SIGINT or SIGTERM and then flip the shutdown flag.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be installed.
pub async fn listen_for_signals(sender: ShutdownSender) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    info!("Received shutdown signal. Stopping...");
    let _ = sender.send(true);
    Ok(())
}
