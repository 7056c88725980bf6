// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `main.rs` - log level selection and signal handling

#[cfg(test)]
mod tests {
    use super::super::{finish_signal_task, log_filter_directive};
    use std::time::Duration as StdDuration;
    use tokio::time::timeout;

    #[test]
    fn test_log_filter_directive_known_levels() {
        assert_eq!(log_filter_directive("trace"), "trace");
        assert_eq!(log_filter_directive("debug"), "debug");
        assert_eq!(log_filter_directive("info"), "info");
        assert_eq!(log_filter_directive("warn"), "warn");
        assert_eq!(log_filter_directive("error"), "error");
    }

    #[test]
    fn test_log_filter_directive_is_case_insensitive() {
        assert_eq!(log_filter_directive("DEBUG"), "debug");
        assert_eq!(log_filter_directive(" Warning "), "warn");
    }

    #[test]
    fn test_log_filter_directive_defaults_to_info() {
        assert_eq!(log_filter_directive(""), "info");
        assert_eq!(log_filter_directive("verbose"), "info");
    }

    /// Test that SIGTERM signal handler can be created on Unix platforms
    #[tokio::test]
    #[cfg(unix)]
    async fn test_sigterm_signal_handler_creation() {
        use tokio::signal::unix::{signal, SignalKind};

        let result = signal(SignalKind::terminate());
        assert!(
            result.is_ok(),
            "Should be able to create SIGTERM signal handler"
        );
    }

    #[tokio::test]
    async fn test_signal_install_failure_is_surfaced() {
        let signals = tokio::spawn(async {
            Err::<(), _>(std::io::Error::other("signal handlers unavailable"))
        });

        let err = finish_signal_task(signals, true).await.unwrap_err();
        assert!(err.to_string().contains("signal handlers unavailable"));
    }

    #[tokio::test]
    async fn test_pending_signal_task_is_aborted() {
        let signals = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok(())
        });

        let result = timeout(StdDuration::from_secs(1), finish_signal_task(signals, false)).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    /// Aborting the signal task drops its sender, which stops every watcher.
    #[tokio::test]
    async fn test_aborted_signal_task_releases_shutdown() {
        use nomad_dns_controller::shutdown::{
            listen_for_signals, shutdown_channel, wait_for_shutdown,
        };

        let (tx, mut rx) = shutdown_channel();
        let signals = tokio::spawn(async move {
            let _ = listen_for_signals(tx).await;
        });

        let pending = timeout(StdDuration::from_millis(50), wait_for_shutdown(&mut rx)).await;
        assert!(pending.is_err(), "no signal sent yet");

        signals.abort();
        let released = timeout(StdDuration::from_secs(1), wait_for_shutdown(&mut rx)).await;
        assert!(released.is_ok(), "dropping the sender should count as shutdown");
    }
}
