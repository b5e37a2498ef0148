//! Graceful Shutdown Handling
//!
//! Listens for SIGTERM and SIGINT and tells the HTTP server to stop accepting
//! requests, giving in-flight redirects a bounded time to finish.

use crate::Result;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shutdown coordinator shared by the server and the signal listener
#[derive(Debug, Clone)]
pub struct ShutdownCoordinator {
    token: CancellationToken,
    /// Drain period granted to in-flight requests
    timeout: Duration,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new(timeout: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once shutdown has been requested
    pub async fn triggered(&self) {
        self.token.cancelled().await
    }

    /// Wait for SIGTERM/SIGINT (Ctrl+C elsewhere) and trigger shutdown
    pub async fn listen_for_signals(&self) -> Result<()> {
        info!("Starting shutdown signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, initiating graceful shutdown");
                }
                _ = self.triggered() => {
                    return Ok(());
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                result = signal::ctrl_c() => {
                    result?;
                    info!("Received Ctrl+C, initiating graceful shutdown");
                }
                _ = self.triggered() => {
                    return Ok(());
                }
            }
        }

        self.trigger();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        let waiter = coordinator.clone();

        let handle = tokio::spawn(async move { waiter.triggered().await });

        assert!(!coordinator.is_triggered());
        coordinator.trigger();
        handle.await.unwrap();
        assert!(coordinator.is_triggered());
    }

    #[tokio::test]
    async fn test_signal_listener_returns_after_trigger() {
        let coordinator = ShutdownCoordinator::new(Duration::from_secs(5));
        coordinator.trigger();

        assert!(coordinator.listen_for_signals().await.is_ok());
    }
}
