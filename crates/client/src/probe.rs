//! Backend reachability probe.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::Duration;

use crate::api::HealthCheck;
use crate::types::ConnectivityStatus;

/// Issues one bounded health request and publishes the verdict.
///
/// Failures never escape: any error, non-2xx status, or timeout becomes
/// [`ConnectivityStatus::Disconnected`].
pub struct ConnectionProbe {
    health: Arc<dyn HealthCheck>,
    timeout: Duration,
    status: watch::Sender<ConnectivityStatus>,
}

impl ConnectionProbe {
    /// The indicator starts as disconnected until the first probe answers.
    pub fn new(health: Arc<dyn HealthCheck>, timeout: Duration) -> Self {
        let (status, _rx) = watch::channel(ConnectivityStatus::Disconnected);
        Self {
            health,
            timeout,
            status,
        }
    }

    pub async fn probe(&self) -> ConnectivityStatus {
        let status = match tokio::time::timeout(self.timeout, self.health.health()).await {
            Ok(Ok(())) => ConnectivityStatus::Connected,
            Ok(Err(err)) => {
                tracing::debug!(error = %err, "health probe failed");
                ConnectivityStatus::Disconnected
            }
            Err(_) => {
                tracing::debug!(timeout = ?self.timeout, "health probe timed out");
                ConnectivityStatus::Disconnected
            }
        };

        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::info!(status = status.as_str(), "backend connectivity changed");
        }
        status
    }

    /// Result of the most recent probe.
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    /// Receiver for the connectivity indicator.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.subscribe()
    }
}
