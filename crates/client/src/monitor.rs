//! Background connectivity monitor.

use std::sync::Arc;

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::activity::ActivityTracker;
use crate::poller::{AdaptivePoller, PollingConfig};
use crate::probe::ConnectionProbe;
use crate::types::ConnectivityStatus;

/// Drives an [`AdaptivePoller`]: probes when a tick is due, and pulls the
/// next tick forward when the operator comes back after a backoff.
///
/// The poller's single deadline is the only timer, and only this task
/// touches it, so a cancel-then-reschedule can never leave two loops running.
pub struct ConnectivityMonitor {
    poller: AdaptivePoller,
    probe: Arc<ConnectionProbe>,
    activity: ActivityTracker,
}

/// Handle to stop and join a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown: Arc<Notify>,
    status: watch::Receiver<ConnectivityStatus>,
    join: JoinHandle<()>,
}

impl MonitorHandle {
    /// Latest probe verdict, for the indicator.
    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.clone()
    }

    /// Request graceful shutdown and wait for the monitor to stop.
    ///
    /// A probe already in flight is awaited, not cancelled.
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(err) = self.join.await {
            tracing::error!(error = %err, "connectivity monitor task failed");
        }
    }
}

impl ConnectivityMonitor {
    pub fn new(config: PollingConfig, probe: Arc<ConnectionProbe>, activity: ActivityTracker) -> Self {
        Self {
            poller: AdaptivePoller::new(config),
            probe,
            activity,
        }
    }

    /// Start polling on the current tokio runtime.
    pub fn spawn(self) -> MonitorHandle {
        let shutdown = Arc::new(Notify::new());
        let status = self.probe.subscribe();
        let join = tokio::spawn(self.run(shutdown.clone()));

        MonitorHandle {
            shutdown,
            status,
            join,
        }
    }

    async fn run(mut self, shutdown: Arc<Notify>) {
        let mut activity_rx = self.activity.subscribe();
        activity_rx.borrow_and_update();

        tracing::info!(
            min = ?self.poller.config().min_interval(),
            max = ?self.poller.config().max_interval(),
            growth = self.poller.config().growth_factor(),
            idle_threshold = ?self.poller.config().idle_threshold(),
            "connectivity monitor started"
        );

        self.probe.probe().await;
        self.poller.start(Instant::now());

        while let Some(deadline) = self.poller.deadline() {
            tokio::select! {
                _ = shutdown.notified() => break,
                _ = tokio::time::sleep_until(deadline) => {
                    self.probe.probe().await;
                    let now = Instant::now();
                    let next = self.poller.tick(now, self.activity.idle_for(now));
                    tracing::debug!(next = ?next, "next health probe scheduled");
                }
                changed = activity_rx.changed() => {
                    // `self.activity` keeps the sender alive, so this never closes.
                    if changed.is_ok() {
                        activity_rx.borrow_and_update();
                        if self.poller.on_activity(Instant::now()) {
                            tracing::debug!("operator active again; polling reset to minimum");
                            self.probe.probe().await;
                            self.poller.reschedule(Instant::now());
                        }
                    }
                }
            }
        }

        self.poller.stop();
        tracing::info!("connectivity monitor stopped");
    }
}
