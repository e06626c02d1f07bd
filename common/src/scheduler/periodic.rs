// Fixed-interval driver for the periodic publication trigger

use crate::publisher::{CycleOutcome, PublishingService, SkipReason, TriggerKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

/// Fires the periodic trigger on a fixed interval while the host flag is on.
///
/// Ticks never overlap: a slow cycle delays the next tick instead of running
/// concurrently with it.
pub struct PeriodicTrigger {
    service: Arc<PublishingService>,
    interval: Duration,
    shutdown_tx: broadcast::Sender<()>,
}

impl PeriodicTrigger {
    pub fn new(service: Arc<PublishingService>, interval: Duration) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Self {
            service,
            interval,
            shutdown_tx,
        }
    }

    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// One firing: consult the host flag, then run the pipeline
    #[instrument(skip(self))]
    pub async fn tick(&self) -> CycleOutcome {
        match self.service.periodic_enabled().await {
            Ok(true) => self.service.on_periodic_tick().await,
            Ok(false) => {
                debug!("Periodic publishing disabled, tick ignored");
                CycleOutcome::skipped(TriggerKind::Periodic, SkipReason::PeriodicDisabled)
            }
            Err(e) => {
                error!(error = %e, "Failed to read periodic publishing flag");
                CycleOutcome::skipped(TriggerKind::Periodic, SkipReason::SettingsUnavailable)
            }
        }
    }

    /// Run until `stop` is called. The first tick fires immediately.
    #[instrument(skip(self), fields(interval_seconds = self.interval.as_secs()))]
    pub async fn start(&self) {
        info!("Starting periodic publication trigger");

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping periodic trigger");
                    break;
                }
                _ = ticker.tick() => {
                    // Outcome is already logged by the service
                    let _ = self.tick().await;
                }
            }
        }

        info!("Periodic publication trigger stopped");
    }

    /// Signal `start` to return once the in-flight tick, if any, completes
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
