// Trigger dispatcher: the two entry points into the scan+publish pipeline

use crate::config::PublisherConfig;
use crate::content_types::{ContentTypeFilter, ContentTypeResolver};
use crate::debounce::DebounceGate;
use crate::errors::{PublishError, RepositoryError};
use crate::models::{PublicationResult, PublisherStatus, RenderContext, ScanFilter};
use crate::publisher::{DueItemScanner, PublicationExecutor, PERIODIC_ENABLED_OPTION};
use crate::repository::{ContentRepository, OptionsStore};
use crate::telemetry;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Which entry point started a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Opportunistic,
    Periodic,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Opportunistic => "opportunistic",
            TriggerKind::Periodic => "periodic",
        }
    }
}

/// Why a trigger did not run the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Request is not a public, primary, high-traffic render
    Ineligible,
    /// Another cycle acquired the gate within the debounce window
    GateHeld,
    /// The gate's backing store failed; the cycle is skipped rather than run unguarded
    GateUnavailable,
    /// The host has the periodic trigger switched off
    PeriodicDisabled,
    /// The host option holding the periodic flag could not be read
    SettingsUnavailable,
}

/// Result of a trigger invocation. Logged at the boundary, never propagated to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Skipped(SkipReason),
    Completed(PublicationResult),
    Failed {
        reason: String,
        partial: Option<PublicationResult>,
    },
}

impl CycleOutcome {
    /// Skip outcome, counted under `publish_cycles_total{outcome="skipped"}`
    pub(crate) fn skipped(trigger: TriggerKind, reason: SkipReason) -> Self {
        telemetry::record_cycle(trigger.as_str(), "skipped", 0.0);
        CycleOutcome::Skipped(reason)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Skipped(_) => "skipped",
            CycleOutcome::Completed(_) => "completed",
            CycleOutcome::Failed { .. } => "failed",
        }
    }

    pub fn published(&self) -> usize {
        match self {
            CycleOutcome::Completed(result) => result.published,
            CycleOutcome::Failed {
                partial: Some(partial),
                ..
            } => partial.published,
            _ => 0,
        }
    }
}

/// Publisher service. Construct once at startup and hand a shared reference
/// to whatever registers the render hook and the periodic trigger.
pub struct PublishingService {
    config: PublisherConfig,
    repository: Arc<dyn ContentRepository>,
    gate: Arc<dyn DebounceGate>,
    options: Arc<dyn OptionsStore>,
    content_types: ContentTypeResolver,
    scanner: DueItemScanner,
    executor: PublicationExecutor,
}

impl PublishingService {
    pub fn new(
        config: PublisherConfig,
        repository: Arc<dyn ContentRepository>,
        gate: Arc<dyn DebounceGate>,
        options: Arc<dyn OptionsStore>,
    ) -> Self {
        Self {
            content_types: ContentTypeResolver::from_config(&config),
            scanner: DueItemScanner::new(repository.clone()),
            executor: PublicationExecutor::new(repository.clone()),
            config,
            repository,
            gate,
            options,
        }
    }

    /// Register a host filter over the allowed content types
    pub fn with_content_type_filter(mut self, filter: Arc<dyn ContentTypeFilter>) -> Self {
        self.content_types = self.content_types.with_filter(filter);
        self
    }

    /// Scan for overdue items and publish them. Shared by both triggers.
    #[instrument(skip(self))]
    pub async fn run_pipeline(&self) -> Result<PublicationResult, PublishError> {
        let content_types = self
            .content_types
            .allowed_content_types(self.repository.as_ref())
            .await?;

        let filter = ScanFilter::new(content_types, Utc::now(), self.config.max_items_per_run)?;
        let ids = self.scanner.find_overdue(&filter).await?;
        if ids.is_empty() {
            return Ok(PublicationResult::default());
        }

        self.executor.publish_overdue(&ids).await
    }

    /// Opportunistic trigger, called while a content request is rendering.
    ///
    /// Never fails: every outcome is logged here and returned for inspection.
    #[instrument(skip(self), fields(page_kind = ?context.page_kind))]
    pub async fn on_render(&self, context: &RenderContext) -> CycleOutcome {
        if !context.is_eligible() {
            return CycleOutcome::skipped(TriggerKind::Opportunistic, SkipReason::Ineligible);
        }

        let ttl = self.config.debounce_ttl();
        match self.gate.try_acquire(&self.config.debounce_key, ttl).await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Debounce window still open, skipping cycle");
                return CycleOutcome::skipped(TriggerKind::Opportunistic, SkipReason::GateHeld);
            }
            Err(e) => {
                warn!(error = %e, "Debounce gate unavailable, skipping cycle");
                return CycleOutcome::skipped(
                    TriggerKind::Opportunistic,
                    SkipReason::GateUnavailable,
                );
            }
        }

        self.run_cycle(TriggerKind::Opportunistic).await
    }

    /// Periodic trigger, called by an external fixed-interval scheduler.
    ///
    /// The scheduler never fires overlapping ticks, so the gate is not consulted.
    #[instrument(skip(self))]
    pub async fn on_periodic_tick(&self) -> CycleOutcome {
        self.run_cycle(TriggerKind::Periodic).await
    }

    async fn run_cycle(&self, trigger: TriggerKind) -> CycleOutcome {
        let cycle_id = Uuid::new_v4();
        let started = Instant::now();

        let outcome = match self.run_pipeline().await {
            Ok(result) => {
                if result.is_empty() {
                    debug!(%cycle_id, trigger = trigger.as_str(), "No overdue content");
                } else {
                    info!(
                        %cycle_id,
                        trigger = trigger.as_str(),
                        attempted = result.attempted,
                        published = result.published,
                        skipped = result.skipped,
                        errors = result.errors.len(),
                        "Publication cycle completed"
                    );
                }
                CycleOutcome::Completed(result)
            }
            Err(e) => {
                let partial = e.partial().cloned();
                error!(
                    %cycle_id,
                    trigger = trigger.as_str(),
                    error = %e,
                    attempted_so_far = partial.as_ref().map_or(0, |p| p.attempted),
                    published_so_far = partial.as_ref().map_or(0, |p| p.published),
                    "Publication cycle failed"
                );
                CycleOutcome::Failed {
                    reason: e.to_string(),
                    partial,
                }
            }
        };

        telemetry::record_cycle(
            trigger.as_str(),
            outcome.as_str(),
            started.elapsed().as_secs_f64(),
        );
        outcome
    }

    /// Current value of the host's periodic flag, falling back to the configured default
    pub async fn periodic_enabled(&self) -> Result<bool, RepositoryError> {
        let stored = self.options.get_bool(PERIODIC_ENABLED_OPTION).await?;
        Ok(stored.unwrap_or(self.config.enable_periodic))
    }

    pub async fn enable_periodic(&self) -> Result<(), RepositoryError> {
        self.options.set_bool(PERIODIC_ENABLED_OPTION, true).await?;
        info!("Periodic publishing enabled");
        Ok(())
    }

    pub async fn disable_periodic(&self) -> Result<(), RepositoryError> {
        self.options.set_bool(PERIODIC_ENABLED_OPTION, false).await?;
        info!("Periodic publishing disabled");
        Ok(())
    }

    /// First-start bookkeeping: seed the periodic flag and reopen the gate
    #[instrument(skip(self))]
    pub async fn activate(&self) -> Result<(), anyhow::Error> {
        let seeded = self
            .options
            .add_bool(PERIODIC_ENABLED_OPTION, self.config.enable_periodic)
            .await?;
        self.gate.clear(&self.config.debounce_key).await?;

        info!(periodic_flag_seeded = seeded, "Content publisher activated");
        Ok(())
    }

    /// Shutdown bookkeeping: reopen the gate so the next start scans immediately
    #[instrument(skip(self))]
    pub async fn deactivate(&self) -> Result<(), anyhow::Error> {
        self.gate.clear(&self.config.debounce_key).await?;
        info!("Content publisher deactivated");
        Ok(())
    }

    pub async fn status(&self) -> Result<PublisherStatus, RepositoryError> {
        Ok(PublisherStatus {
            version: env!("CARGO_PKG_VERSION").to_string(),
            allowed_content_types: self
                .content_types
                .allowed_content_types(self.repository.as_ref())
                .await?,
            debounce_ttl_seconds: self.config.debounce_ttl_seconds,
            max_items_per_run: self.config.max_items_per_run,
            periodic_enabled: self.periodic_enabled().await?,
        })
    }
}
