// Periodic publisher host: fires the overdue-content pipeline on a fixed interval

use anyhow::Context;
use common::bootstrap;
use common::config::Settings;
use common::scheduler::PeriodicTrigger;
use common::telemetry;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.tracing_endpoint.as_deref(),
    )?;
    telemetry::init_metrics(settings.observability.metrics_port)?;

    info!(
        gate_backend = ?settings.publisher.gate_backend,
        interval_seconds = settings.publisher.periodic_interval_seconds,
        max_items_per_run = settings.publisher.max_items_per_run,
        "Starting content publisher scheduler"
    );

    let db_pool = bootstrap::init_database_pool(&settings).await?;
    let gate = bootstrap::init_debounce_gate(&settings).await?;
    let service = bootstrap::init_publishing_service(&settings, db_pool.clone(), gate);

    service
        .activate()
        .await
        .context("Failed to activate content publisher")?;

    let trigger = Arc::new(PeriodicTrigger::new(
        service.clone(),
        settings.publisher.periodic_interval(),
    ));

    let trigger_for_shutdown = trigger.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        trigger_for_shutdown.stop();
    });

    trigger.start().await;

    if let Err(e) = service.deactivate().await {
        error!(error = %e, "Failed to deactivate content publisher");
    }
    db_pool.close().await;
    telemetry::shutdown_tracer();

    info!("Scheduler stopped");
    Ok(())
}
