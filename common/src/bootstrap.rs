// Bootstrap helpers shared by host binaries

use crate::config::{GateBackend, Settings};
use crate::db::repositories::{PgContentRepository, PgOptionsStore};
use crate::db::{DbPool, RedisPool};
use crate::debounce::{DebounceGate, InMemoryDebounceGate, RedisDebounceGate};
use crate::publisher::PublishingService;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Connect to the content store database and fail fast if it cannot answer
#[tracing::instrument(skip(settings))]
pub async fn init_database_pool(settings: &Settings) -> Result<DbPool> {
    let db_pool = DbPool::new(&settings.database)
        .await
        .context("Failed to initialize database pool")?;
    db_pool
        .health_check()
        .await
        .context("Content store failed its startup health check")?;
    Ok(db_pool)
}

/// Build the debounce gate selected by `publisher.gate_backend`
#[tracing::instrument(skip(settings))]
pub async fn init_debounce_gate(settings: &Settings) -> Result<Arc<dyn DebounceGate>> {
    let gate: Arc<dyn DebounceGate> = match settings.publisher.gate_backend {
        GateBackend::Redis => {
            let redis_pool = RedisPool::new(&settings.redis)
                .await
                .context("Failed to initialize Redis connection for debounce gate")?;
            redis_pool
                .health_check()
                .await
                .context("Redis failed its startup health check")?;
            Arc::new(RedisDebounceGate::new(redis_pool))
        }
        GateBackend::Memory => Arc::new(InMemoryDebounceGate::new()),
    };

    info!(backend = ?settings.publisher.gate_backend, "Debounce gate initialized");
    Ok(gate)
}

/// Wire the publisher service against the PostgreSQL content store
pub fn init_publishing_service(
    settings: &Settings,
    db_pool: DbPool,
    gate: Arc<dyn DebounceGate>,
) -> Arc<PublishingService> {
    let repository = Arc::new(PgContentRepository::new(db_pool.clone()));
    let options = Arc::new(PgOptionsStore::new(db_pool));

    Arc::new(PublishingService::new(
        settings.publisher.clone(),
        repository,
        gate,
        options,
    ))
}
