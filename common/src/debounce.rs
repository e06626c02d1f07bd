// Debounce gate: a short-lived marker that keeps overlapping triggers from
// re-running the scan within a time window.
//
// The gate is a throughput optimisation. Double publication is prevented by
// the executor re-reading each item before the transition, not by the gate.

use crate::db::RedisPool;
use crate::errors::GateError;
use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Check-and-set gate keyed by name
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DebounceGate: Send + Sync {
    /// Record "now" under `key` and return `true` when no unexpired record
    /// exists; return `false` otherwise. A zero `ttl` always acquires and
    /// records nothing.
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, GateError>;

    /// Remove the record for `key`, if any
    async fn clear(&self, key: &str) -> Result<(), GateError>;
}

/// Gate shared by every process connected to the same Redis instance.
///
/// Acquisition is a single `SET key value NX PX ttl`, so two callers can
/// never both acquire within one window. Expiry is handled by Redis.
pub struct RedisDebounceGate {
    pool: RedisPool,
}

impl RedisDebounceGate {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn record_key(key: &str) -> String {
        format!("debounce:{}", key)
    }
}

#[async_trait]
impl DebounceGate for RedisDebounceGate {
    #[instrument(skip(self), fields(ttl_ms = ttl.as_millis() as u64))]
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, GateError> {
        if ttl.is_zero() {
            return Ok(true);
        }

        let mut conn = self.pool.get_connection();
        let result: Option<String> = redis::cmd("SET")
            .arg(Self::record_key(key))
            .arg(Utc::now().timestamp())
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;

        let acquired = result.is_some();
        debug!(key, acquired, "Debounce gate checked");
        Ok(acquired)
    }

    #[instrument(skip(self))]
    async fn clear(&self, key: &str) -> Result<(), GateError> {
        let mut conn = self.pool.get_connection();
        let _: () = conn.del(Self::record_key(key)).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct GateRecord {
    fired_at: Instant,
    ttl: Duration,
}

impl GateRecord {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.fired_at) < self.ttl
    }
}

/// Process-local gate.
///
/// Atomic for every caller in this process. Separate processes each hold
/// their own records, so they may scan concurrently.
#[derive(Debug, Default)]
pub struct InMemoryDebounceGate {
    records: Mutex<HashMap<String, GateRecord>>,
}

impl InMemoryDebounceGate {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DebounceGate for InMemoryDebounceGate {
    async fn try_acquire(&self, key: &str, ttl: Duration) -> Result<bool, GateError> {
        if ttl.is_zero() {
            return Ok(true);
        }

        let now = Instant::now();
        let mut records = self
            .records
            .lock()
            .map_err(|_| GateError::Unavailable("gate state poisoned".to_string()))?;

        // Expired records are replaced on read
        if records.get(key).is_some_and(|record| record.is_live(now)) {
            return Ok(false);
        }

        records.insert(key.to_string(), GateRecord { fired_at: now, ttl });
        Ok(true)
    }

    async fn clear(&self, key: &str) -> Result<(), GateError> {
        self.records
            .lock()
            .map_err(|_| GateError::Unavailable("gate state poisoned".to_string()))?
            .remove(key);
        Ok(())
    }
}
