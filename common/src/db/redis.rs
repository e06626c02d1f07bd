// Redis connection used by the shared debounce gate

use crate::config::RedisConfig;
use crate::errors::StorageError;
use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

/// Cloneable handle to a multiplexed, auto-reconnecting Redis connection
#[derive(Clone)]
pub struct RedisPool {
    manager: ConnectionManager,
}

impl RedisPool {
    #[instrument(skip(config), fields(redis_url = %config.url))]
    pub async fn new(config: &RedisConfig) -> Result<Self, StorageError> {
        let client = Client::open(config.url.as_str()).map_err(|e| {
            StorageError::ConnectionFailed(format!("Failed to create Redis client: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            StorageError::ConnectionFailed(format!("Failed to create connection manager: {}", e))
        })?;

        info!("Redis connection ready");
        Ok(Self { manager })
    }

    pub fn get_connection(&self) -> ConnectionManager {
        self.manager.clone()
    }

    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), StorageError> {
        let mut conn = self.get_connection();
        let response: String = redis::cmd("PING").query_async(&mut conn).await?;

        if response != "PONG" {
            return Err(StorageError::RedisError(format!(
                "Unexpected PING response: {}",
                response
            )));
        }
        Ok(())
    }
}
