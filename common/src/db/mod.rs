// Database layer: PostgreSQL content store adapter and Redis connection

pub mod pool;
pub mod redis;
pub mod repositories;

pub use pool::DbPool;
pub use redis::RedisPool;
