// Scheduled content publisher: finds overdue scheduled content and publishes it once

pub mod bootstrap;
pub mod config;
pub mod content_types;
pub mod db;
pub mod debounce;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod publisher;
pub mod repository;
pub mod scheduler;
pub mod telemetry;
