// Overdue content detection and at-most-once publication

pub mod dispatcher;
pub mod executor;
pub mod scanner;

pub use dispatcher::{CycleOutcome, PublishingService, SkipReason, TriggerKind};
pub use executor::PublicationExecutor;
pub use scanner::DueItemScanner;

/// Host option holding the periodic trigger flag
pub const PERIODIC_ENABLED_OPTION: &str = "content_publisher_enable_periodic";
