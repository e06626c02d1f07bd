// Periodic trigger registration

pub mod periodic;

pub use periodic::PeriodicTrigger;
