// PostgreSQL adapters for the content repository and host options

pub mod content;
pub mod options;
pub mod queries;

pub use content::PgContentRepository;
pub use options::PgOptionsStore;
