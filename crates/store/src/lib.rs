mod bounded_log;
mod config;
mod entity_store;
mod error;
mod id;

pub use bounded_log::BoundedLog;
pub use config::LogConfig;
pub use entity_store::{Entity, EntityStore};
pub use error::StoreError;
pub use id::{generate_id, resolve_id};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
