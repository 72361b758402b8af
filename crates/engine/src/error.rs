use thiserror::Error;

/// Engine errors
///
/// These are unexpected internal faults. Missing entities are not errors:
/// handlers answer them with a soft error payload.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Handler {handler} failed: {reason}")]
    HandlerFault {
        handler: &'static str,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] neuromesh_store::StoreError),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// Build a handler fault
    pub fn fault(handler: &'static str, reason: impl Into<String>) -> Self {
        Self::HandlerFault {
            handler,
            reason: reason.into(),
        }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
