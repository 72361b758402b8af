// Re-export the JSON value type used for open payloads
pub use serde_json::Value;

// Module exports
pub mod common;
pub mod envelope;
pub mod kind;
pub mod payload;

// Re-export commonly used types
pub use common::*;
pub use envelope::*;
pub use kind::*;
pub use payload::*;
