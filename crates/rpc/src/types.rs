use neuromesh_types::{Health, Payload};
use serde::{Deserialize, Serialize};

fn default_source() -> String {
    "gateway".to_string()
}

/// Process request: the transport-facing half of an envelope
///
/// The host fills in id, timestamp and destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Message type tag
    #[serde(rename = "type")]
    pub kind: String,
    /// Request fields
    #[serde(default)]
    pub payload: Payload,
    /// Logical sender
    #[serde(default = "default_source")]
    pub source: String,
}

/// Health response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    #[serde(flatten)]
    pub health: Health,
    /// Seconds since the host started
    pub uptime_seconds: u64,
}
