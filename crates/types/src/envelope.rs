use crate::Payload;
use chrono::{DateTime, Utc};
use neuromesh_macros::standard;
use uuid::Uuid;

/// Suffix appended to a request type to name its response
pub const RESPONSE_SUFFIX: &str = "_RESPONSE";

/// Uniform request/response record exchanged with a domain service
///
/// An envelope is never mutated once built. Responses are fresh envelopes
/// produced by [`MessageEnvelope::reply`].
#[standard]
pub struct MessageEnvelope {
    /// Unique identifier assigned at creation
    pub id: String,
    /// Message-type tag selecting the handler
    #[serde(rename = "type")]
    pub kind: String,
    /// Open mapping of request-specific fields
    #[serde(default)]
    pub payload: Payload,
    /// Logical sender
    pub source: String,
    /// Logical receiver
    pub destination: String,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Build a new envelope with a fresh id and timestamp
    pub fn new(
        kind: impl Into<String>,
        payload: Payload,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            kind: kind.into(),
            payload,
            source: source.into(),
            destination: destination.into(),
            timestamp: Utc::now(),
        }
    }

    /// Build the response to this envelope, addressed back to its sender
    pub fn reply(&self, responder: impl Into<String>, payload: Payload) -> Self {
        Self::new(
            format!("{}{}", self.kind, RESPONSE_SUFFIX),
            payload,
            responder,
            self.source.clone(),
        )
    }

    /// Whether this envelope is a response produced by [`Self::reply`]
    pub fn is_response(&self) -> bool {
        self.kind.ends_with(RESPONSE_SUFFIX)
    }
}

/// Create a message envelope
pub fn create_message(
    kind: impl Into<String>,
    payload: Payload,
    source: impl Into<String>,
    destination: impl Into<String>,
) -> MessageEnvelope {
    MessageEnvelope::new(kind, payload, source, destination)
}
