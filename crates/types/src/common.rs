use crate::{MessageEnvelope, Payload};
use neuromesh_macros::{standard, standard_enum};
use std::collections::BTreeMap;

/// Liveness of a service instance
#[standard_enum]
pub enum HealthStatus {
    /// Constructed and able to process envelopes
    Healthy,
    /// Entities report a low aggregate score
    Degraded,
    /// `shutdown()` has run
    Stopped,
}

/// Health report, answerable at any time after construction
#[standard]
pub struct Health {
    pub service: String,
    pub status: HealthStatus,
    pub initialized: bool,
    /// Aggregate domain score in `[0, 1]`, `1.0` when no entities exist
    pub score: f64,
}

impl Health {
    /// Score below which a running service reports itself degraded
    pub const DEGRADED_BELOW: f64 = 0.3;

    pub fn new(service: impl Into<String>, initialized: bool, stopped: bool, score: f64) -> Self {
        let score = crate::clamp_unit(score);
        let status = if stopped {
            HealthStatus::Stopped
        } else if score < Self::DEGRADED_BELOW {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };
        Self {
            service: service.into(),
            status,
            initialized,
            score,
        }
    }

    pub const fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

/// Static description of a service
#[standard]
pub struct ServiceInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub message_types: Vec<String>,
    /// Entity count per store, keyed by store name
    pub entity_counts: BTreeMap<String, usize>,
}

/// Downstream message a handler wants delivered
///
/// Handlers never perform network calls. Delivery belongs to the transport.
#[standard]
pub struct OutboundIntent {
    pub destination: String,
    pub message_type: String,
    pub payload: Payload,
}

impl OutboundIntent {
    pub fn new(
        destination: impl Into<String>,
        message_type: impl Into<String>,
        payload: Payload,
    ) -> Self {
        Self {
            destination: destination.into(),
            message_type: message_type.into(),
            payload,
        }
    }

    /// Materialize this intent as an envelope sent by `source`
    pub fn to_envelope(&self, source: impl Into<String>) -> MessageEnvelope {
        MessageEnvelope::new(
            self.message_type.clone(),
            self.payload.clone(),
            source,
            self.destination.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_derivation() {
        assert!(Health::new("treasury", false, false, 1.0).is_healthy());
        assert_eq!(
            Health::new("treasury", true, false, 0.1).status,
            HealthStatus::Degraded
        );
        assert_eq!(
            Health::new("treasury", true, true, 1.0).status,
            HealthStatus::Stopped
        );
        assert_eq!(Health::new("treasury", true, false, 4.0).score, 1.0);
    }

    #[test]
    fn test_health_serialization() {
        let value = serde_json::to_value(Health::new("sales", true, false, 0.9)).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["initialized"], true);
    }

    #[test]
    fn test_intent_to_envelope() {
        let intent = OutboundIntent::new("state-management", "SYNC_STATE", Payload::new());
        let envelope = intent.to_envelope("treasury");

        assert_eq!(envelope.kind, "SYNC_STATE");
        assert_eq!(envelope.source, "treasury");
        assert_eq!(envelope.destination, "state-management");

        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value["messageType"], "SYNC_STATE");
    }
}
