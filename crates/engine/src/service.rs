use crate::EngineResult;
use neuromesh_types::{
    Health, MessageEnvelope, MessageKind, Payload, ServiceInfo, Value, to_payload,
};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Instant;

/// Domain-specific half of a service: stores, handlers and policies
///
/// A domain never sees raw message tags; [`ServiceRuntime`] parses them
/// into `Kind` before calling [`Domain::handle`].
pub trait Domain: Send + Sync + 'static {
    /// Closed set of message types this domain handles
    type Kind: MessageKind;

    /// Service name, used as `source` of every response
    const NAME: &'static str;

    /// One-line description for info reports
    const DESCRIPTION: &'static str;

    /// Seed default entities. Called at most once.
    fn seed(&mut self);

    /// Handle one message. Soft errors are `Ok` payloads with an `error` field.
    fn handle(&mut self, kind: Self::Kind, payload: &Payload) -> EngineResult<Value>;

    /// Mark entities terminal/inactive at shutdown
    fn retire(&mut self);

    /// Aggregate score in `[0, 1]`, `1.0` when there is nothing to score
    fn health_score(&self) -> f64;

    /// Entity count per store
    fn entity_counts(&self) -> BTreeMap<String, usize>;
}

/// Object-safe service contract consumed by the host
pub trait DomainService: Send + Sync {
    /// Service name
    fn name(&self) -> &'static str;

    /// Seed default entities. Idempotent.
    fn initialize(&mut self);

    /// Dispatch one envelope
    ///
    /// - `Ok(Some(_))`: handled (possibly with a soft error payload)
    /// - `Ok(None)`: unrecognized message type
    /// - `Err(_)`: unexpected internal fault
    fn process(&mut self, envelope: &MessageEnvelope) -> EngineResult<Option<MessageEnvelope>>;

    /// Mark entities inactive. State is discarded when the service is dropped.
    fn shutdown(&mut self);

    /// Health report. Valid before `initialize`.
    fn health(&self) -> Health;

    /// Static description plus current entity counts
    fn info(&self) -> ServiceInfo;

    /// Wire tags this service recognizes
    fn message_types(&self) -> Vec<&'static str>;
}

/// Lifecycle wrapper that turns a [`Domain`] into a [`DomainService`]
pub struct ServiceRuntime<D: Domain> {
    domain: D,
    initialized: bool,
    stopped: bool,
}

impl<D: Domain> ServiceRuntime<D> {
    pub fn new(domain: D) -> Self {
        Self {
            domain,
            initialized: false,
            stopped: false,
        }
    }

    /// Borrow the wrapped domain
    pub fn domain(&self) -> &D {
        &self.domain
    }

    /// Borrow the wrapped domain mutably
    pub fn domain_mut(&mut self) -> &mut D {
        &mut self.domain
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Dispatch a message with a known kind, skipping tag parsing
    pub fn dispatch(
        &mut self,
        envelope: &MessageEnvelope,
        kind: D::Kind,
    ) -> EngineResult<MessageEnvelope> {
        let started = Instant::now();
        tracing::debug!(
            service = D::NAME,
            message_type = kind.tag(),
            message_id = %envelope.id,
            source = %envelope.source,
            "dispatching message"
        );

        let result = self.domain.handle(kind, &envelope.payload)?;

        let mut payload = to_payload(result);
        payload.insert(
            "processingTime".to_string(),
            json!(started.elapsed().as_secs_f64() * 1_000.0),
        );
        payload.insert("source".to_string(), json!(D::NAME));

        Ok(envelope.reply(D::NAME, payload))
    }
}

impl<D: Domain> DomainService for ServiceRuntime<D> {
    fn name(&self) -> &'static str {
        D::NAME
    }

    fn initialize(&mut self) {
        if self.initialized {
            return;
        }
        self.domain.seed();
        self.initialized = true;
        self.stopped = false;
        tracing::info!(service = D::NAME, "service initialized");
    }

    fn process(&mut self, envelope: &MessageEnvelope) -> EngineResult<Option<MessageEnvelope>> {
        let Some(kind) = D::Kind::from_tag(&envelope.kind) else {
            tracing::warn!(
                service = D::NAME,
                message_type = %envelope.kind,
                "unrecognized message type"
            );
            return Ok(None);
        };

        self.dispatch(envelope, kind).map(Some)
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.domain.retire();
        self.stopped = true;
        tracing::info!(service = D::NAME, "service shut down");
    }

    fn health(&self) -> Health {
        Health::new(
            D::NAME,
            self.initialized,
            self.stopped,
            self.domain.health_score(),
        )
    }

    fn info(&self) -> ServiceInfo {
        ServiceInfo {
            name: D::NAME.to_string(),
            description: D::DESCRIPTION.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            message_types: D::Kind::tags().into_iter().map(str::to_string).collect(),
            entity_counts: self.domain.entity_counts(),
        }
    }

    fn message_types(&self) -> Vec<&'static str> {
        D::Kind::tags()
    }
}

/// Serialize an entity for a response payload
pub(crate) fn to_json<T: Serialize>(value: &T) -> EngineResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Soft not-found response: `{error, <key>: <id>}`
pub(crate) fn soft_error(message: &str, key: &str, id: &str) -> Value {
    let mut body = Payload::new();
    body.insert("error".to_string(), json!(message));
    body.insert(key.to_string(), json!(id));
    Value::Object(body)
}
