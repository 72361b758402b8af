use crate::{HealthResponse, HostState, Outcome, ProcessRequest, RpcError};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use neuromesh_types::{MessageEnvelope, Payload, ServiceInfo, create_message};
use std::time::Instant;

/// Reply envelope addressing, carried alongside the payload body
pub const MESSAGE_ID_HEADER: HeaderName = HeaderName::from_static("x-message-id");
pub const MESSAGE_TYPE_HEADER: HeaderName = HeaderName::from_static("x-message-type");
pub const MESSAGE_DESTINATION_HEADER: HeaderName =
    HeaderName::from_static("x-message-destination");

/// Run one envelope through the service and map the result to HTTP
///
/// - response envelope → 200 with its payload as the body, soft errors included
/// - unrecognized type → 204
/// - handler fault → 500 with a generic body
async fn dispatch(state: &HostState, envelope: MessageEnvelope) -> Result<Response, RpcError> {
    let started = Instant::now();
    let (name, result) = {
        let mut service = state.service.write().await;
        (service.name(), service.process(&envelope))
    };
    let elapsed = started.elapsed().as_secs_f64();

    let outcome = match &result {
        Ok(Some(_)) => Outcome::Handled,
        Ok(None) => Outcome::Unrecognized,
        Err(e) => {
            tracing::error!(
                service = name,
                message_type = %envelope.kind,
                message_id = %envelope.id,
                "handler fault: {}",
                e
            );
            Outcome::Fault
        }
    };
    if let Some(metrics) = &state.metrics {
        metrics.record_message(name, &envelope.kind, outcome, elapsed);
    }

    match result? {
        Some(response) => {
            let mut reply = Json(response.payload).into_response();
            let headers = reply.headers_mut();
            for (name, value) in [
                (MESSAGE_ID_HEADER, &response.id),
                (MESSAGE_TYPE_HEADER, &response.kind),
                (MESSAGE_DESTINATION_HEADER, &response.destination),
            ] {
                if let Ok(value) = HeaderValue::from_str(value) {
                    headers.insert(name, value);
                }
            }
            Ok(reply)
        }
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Process a request envelope
pub async fn process(
    State(state): State<HostState>,
    Json(req): Json<ProcessRequest>,
) -> Result<Response, RpcError> {
    if req.kind.trim().is_empty() {
        return Err(RpcError::InvalidRequest("message type is required".to_string()));
    }
    let envelope = create_message(req.kind, req.payload, req.source, state.name());
    dispatch(&state, envelope).await
}

/// Process a message whose type is given in the path and payload in the body
pub async fn process_typed(
    State(state): State<HostState>,
    Path(message_type): Path<String>,
    Json(payload): Json<Payload>,
) -> Result<Response, RpcError> {
    let envelope = create_message(message_type, payload, "gateway", state.name());
    dispatch(&state, envelope).await
}

/// Health check handler
pub async fn health(State(state): State<HostState>) -> Json<HealthResponse> {
    let health = state.service.read().await.health();
    Json(HealthResponse {
        health,
        uptime_seconds: state.started_at.elapsed().as_secs(),
    })
}

/// Service info handler
pub async fn info(State(state): State<HostState>) -> Json<ServiceInfo> {
    Json(state.service.read().await.info())
}

/// Metrics endpoint handler
pub async fn metrics(State(state): State<HostState>) -> Result<String, RpcError> {
    let Some(metrics) = &state.metrics else {
        return Ok("# Metrics not enabled\n".to_string());
    };
    let info = state.service.read().await.info();
    metrics.set_entities(&info.name, &info.entity_counts);
    Ok(metrics.export()?)
}
