mod error;
mod handlers;
mod metrics;
mod types;

pub use error::*;
pub use handlers::{MESSAGE_DESTINATION_HEADER, MESSAGE_ID_HEADER, MESSAGE_TYPE_HEADER};
pub use metrics::*;
pub use types::*;

use axum::{
    Router,
    routing::{get, post},
};
use neuromesh_engine::DomainService;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Host state shared by all handlers
///
/// `process` takes the write lock so handlers never interleave on the same
/// stores. Health and info take the read lock.
#[derive(Clone)]
pub struct HostState {
    /// The hosted service
    pub service: Arc<RwLock<Box<dyn DomainService>>>,
    /// Metrics collector (optional)
    pub metrics: Option<Arc<Metrics>>,
    /// Host start time
    pub started_at: Instant,
    name: &'static str,
}

impl HostState {
    /// Create a new host state
    pub fn new(service: Box<dyn DomainService>) -> Self {
        Self {
            name: service.name(),
            service: Arc::new(RwLock::new(service)),
            metrics: None,
            started_at: Instant::now(),
        }
    }

    /// Create a new host state with metrics
    pub fn new_with_metrics(service: Box<dyn DomainService>, metrics: Metrics) -> Self {
        Self {
            metrics: Some(Arc::new(metrics)),
            ..Self::new(service)
        }
    }

    /// Name of the hosted service
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Create the host router
pub fn create_router(state: HostState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Service description
        .route("/info", get(handlers::info))
        // Metrics endpoint
        .route("/metrics", get(handlers::metrics))
        // Message endpoints
        .route("/process", post(handlers::process))
        .route("/messages/{message_type}", post(handlers::process_typed))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the host server and run until `shutdown` resolves
pub async fn start_server(
    state: HostState,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), RpcError> {
    let service = state.name();
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| RpcError::ServerError(e.to_string()))?;

    tracing::info!("RPC server for {} listening on {}", service, addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| RpcError::ServerError(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_engine::{FastRandSource, ServiceKind};

    #[test]
    fn test_host_state() {
        let service = ServiceKind::Market.instantiate(Box::new(FastRandSource::seeded(1)));
        let state = HostState::new(service);

        assert_eq!(state.name(), "market");
        assert!(state.metrics.is_none());
        assert!(state.service.try_read().is_ok());
    }
}
