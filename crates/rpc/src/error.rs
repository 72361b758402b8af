use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use neuromesh_engine::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body returned for every internal failure
pub const INTERNAL_ERROR: &str = "Internal server error";

/// RPC errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Server error: {0}")]
    ServerError(String),
}

/// Error response
#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        // Internal detail stays in the logs
        let (status, error_message) = match self {
            RpcError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            RpcError::Engine(_) | RpcError::Metrics(_) | RpcError::ServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_ERROR.to_string(),
            ),
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}
