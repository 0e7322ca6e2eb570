use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub const INVALID_JSON_MESSAGE: &str = "Request body must be JSON";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{}", INVALID_JSON_MESSAGE)]
    InvalidJson,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    InvalidUpstreamBody(String),

    #[error("Failed to read request body: {0}")]
    Body(#[from] axum::Error),

    #[error("Failed to build response: {0}")]
    Http(#[from] http::Error),
}

impl AppError {
    /// Wraps a failure talking to the upstream API in the message relayed to the caller.
    pub fn upstream(cause: impl std::fmt::Display) -> Self {
        AppError::Upstream(format!("Error forwarding request to upstream API: {}", cause))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson => StatusCode::BAD_REQUEST,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::InvalidUpstreamBody(_) | AppError::Body(_) | AppError::Http(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
