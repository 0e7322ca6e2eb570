use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
};
use crate::{proxy::proxy_request_to_upstream, state::AppState};
use tracing::debug;

pub async fn proxy_request(State(state): State<AppState>, request: Request<Body>) -> Response {
    match proxy_request_to_upstream(&state, request).await {
        Ok(response) => response,
        Err(e) => {
            debug!(status = %e.status(), "Proxy error: {}", e);
            e.into_response()
        }
    }
}
