//! Reverse proxy for chat-completion APIs that repairs tool definitions in
//! request bodies and records every exchange as a JSON file.

pub mod audit;
pub mod config;
pub mod error;
pub mod handlers;
pub mod proxy;
pub mod sanitizer;
pub mod state;

use axum::{routing::post, Router};
use tower_http::trace::TraceLayer;

pub use crate::{config::AppConfig, error::AppError, state::AppState};

/// Builds the router: every path accepts POST and is forwarded upstream verbatim.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/*path", post(handlers::proxy_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
