//! HTTP gateway (axum) for the screening pipeline.
//!
//! One upload endpoint plus a health probe. All request-scoped state lives in
//! explicit values threaded through the handler; nothing is attached to the
//! request object ad hoc.

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{ProcessResponse, process_handler};
pub use state::HandlerState;

use crate::evaluate::GenerationBackend;

pub fn create_router_with_state<P>(state: HandlerState<P>) -> Router
where
    P: GenerationBackend + Clone + Send + Sync + 'static,
{
    let body_limit = state.limits.max_body_bytes();
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/process", post(process_handler::<P>))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}
