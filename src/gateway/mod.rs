//! HTTP gateway (Axum) over [`ReclaimService`](crate::service::ReclaimService).

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{
    claim_report_handler, dismiss_match_handler, potential_matches_handler, review_claim_handler,
    submit_claim_handler, trigger_matching_handler,
};
pub use state::HandlerState;

/// Response header carrying a short machine-readable outcome.
pub const RECLAIM_STATUS_HEADER: &str = "x-reclaim-status";

pub fn create_router(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/v1/items/{id}/match", post(trigger_matching_handler))
        .route("/v1/items/{id}/matches", get(potential_matches_handler))
        .route("/v1/matches/{id}/dismiss", post(dismiss_match_handler))
        .route("/v1/claims", post(submit_claim_handler))
        .route("/v1/claims/{id}/report", get(claim_report_handler))
        .route("/v1/claims/{id}/review", post(review_claim_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    /// `"configured"` or `"unavailable"`; AI steps are skipped when unavailable.
    pub ai: &'static str,
    /// `"vector"` or `"recency"`.
    pub retrieval: &'static str,
}

#[tracing::instrument(skip(state))]
pub async fn health_handler(State(state): State<HandlerState>) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(RECLAIM_STATUS_HEADER, HeaderValue::from_static("healthy"));

    let components = ComponentStatus {
        ai: if state.ai_enabled {
            "configured"
        } else {
            "unavailable"
        },
        retrieval: if state.vector_index {
            "vector"
        } else {
            "recency"
        },
    };

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse {
            status: "ok",
            components,
        }),
    )
        .into_response()
}
