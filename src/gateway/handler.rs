use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use super::error::GatewayError;
use super::state::HandlerState;
use crate::model::{ClaimDecision, NewClaim};

#[derive(Debug, Serialize)]
pub struct JobAccepted {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ClaimCreated {
    pub claim_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ClaimDecision,
}

fn parse_id(raw: &str) -> Result<Uuid, GatewayError> {
    Uuid::parse_str(raw.trim())
        .map_err(|e| GatewayError::InvalidRequest(format!("invalid id '{raw}': {e}")))
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, GatewayError> {
    serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {e}")))
}

#[instrument(skip(state))]
pub async fn trigger_matching_handler(
    State(state): State<HandlerState>,
    Path(item_id): Path<String>,
) -> Result<Response, GatewayError> {
    let job_id = state.service.trigger_matching(parse_id(&item_id)?).await?;
    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id })).into_response())
}

#[instrument(skip(state))]
pub async fn potential_matches_handler(
    State(state): State<HandlerState>,
    Path(item_id): Path<String>,
) -> Result<Response, GatewayError> {
    let matches = state
        .service
        .get_potential_matches(parse_id(&item_id)?)
        .await?;
    Ok(Json(matches).into_response())
}

#[instrument(skip(state))]
pub async fn dismiss_match_handler(
    State(state): State<HandlerState>,
    Path(match_id): Path<String>,
) -> Result<Response, GatewayError> {
    state.service.dismiss_match(parse_id(&match_id)?).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[instrument(skip(state, body))]
pub async fn submit_claim_handler(
    State(state): State<HandlerState>,
    Json(body): Json<Value>,
) -> Result<Response, GatewayError> {
    let claim: NewClaim = parse_body(body)?;
    let claim_id = state.service.submit_claim(claim).await?;
    Ok((StatusCode::CREATED, Json(ClaimCreated { claim_id })).into_response())
}

#[instrument(skip(state))]
pub async fn claim_report_handler(
    State(state): State<HandlerState>,
    Path(claim_id): Path<String>,
) -> Result<Response, GatewayError> {
    let report = state.service.claim_report(parse_id(&claim_id)?).await?;
    Ok(Json(report).into_response())
}

#[instrument(skip(state, body))]
pub async fn review_claim_handler(
    State(state): State<HandlerState>,
    Path(claim_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, GatewayError> {
    let claim_id = parse_id(&claim_id)?;
    let review: ReviewRequest = parse_body(body)?;
    let claim = state.service.review_claim(claim_id, review.decision).await?;
    Ok(Json(claim).into_response())
}
