use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::RECLAIM_STATUS_HEADER;
use crate::service::ServiceError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl From<ServiceError> for GatewayError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::ItemNotFound { .. }
            | ServiceError::ClaimNotFound { .. }
            | ServiceError::MatchNotFound { .. } => GatewayError::NotFound(err.to_string()),
            ServiceError::InvalidClaim { .. } => GatewayError::InvalidRequest(err.to_string()),
            ServiceError::AlreadyReviewed { .. } => GatewayError::Conflict(err.to_string()),
            ServiceError::Store(e) => GatewayError::StorageError(e.to_string()),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, reclaim_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            GatewayError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            GatewayError::StorageError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_error")
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            RECLAIM_STATUS_HEADER,
            HeaderValue::from_static(reclaim_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
