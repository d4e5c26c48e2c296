//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cavity_core::dto::simulation::ErrorResponse;
use cavity_core::validation::ValidationError;

use crate::repository::StoreError;
use crate::service::simulation_service::SimulationError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(ValidationError),
    StoreError(StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            ApiError::Validation(err) => (StatusCode::BAD_REQUEST, ErrorResponse::from(err)),
            ApiError::StoreError(err) => {
                tracing::error!("Store error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Internal server error"),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<SimulationError> for ApiError {
    fn from(err: SimulationError) -> Self {
        match err {
            SimulationError::Validation(err) => ApiError::Validation(err),
            SimulationError::NotFound(_) => ApiError::NotFound("Simulation not found".to_string()),
            SimulationError::Store(err) => ApiError::StoreError(err),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
