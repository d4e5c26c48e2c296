//! Simulation API Handlers
//!
//! HTTP endpoints for submitting simulations and polling their status.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use cavity_core::domain::simulation::Simulation;
use cavity_core::validation::ValidationError;

use crate::api::AppState;
use crate::api::error::{ApiError, ApiResult};
use crate::service::simulation_service;

/// GET /api/simulations
/// List all simulations, most recent first
pub async fn list_simulations(State(state): State<AppState>) -> ApiResult<Json<Vec<Simulation>>> {
    tracing::debug!("Listing simulations");

    let sims = simulation_service::list(state.store.as_ref()).await?;

    Ok(Json(sims))
}

/// GET /api/simulations/{id}
/// Get a simulation by ID
///
/// Ids that are not integers cannot exist, so they are reported as not found.
pub async fn get_simulation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Simulation>> {
    tracing::debug!("Getting simulation: {}", id);

    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::NotFound("Simulation not found".to_string()))?;

    let sim = simulation_service::get(state.store.as_ref(), id).await?;

    Ok(Json(sim))
}

/// POST /api/simulations
/// Validate parameters, create a pending simulation and start it
pub async fn create_simulation(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Simulation>)> {
    let Json(body) = payload.map_err(|rejection| {
        ApiError::Validation(ValidationError {
            field: None,
            message: rejection.body_text(),
        })
    })?;

    let sim = simulation_service::submit(state.store.as_ref(), &state.dispatcher, &body).await?;

    Ok((StatusCode::CREATED, Json(sim)))
}
