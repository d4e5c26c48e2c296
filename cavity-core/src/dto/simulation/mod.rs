//! Simulation DTOs

use serde::{Deserialize, Serialize};

use crate::domain::simulation::SimulationParams;
use crate::validation::ValidationError;

/// Submission body
///
/// Omitted fields are left out of the JSON so the orchestrator applies its
/// own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSimulation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nx: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ny: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reynolds_number: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lid_velocity: Option<f64>,
}

impl From<SimulationParams> for CreateSimulation {
    fn from(params: SimulationParams) -> Self {
        Self {
            nx: Some(params.nx),
            ny: Some(params.ny),
            reynolds_number: Some(params.reynolds_number),
            steps: Some(params.steps),
            dt: Some(params.dt),
            lid_velocity: Some(params.lid_velocity),
        }
    }
}

/// Error body returned by the REST surface
///
/// `field` is only present for validation failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }
}

impl From<ValidationError> for ErrorResponse {
    fn from(err: ValidationError) -> Self {
        Self {
            message: err.message,
            field: err.field,
        }
    }
}
