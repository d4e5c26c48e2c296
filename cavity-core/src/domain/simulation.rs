//! Simulation domain types

use serde::{Deserialize, Serialize};

/// Simulation job record
///
/// Created by the orchestrator when a submission is accepted and mutated only
/// by the lifecycle controller until it reaches a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Simulation {
    pub id: i64,
    pub status: SimulationStatus,
    pub config: SimulationParams,
    /// Public location of the rendered artifact, set only once completed
    pub output_video_url: Option<String>,
    /// Combined solver output, set only once terminal
    pub diagnostics: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Simulation {
    /// Returns true once no further transitions can happen
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Simulation lifecycle status
///
/// Transitions only move forward: `Pending -> Running -> Completed | Failed`.
/// `Pending -> Failed` is allowed for faults that occur before `Running`
/// could be persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl SimulationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulationStatus::Pending => "pending",
            SimulationStatus::Running => "running",
            SimulationStatus::Completed => "completed",
            SimulationStatus::Failed => "failed",
        }
    }

    /// Parses the lower-case storage representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SimulationStatus::Pending),
            "running" => Some(SimulationStatus::Running),
            "completed" => Some(SimulationStatus::Completed),
            "failed" => Some(SimulationStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SimulationStatus::Completed | SimulationStatus::Failed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: SimulationStatus) -> bool {
        use SimulationStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }

    /// Statuses from which `next` may be entered
    pub fn predecessors(next: SimulationStatus) -> &'static [SimulationStatus] {
        use SimulationStatus::*;
        match next {
            Pending => &[],
            Running => &[Pending],
            Completed => &[Running],
            Failed => &[Pending, Running],
        }
    }
}

impl std::fmt::Display for SimulationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated solver parameters captured at submission time
///
/// Never mutated after the record is created. Use
/// [`crate::validation::validate_request`] to build one from untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    /// Grid cells along x
    pub nx: u32,
    /// Grid cells along y
    pub ny: u32,
    pub reynolds_number: f64,
    pub steps: u32,
    /// Time increment per step
    pub dt: f64,
    /// Velocity of the moving lid (boundary)
    pub lid_velocity: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            nx: 50,
            ny: 50,
            reynolds_number: 100.0,
            steps: 500,
            dt: 0.01,
            lid_velocity: 1.0,
        }
    }
}
