//! Repository Module
//!
//! Data access layer for the orchestrator.
//!
//! [`SimulationStore`] is the seam between the orchestration engine and
//! storage. The PostgreSQL implementation is used in production; the
//! in-memory one backs development runs without a database and the tests.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use cavity_core::domain::simulation::{Simulation, SimulationParams, SimulationStatus};
use thiserror::Error;

pub use memory::InMemorySimulationStore;
pub use postgres::PgSimulationStore;

/// Storage error type
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("simulation {0} not found")]
    NotFound(i64),

    #[error("simulation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: i64,
        from: SimulationStatus,
        to: SimulationStatus,
    },

    #[error("simulation {id} has unknown status '{status}'")]
    CorruptStatus { id: i64, status: String },
}

/// Durable simulation records keyed by id
///
/// Every transition method is a single atomic update that only succeeds when
/// the record currently sits in a legal predecessor status (see
/// [`SimulationStatus::predecessors`]). Diagnostics and the output URL are
/// written in the same update as the terminal status.
#[async_trait]
pub trait SimulationStore: Send + Sync {
    /// Insert a new `pending` record and return it with its assigned id
    async fn create(&self, params: SimulationParams) -> Result<Simulation, StoreError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Simulation>, StoreError>;

    /// All records, most recently created first
    async fn list_all(&self) -> Result<Vec<Simulation>, StoreError>;

    async fn mark_running(&self, id: i64) -> Result<(), StoreError>;

    async fn mark_completed(
        &self,
        id: i64,
        diagnostics: &str,
        output_video_url: &str,
    ) -> Result<(), StoreError>;

    async fn mark_failed(&self, id: i64, diagnostics: &str) -> Result<(), StoreError>;
}
