//! PostgreSQL simulation store
//!
//! Handles all database operations related to simulations.

use async_trait::async_trait;
use cavity_core::domain::simulation::{Simulation, SimulationParams, SimulationStatus};
use sqlx::PgPool;
use sqlx::types::Json;

use super::{SimulationStore, StoreError};

const SELECT_COLUMNS: &str =
    "SELECT id, status, config, output_video_url, diagnostics, created_at FROM simulations";

#[derive(Clone)]
pub struct PgSimulationStore {
    pool: PgPool,
}

impl PgSimulationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies a guarded status update, then explains a miss
    async fn transition(
        &self,
        id: i64,
        to: SimulationStatus,
        diagnostics: Option<&str>,
        output_video_url: Option<&str>,
    ) -> Result<(), StoreError> {
        let allowed: Vec<String> = SimulationStatus::predecessors(to)
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        let result = sqlx::query(
            r#"
            UPDATE simulations
            SET status = $1,
                diagnostics = COALESCE($2, diagnostics),
                output_video_url = COALESCE($3, output_video_url)
            WHERE id = $4 AND status = ANY($5)
            "#,
        )
        .bind(to.as_str())
        .bind(diagnostics)
        .bind(output_video_url)
        .bind(id)
        .bind(allowed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        match self.find_by_id(id).await? {
            None => Err(StoreError::NotFound(id)),
            Some(current) => Err(StoreError::InvalidTransition {
                id,
                from: current.status,
                to,
            }),
        }
    }
}

#[async_trait]
impl SimulationStore for PgSimulationStore {
    async fn create(&self, params: SimulationParams) -> Result<Simulation, StoreError> {
        let row = sqlx::query_as::<_, SimulationRow>(
            r#"
            INSERT INTO simulations (status, config)
            VALUES ($1, $2)
            RETURNING id, status, config, output_video_url, diagnostics, created_at
            "#,
        )
        .bind(SimulationStatus::Pending.as_str())
        .bind(Json(params))
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Simulation>, StoreError> {
        let row = sqlx::query_as::<_, SimulationRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Simulation::try_from).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Simulation>, StoreError> {
        let rows = sqlx::query_as::<_, SimulationRow>(&format!("{SELECT_COLUMNS} ORDER BY id DESC"))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Simulation::try_from).collect()
    }

    async fn mark_running(&self, id: i64) -> Result<(), StoreError> {
        self.transition(id, SimulationStatus::Running, None, None)
            .await
    }

    async fn mark_completed(
        &self,
        id: i64,
        diagnostics: &str,
        output_video_url: &str,
    ) -> Result<(), StoreError> {
        self.transition(
            id,
            SimulationStatus::Completed,
            Some(diagnostics),
            Some(output_video_url),
        )
        .await
    }

    async fn mark_failed(&self, id: i64, diagnostics: &str) -> Result<(), StoreError> {
        self.transition(id, SimulationStatus::Failed, Some(diagnostics), None)
            .await
    }
}

// =============================================================================
// Database Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct SimulationRow {
    id: i64,
    status: String,
    config: Json<SimulationParams>,
    output_video_url: Option<String>,
    diagnostics: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<SimulationRow> for Simulation {
    type Error = StoreError;

    fn try_from(row: SimulationRow) -> Result<Self, Self::Error> {
        let status =
            SimulationStatus::parse(&row.status).ok_or_else(|| StoreError::CorruptStatus {
                id: row.id,
                status: row.status.clone(),
            })?;

        Ok(Simulation {
            id: row.id,
            status,
            config: row.config.0,
            output_video_url: row.output_video_url,
            diagnostics: row.diagnostics,
            created_at: row.created_at,
        })
    }
}
