//! In-memory simulation store
//!
//! Keeps records in a `BTreeMap` behind a `tokio::sync::RwLock`. Each
//! transition takes the write lock for its whole check-and-update, so single
//! record updates are atomic. Nothing survives a restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use cavity_core::domain::simulation::{Simulation, SimulationParams, SimulationStatus};
use tokio::sync::RwLock;

use super::{SimulationStore, StoreError};

#[derive(Default)]
struct State {
    last_id: i64,
    records: BTreeMap<i64, Simulation>,
}

#[derive(Default)]
pub struct InMemorySimulationStore {
    state: RwLock<State>,
}

impl InMemorySimulationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn transition(
        &self,
        id: i64,
        to: SimulationStatus,
        diagnostics: Option<&str>,
        output_video_url: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let record = state.records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if !record.status.can_transition_to(to) {
            return Err(StoreError::InvalidTransition {
                id,
                from: record.status,
                to,
            });
        }

        record.status = to;
        if let Some(diagnostics) = diagnostics {
            record.diagnostics = Some(diagnostics.to_string());
        }
        if let Some(url) = output_video_url {
            record.output_video_url = Some(url.to_string());
        }

        Ok(())
    }
}

#[async_trait]
impl SimulationStore for InMemorySimulationStore {
    async fn create(&self, params: SimulationParams) -> Result<Simulation, StoreError> {
        let mut state = self.state.write().await;
        state.last_id += 1;

        let sim = Simulation {
            id: state.last_id,
            status: SimulationStatus::Pending,
            config: params,
            output_video_url: None,
            diagnostics: None,
            created_at: chrono::Utc::now(),
        };
        state.records.insert(sim.id, sim.clone());

        Ok(sim)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Simulation>, StoreError> {
        Ok(self.state.read().await.records.get(&id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Simulation>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .records
            .values()
            .rev()
            .cloned()
            .collect())
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
