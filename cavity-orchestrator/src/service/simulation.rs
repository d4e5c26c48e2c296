//! Simulation Service
//!
//! Submission and status queries for simulations.

use cavity_core::domain::simulation::Simulation;
use cavity_core::validation::{ValidationError, validate_request};
use thiserror::Error;

use crate::dispatcher::Dispatcher;
use crate::repository::{SimulationStore, StoreError};

/// Service error type
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("simulation {0} not found")]
    NotFound(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate a submission, persist it as `pending` and start it in the background
///
/// Returns the record as created; the run itself proceeds after this returns.
/// If the run cannot be handed off, the record is marked `failed` and that
/// stored state is returned instead.
pub async fn submit(
    store: &dyn SimulationStore,
    dispatcher: &Dispatcher,
    body: &serde_json::Value,
) -> Result<Simulation, SimulationError> {
    let params = validate_request(body)?;
    let sim = store.create(params).await?;

    tracing::info!(
        "Simulation {} created: {}x{} grid, Re={}, {} steps",
        sim.id,
        params.nx,
        params.ny,
        params.reynolds_number,
        params.steps
    );

    if let Err(e) = dispatcher.dispatch(sim.id, params) {
        tracing::error!("{}", e);
        if let Err(e) = store.mark_failed(sim.id, &e.to_string()).await {
            tracing::error!("Simulation {} could not be marked failed: {}", sim.id, e);
            return Ok(sim);
        }
        return get(store, sim.id).await;
    }

    Ok(sim)
}

/// Get a simulation by ID
pub async fn get(store: &dyn SimulationStore, id: i64) -> Result<Simulation, SimulationError> {
    store
        .find_by_id(id)
        .await?
        .ok_or(SimulationError::NotFound(id))
}

/// List all simulations, most recent first
pub async fn list(store: &dyn SimulationStore) -> Result<Vec<Simulation>, SimulationError> {
    Ok(store.list_all().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{ArtifactLayout, LifecycleController};
    use crate::repository::InMemorySimulationStore;
    use crate::supervisor::{ProcessOutcome, Supervisor, SupervisorError};
    use async_trait::async_trait;
    use cavity_core::domain::simulation::{SimulationParams, SimulationStatus};
    use serde_json::json;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    struct Succeeds;

    #[async_trait]
    impl Supervisor for Succeeds {
        async fn execute(
            &self,
            _params: &SimulationParams,
            _result_target: &Path,
        ) -> Result<ProcessOutcome, SupervisorError> {
            Ok(ProcessOutcome {
                exit_code: Some(0),
                diagnostics: "Done.\n".to_string(),
            })
        }
    }

    fn setup() -> (Arc<InMemorySimulationStore>, Dispatcher) {
        let store = Arc::new(InMemorySimulationStore::new());
        let controller = LifecycleController::new(
            store.clone(),
            Arc::new(Succeeds),
            ArtifactLayout {
                output_dir: PathBuf::from("videos"),
                url_prefix: "/videos".to_string(),
            },
        );
        let dispatcher = Dispatcher::start(Arc::new(controller));
        (store, dispatcher)
    }

    #[tokio::test]
    async fn test_submit_returns_pending_record() {
        let (store, dispatcher) = setup();

        let sim = submit(&*store, &dispatcher, &json!({ "nx": 40 }))
            .await
            .unwrap();

        assert_eq!(sim.status, SimulationStatus::Pending);
        assert_eq!(sim.config.nx, 40);
        assert!(sim.diagnostics.is_none());
        assert!(sim.output_video_url.is_none());

        dispatcher.shutdown().await;
        let done = get(&*store, sim.id).await.unwrap();
        assert_eq!(done.status, SimulationStatus::Completed);
    }

    #[tokio::test]
    async fn test_invalid_submission_creates_nothing() {
        let (store, dispatcher) = setup();

        let err = submit(&*store, &dispatcher, &json!({ "steps": 6000 }))
            .await
            .unwrap_err();

        assert!(matches!(err, SimulationError::Validation(ref v) if v.field.as_deref() == Some("steps")));
        assert!(list(&*store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_marks_failed() {
        let (store, dispatcher) = setup();
        dispatcher.shutdown().await;

        let sim = submit(&*store, &dispatcher, &json!({})).await.unwrap();

        assert_eq!(sim.status, SimulationStatus::Failed);
        assert!(sim.diagnostics.as_deref().unwrap().contains("not started"));
        let stored = get(&*store, sim.id).await.unwrap();
        assert_eq!(stored, sim);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (store, _dispatcher) = setup();
        assert!(matches!(
            get(&*store, 5).await.unwrap_err(),
            SimulationError::NotFound(5)
        ));
    }
}
