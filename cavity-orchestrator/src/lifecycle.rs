//! Simulation lifecycle controller
//!
//! Drives one simulation through `pending -> running -> completed | failed`
//! exactly once. `running` is persisted before the solver starts and the
//! terminal status is persisted only after the solver has exited and its
//! output has been fully drained.
//!
//! Every fault below the controller (spawn failures, storage errors) is
//! turned into a `failed` record with a description in the diagnostics. The
//! only outcome that escapes is [`LifecycleError::Unresolved`], returned when
//! even that last write fails.

use std::path::PathBuf;
use std::sync::Arc;

use cavity_core::domain::simulation::{SimulationParams, SimulationStatus};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::repository::{SimulationStore, StoreError};
use crate::supervisor::Supervisor;

#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The terminal status could not be written; the record keeps its last persisted status
    #[error("simulation {id} could not be resolved: {source}")]
    Unresolved {
        id: i64,
        #[source]
        source: StoreError,
    },
}

/// Where solver artifacts land on disk and how clients reach them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    pub output_dir: PathBuf,
    /// URL path under which `output_dir` is served, e.g. `/videos`
    pub url_prefix: String,
}

impl ArtifactLayout {
    pub fn file_name(id: i64) -> String {
        format!("sim_{}.mp4", id)
    }

    pub fn path_for(&self, id: i64) -> PathBuf {
        self.output_dir.join(Self::file_name(id))
    }

    pub fn url_for(&self, id: i64) -> String {
        format!(
            "{}/{}",
            self.url_prefix.trim_end_matches('/'),
            Self::file_name(id)
        )
    }
}

pub struct LifecycleController {
    store: Arc<dyn SimulationStore>,
    supervisor: Arc<dyn Supervisor>,
    artifacts: ArtifactLayout,
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn SimulationStore>,
        supervisor: Arc<dyn Supervisor>,
        artifacts: ArtifactLayout,
    ) -> Self {
        Self {
            store,
            supervisor,
            artifacts,
        }
    }

    /// Runs the simulation and returns the terminal status that was persisted
    ///
    /// Must be called at most once per id; concurrent calls for the same id
    /// are not detected.
    pub async fn run(
        &self,
        id: i64,
        params: SimulationParams,
    ) -> Result<SimulationStatus, LifecycleError> {
        if let Err(e) = self.store.mark_running(id).await {
            warn!("Simulation {} could not enter running: {}", id, e);
            return self
                .record_failure(id, format!("Failed to record running state: {}", e))
                .await;
        }
        info!("Simulation {} running", id);

        let target = self.artifacts.path_for(id);
        let outcome = match self.supervisor.execute(&params, &target).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Simulation {} solver could not run: {}", id, e);
                return self
                    .record_failure(id, format!("Solver could not be run: {}", e))
                    .await;
            }
        };

        if !outcome.success() {
            info!(
                "Simulation {} solver failed with exit code {:?}",
                id, outcome.exit_code
            );
            return self.record_failure(id, outcome.failure_report()).await;
        }

        let url = self.artifacts.url_for(id);
        match self
            .store
            .mark_completed(id, &outcome.diagnostics, &url)
            .await
        {
            Ok(()) => {
                info!("Simulation {} completed: {}", id, url);
                Ok(SimulationStatus::Completed)
            }
            Err(e) => {
                error!("Simulation {} completion could not be recorded: {}", id, e);
                self.record_failure(
                    id,
                    format!(
                        "Failed to record completion: {}\n\n{}",
                        e, outcome.diagnostics
                    ),
                )
                .await
            }
        }
    }

    /// Best-effort transition to `failed`
    pub async fn record_failure(
        &self,
        id: i64,
        diagnostics: String,
    ) -> Result<SimulationStatus, LifecycleError> {
        match self.store.mark_failed(id, &diagnostics).await {
            Ok(()) => {
                info!("Simulation {} failed", id);
                Ok(SimulationStatus::Failed)
            }
            Err(source) => Err(LifecycleError::Unresolved { id, source }),
        }
    }
}
