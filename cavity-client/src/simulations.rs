//! Simulation API endpoints

use std::time::{Duration, Instant};

use cavity_core::domain::simulation::Simulation;
use cavity_core::dto::simulation::CreateSimulation;

use crate::OrchestratorClient;
use crate::error::{ClientError, Result};

impl OrchestratorClient {
    /// Submit a simulation
    ///
    /// Returns the record as created, normally still `pending`.
    pub async fn submit_simulation(&self, req: &CreateSimulation) -> Result<Simulation> {
        let url = format!("{}/api/simulations", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Get a simulation by ID
    pub async fn get_simulation(&self, id: i64) -> Result<Simulation> {
        let url = format!("{}/api/simulations/{}", self.base_url, id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List all simulations, most recent first
    pub async fn list_simulations(&self) -> Result<Vec<Simulation>> {
        let url = format!("{}/api/simulations", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Poll a simulation until it is completed or failed
    ///
    /// With `timeout` set, gives up with [`ClientError::Timeout`] once it has
    /// elapsed; otherwise polls until the orchestrator reports a terminal
    /// status.
    pub async fn wait_for_completion(
        &self,
        id: i64,
        interval: Duration,
        timeout: Option<Duration>,
    ) -> Result<Simulation> {
        let started = Instant::now();

        loop {
            let sim = self.get_simulation(id).await?;
            if sim.is_terminal() {
                return Ok(sim);
            }

            if timeout.is_some_and(|limit| started.elapsed() >= limit) {
                return Err(ClientError::Timeout(id));
            }

            tracing::debug!("Simulation {} is {}, polling again in {:?}", id, sim.status, interval);
            tokio::time::sleep(interval).await;
        }
    }
}
