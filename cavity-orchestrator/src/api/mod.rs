//! API Module
//!
//! HTTP API layer for the orchestrator.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod health;
pub mod simulation;

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;
use crate::repository::SimulationStore;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SimulationStore>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    pub fn new(store: Arc<dyn SimulationStore>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { store, dispatcher }
    }
}

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Simulation endpoints
        .route(
            "/api/simulations",
            get(simulation::list_simulations).post(simulation::create_simulation),
        )
        .route("/api/simulations/{id}", get(simulation::get_simulation))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
