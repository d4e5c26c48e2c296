//! Data Transfer Objects shared by the orchestrator and its clients
//!
//! Responses carry the full [`crate::domain::simulation::Simulation`] record;
//! the types here cover request and error bodies.

pub mod simulation;
