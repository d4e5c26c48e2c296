//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between the store, the dispatcher and validation.

pub mod simulation;

// Re-export for convenience
pub use simulation as simulation_service;
