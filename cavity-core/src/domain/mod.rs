//! Core domain types
//!
//! This module contains the domain structures shared between the orchestrator
//! (which persists and drives simulations) and clients (which poll them).

pub mod simulation;
