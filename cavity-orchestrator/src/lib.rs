//! Simulation orchestrator
//!
//! Accepts lid-driven cavity simulation requests over HTTP, persists them,
//! runs the external solver for each one in the background and records the
//! outcome for clients that poll.

pub mod api;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod lifecycle;
pub mod repository;
pub mod service;
pub mod supervisor;
