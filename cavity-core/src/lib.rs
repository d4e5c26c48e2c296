//! Cavity Core
//!
//! Core types and abstractions for the Cavity simulation service.
//!
//! This crate contains:
//! - Domain types: the simulation job record, its status and parameters
//! - Validation: turning a raw request body into range-checked parameters
//! - DTOs: Data transfer objects shared by the orchestrator and its clients

pub mod domain;
pub mod dto;
pub mod validation;
