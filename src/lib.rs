//! Annapoker - planning poker session processor
//!
//! Consumes participant commands from a message broker, keeps per-session
//! participant and vote state in a shared store, and publishes the resulting
//! participant lists and reveal signals to per-session broadcast topics.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
