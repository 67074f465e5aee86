//! gantry-orchestrator — access to the cluster job orchestrator.
//!
//! Defines the domain types the autoscaler reads and mutates (jobs, task
//! groups, allocations, deployments) and the [`OrchestratorClient`] trait
//! every other subsystem consumes. Two implementations ship with the
//! crate: an HTTP client for a real orchestrator API, and an in-memory
//! mock used by tests and local wiring.

pub mod client;
pub mod error;
pub mod http;
pub mod mock;
pub mod types;

pub use client::OrchestratorClient;
pub use error::{OrchestratorError, OrchestratorResult};
pub use http::HttpOrchestrator;
pub use mock::MockOrchestrator;
pub use types::*;
