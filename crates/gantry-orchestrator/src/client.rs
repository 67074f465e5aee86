//! The orchestrator client trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::OrchestratorResult;
use crate::types::{Allocation, AllocationStats, Deployment, Job};

/// Narrow interface over the orchestrator API.
///
/// Every subsystem takes an `Arc<dyn OrchestratorClient>`; concrete
/// implementations are [`crate::HttpOrchestrator`] and
/// [`crate::MockOrchestrator`].
#[async_trait]
pub trait OrchestratorClient: Send + Sync {
    /// Fetch a job by ID. Returns `None` when the orchestrator does not
    /// know the job; this is not an error.
    async fn get_job(&self, job_id: &str) -> OrchestratorResult<Option<Job>>;

    /// List the job's allocations.
    async fn list_allocations(&self, job_id: &str) -> OrchestratorResult<Vec<Allocation>>;

    /// Fetch live resource statistics for one allocation.
    async fn allocation_stats(&self, alloc_id: &str) -> OrchestratorResult<AllocationStats>;

    /// Resubmit a job document to the orchestrator's registration
    /// endpoint. The orchestrator's own optimistic concurrency on the job
    /// version is the final safety net against lost updates.
    async fn register_job(&self, job: &Job) -> OrchestratorResult<()>;

    /// Blocking-query style deployment listing. Waits up to `wait` for
    /// the deployment index to advance past `index`, then returns the
    /// current deployments and the new index.
    async fn list_deployments(
        &self,
        index: u64,
        wait: Duration,
    ) -> OrchestratorResult<(Vec<Deployment>, u64)>;
}
