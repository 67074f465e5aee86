//! In-memory orchestrator for tests and local wiring.
//!
//! Behaves like a tiny single-region orchestrator: jobs, allocations and
//! stats are seeded by the test, registrations are recorded, and stats
//! calls can be poisoned per allocation to exercise failure paths.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::client::OrchestratorClient;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::types::{Allocation, AllocationStats, Deployment, Job};

#[derive(Default)]
struct MockState {
    jobs: HashMap<String, Job>,
    allocations: HashMap<String, Vec<Allocation>>,
    stats: HashMap<String, AllocationStats>,
    poisoned_allocs: HashSet<String>,
    registered: Vec<Job>,
    deployments: Vec<Deployment>,
    deployment_index: u64,
}

/// Scriptable in-memory [`OrchestratorClient`].
#[derive(Default)]
pub struct MockOrchestrator {
    state: Mutex<MockState>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a job.
    pub async fn insert_job(&self, job: Job) {
        let mut state = self.state.lock().await;
        state.jobs.insert(job.id.clone(), job);
    }

    /// Seed an allocation and its stats for a job.
    pub async fn insert_allocation(&self, job_id: &str, alloc: Allocation, stats: AllocationStats) {
        let mut state = self.state.lock().await;
        state.stats.insert(alloc.id.clone(), stats);
        state
            .allocations
            .entry(job_id.to_string())
            .or_default()
            .push(alloc);
    }

    /// Make stats calls for the given allocation fail.
    pub async fn poison_allocation(&self, alloc_id: &str) {
        let mut state = self.state.lock().await;
        state.poisoned_allocs.insert(alloc_id.to_string());
    }

    /// Replace the deployment list and bump the blocking-query index.
    pub async fn set_deployments(&self, deployments: Vec<Deployment>) {
        let mut state = self.state.lock().await;
        state.deployments = deployments;
        state.deployment_index += 1;
    }

    /// Jobs submitted through [`OrchestratorClient::register_job`], in
    /// submission order.
    pub async fn registered_jobs(&self) -> Vec<Job> {
        self.state.lock().await.registered.clone()
    }

    /// Current count of a group on the live (seeded or re-registered) job.
    pub async fn group_count(&self, job_id: &str, group: &str) -> Option<u64> {
        let state = self.state.lock().await;
        state
            .jobs
            .get(job_id)
            .and_then(|j| j.group(group))
            .map(|g| g.count)
    }
}

#[async_trait]
impl OrchestratorClient for MockOrchestrator {
    async fn get_job(&self, job_id: &str) -> OrchestratorResult<Option<Job>> {
        Ok(self.state.lock().await.jobs.get(job_id).cloned())
    }

    async fn list_allocations(&self, job_id: &str) -> OrchestratorResult<Vec<Allocation>> {
        Ok(self
            .state
            .lock()
            .await
            .allocations
            .get(job_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn allocation_stats(&self, alloc_id: &str) -> OrchestratorResult<AllocationStats> {
        let state = self.state.lock().await;
        if state.poisoned_allocs.contains(alloc_id) {
            return Err(OrchestratorError::StatsUnavailable(alloc_id.to_string()));
        }
        state
            .stats
            .get(alloc_id)
            .copied()
            .ok_or_else(|| OrchestratorError::StatsUnavailable(alloc_id.to_string()))
    }

    async fn register_job(&self, job: &Job) -> OrchestratorResult<()> {
        let mut state = self.state.lock().await;
        state.registered.push(job.clone());
        // Registration makes the submitted document the live one.
        state.jobs.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn list_deployments(
        &self,
        index: u64,
        _wait: Duration,
    ) -> OrchestratorResult<(Vec<Deployment>, u64)> {
        let state = self.state.lock().await;
        let new_index = state.deployment_index.max(index);
        Ok((state.deployments.clone(), new_index))
    }
}
