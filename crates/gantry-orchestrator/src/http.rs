//! HTTP implementation of the orchestrator client.
//!
//! Speaks a small REST surface: job read, allocation listing, per-alloc
//! stats, job registration, and a blocking-query deployment list. No
//! retry layer here; reliability rests on the client's own timeouts and
//! the scheduler's next tick.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use crate::client::OrchestratorClient;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::types::{Allocation, AllocationStats, Deployment, Job};

/// Index header on blocking-query responses.
const INDEX_HEADER: &str = "X-Index";

/// HTTP client for the orchestrator API.
pub struct HttpOrchestrator {
    client: reqwest::Client,
    base_url: String,
}

impl HttpOrchestrator {
    /// Build a client for the orchestrator at `base_url`
    /// (e.g. `http://127.0.0.1:4646`).
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl OrchestratorClient for HttpOrchestrator {
    async fn get_job(&self, job_id: &str) -> OrchestratorResult<Option<Job>> {
        let path = format!("/v1/job/{job_id}");
        let resp = self.client.get(self.url(&path)).send().await?;

        match resp.status() {
            StatusCode::OK => {
                let job = resp.json::<Job>().await?;
                Ok(Some(job))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(OrchestratorError::UnexpectedStatus {
                path,
                status: status.as_u16(),
            }),
        }
    }

    async fn list_allocations(&self, job_id: &str) -> OrchestratorResult<Vec<Allocation>> {
        let path = format!("/v1/job/{job_id}/allocations");
        let resp = self.client.get(self.url(&path)).send().await?;

        if !resp.status().is_success() {
            return Err(OrchestratorError::UnexpectedStatus {
                path,
                status: resp.status().as_u16(),
            });
        }
        Ok(resp.json::<Vec<Allocation>>().await?)
    }

    async fn allocation_stats(&self, alloc_id: &str) -> OrchestratorResult<AllocationStats> {
        let path = format!("/v1/client/allocation/{alloc_id}/stats");
        let resp = self.client.get(self.url(&path)).send().await?;

        if !resp.status().is_success() {
            return Err(OrchestratorError::StatsUnavailable(alloc_id.to_string()));
        }
        Ok(resp.json::<AllocationStats>().await?)
    }

    async fn register_job(&self, job: &Job) -> OrchestratorResult<()> {
        let path = "/v1/jobs".to_string();
        let resp = self.client.put(self.url(&path)).json(job).send().await?;

        if !resp.status().is_success() {
            return Err(OrchestratorError::UnexpectedStatus {
                path,
                status: resp.status().as_u16(),
            });
        }
        debug!(job = %job.id, "job registered");
        Ok(())
    }

    async fn list_deployments(
        &self,
        index: u64,
        wait: Duration,
    ) -> OrchestratorResult<(Vec<Deployment>, u64)> {
        let path = "/v1/deployments".to_string();
        let resp = self
            .client
            .get(self.url(&path))
            .query(&[
                ("index", index.to_string()),
                ("wait", format!("{}s", wait.as_secs())),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(OrchestratorError::UnexpectedStatus {
                path,
                status: resp.status().as_u16(),
            });
        }

        // The new index rides on a response header; fall back to the
        // request index when absent so the caller never goes backwards.
        let new_index = resp
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(index);

        let deployments = resp.json::<Vec<Deployment>>().await?;
        Ok((deployments, new_index))
    }
}
