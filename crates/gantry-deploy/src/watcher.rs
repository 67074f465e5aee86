//! The deployment watcher.
//!
//! Long-polls the orchestrator's deployment list and feeds status
//! transitions into the tracker's update channel. Only transitions are
//! forwarded; a deployment re-reported with an unchanged status is
//! dropped here rather than churning the tracker.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use gantry_orchestrator::{DeploymentStatus, OrchestratorClient};

use crate::tracker::DeploymentUpdate;

/// Pause after a failed list call before retrying.
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Produces [`DeploymentUpdate`]s from the orchestrator's deployment list.
pub struct DeploymentWatcher {
    client: Arc<dyn OrchestratorClient>,
    updates: mpsc::Sender<DeploymentUpdate>,
    /// Blocking-query wait passed to the orchestrator.
    wait: Duration,
}

impl DeploymentWatcher {
    pub fn new(
        client: Arc<dyn OrchestratorClient>,
        updates: mpsc::Sender<DeploymentUpdate>,
        wait: Duration,
    ) -> Self {
        Self {
            client,
            updates,
            wait,
        }
    }

    /// Watch until shutdown flips or the tracker side of the channel is
    /// dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(wait_secs = self.wait.as_secs(), "deployment watcher started");

        let mut index = 0u64;
        let mut last_seen: HashMap<String, DeploymentStatus> = HashMap::new();

        loop {
            tokio::select! {
                result = self.client.list_deployments(index, self.wait) => {
                    match result {
                        Ok((deployments, new_index)) => {
                            index = new_index;
                            for deployment in deployments {
                                if last_seen.get(&deployment.id) == Some(&deployment.status) {
                                    continue;
                                }
                                last_seen.insert(deployment.id.clone(), deployment.status);

                                let update = DeploymentUpdate {
                                    job_id: deployment.job_id,
                                    status: deployment.status,
                                    task_groups: deployment.task_groups,
                                };
                                if self.updates.send(update).await.is_err() {
                                    info!("deployment update channel closed");
                                    return;
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "deployment list failed, backing off");
                            tokio::time::sleep(ERROR_BACKOFF).await;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    info!("deployment watcher shutting down");
                    break;
                }
            }
        }
    }
}
