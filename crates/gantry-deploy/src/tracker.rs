//! The deployment tracker.

use std::collections::HashSet;

use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info};

use gantry_orchestrator::DeploymentStatus;

/// Composite identity of a deploying group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeploymentKey {
    pub job_id: String,
    pub group: String,
}

impl DeploymentKey {
    pub fn new(job_id: &str, group: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            group: group.to_string(),
        }
    }
}

/// One deployment-status message from the watcher feed.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentUpdate {
    pub job_id: String,
    pub status: DeploymentStatus,
    pub task_groups: Vec<String>,
}

/// Owns the set of `(job, group)` keys with an in-flight deployment.
///
/// Writes come only from the single update consumer ([`Self::run`]);
/// reads come from any worker's scaling path.
#[derive(Default)]
pub struct DeploymentTracker {
    deploying: RwLock<HashSet<DeploymentKey>>,
}

impl DeploymentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure lookup: is this group currently deploying?
    pub async fn is_deploying(&self, job_id: &str, group: &str) -> bool {
        self.deploying
            .read()
            .await
            .contains(&DeploymentKey::new(job_id, group))
    }

    /// Mark all of a deployment's groups as deploying.
    pub async fn mark_running(&self, job_id: &str, groups: &[String]) {
        let mut deploying = self.deploying.write().await;
        for group in groups {
            deploying.insert(DeploymentKey::new(job_id, group));
        }
        debug!(job = %job_id, groups = groups.len(), "deployment marked running");
    }

    /// Remove a deployment's groups after it reaches a terminal status.
    pub async fn clear(&self, job_id: &str, groups: &[String]) {
        let mut deploying = self.deploying.write().await;
        for group in groups {
            deploying.remove(&DeploymentKey::new(job_id, group));
        }
        debug!(job = %job_id, groups = groups.len(), "deployment cleared");
    }

    /// Drain the update feed until it closes or shutdown flips.
    pub async fn run(
        &self,
        mut updates: mpsc::Receiver<DeploymentUpdate>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("deployment tracker started");
        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(update) = update else {
                        info!("deployment update feed closed");
                        break;
                    };
                    self.apply(update).await;
                }
                _ = shutdown.changed() => {
                    info!("deployment tracker shutting down");
                    break;
                }
            }
        }
    }

    async fn apply(&self, update: DeploymentUpdate) {
        if update.status == DeploymentStatus::Running {
            self.mark_running(&update.job_id, &update.task_groups).await;
        } else {
            self.clear(&update.job_id, &update.task_groups).await;
        }
    }
}
