//! Policy storage.
//!
//! The engine only ever reads policies; writes come from an API surface
//! or a seed file. Validation and default-merging happen here, at write
//! time, so the scheduler can trust every policy it fetches.

use std::collections::HashMap;

use async_trait::async_trait;
use gantry_policy::GroupScalingPolicy;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StateResult;

/// All policies, keyed job → group.
pub type PolicySet = HashMap<String, HashMap<String, GroupScalingPolicy>>;

/// Read/write access to scaling policies.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Every stored policy, keyed job → group.
    async fn get_policies(&self) -> StateResult<PolicySet>;

    /// Policies for one job, or `None` when the job has none.
    async fn get_job_policies(
        &self,
        job: &str,
    ) -> StateResult<Option<HashMap<String, GroupScalingPolicy>>>;

    /// A single group's policy.
    async fn get_job_group_policy(
        &self,
        job: &str,
        group: &str,
    ) -> StateResult<Option<GroupScalingPolicy>>;

    /// Validate, merge defaults, and store a policy.
    async fn put_job_group_policy(
        &self,
        job: &str,
        group: &str,
        policy: GroupScalingPolicy,
    ) -> StateResult<()>;

    /// Remove a group's policy. Removing the last group removes the job
    /// entry entirely.
    async fn delete_job_group_policy(&self, job: &str, group: &str) -> StateResult<()>;
}

/// In-memory policy backend.
#[derive(Default)]
pub struct MemoryPolicyStore {
    inner: RwLock<PolicySet>,
}

impl MemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PolicyStore for MemoryPolicyStore {
    async fn get_policies(&self) -> StateResult<PolicySet> {
        Ok(self.inner.read().await.clone())
    }

    async fn get_job_policies(
        &self,
        job: &str,
    ) -> StateResult<Option<HashMap<String, GroupScalingPolicy>>> {
        Ok(self.inner.read().await.get(job).cloned())
    }

    async fn get_job_group_policy(
        &self,
        job: &str,
        group: &str,
    ) -> StateResult<Option<GroupScalingPolicy>> {
        Ok(self
            .inner
            .read()
            .await
            .get(job)
            .and_then(|groups| groups.get(group))
            .cloned())
    }

    async fn put_job_group_policy(
        &self,
        job: &str,
        group: &str,
        mut policy: GroupScalingPolicy,
    ) -> StateResult<()> {
        policy.validate()?;
        policy.merge_defaults();

        let mut inner = self.inner.write().await;
        inner
            .entry(job.to_string())
            .or_default()
            .insert(group.to_string(), policy);
        debug!(%job, %group, "policy stored");
        Ok(())
    }

    async fn delete_job_group_policy(&self, job: &str, group: &str) -> StateResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(groups) = inner.get_mut(job) {
            groups.remove(group);
            if groups.is_empty() {
                inner.remove(job);
            }
        }
        debug!(%job, %group, "policy deleted");
        Ok(())
    }
}
