//! Usage collector — accumulates allocation stats into per-group totals.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use gantry_orchestrator::{Job, OrchestratorClient};
use gantry_policy::GroupScalingPolicy;

use crate::error::MetricsResult;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Accumulated CPU (MHz ticks) and memory (MB) for one group.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ResourceUsage {
    pub cpu: f64,
    pub memory: f64,
}

/// A group's live usage alongside its declared capacity.
///
/// Utilization percentages are `usage * 100 / capacity`; the decision
/// engine owns the zero-capacity guard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GroupResources {
    pub usage: ResourceUsage,
    pub capacity: ResourceUsage,
}

/// Gathers per-group resource utilization for one job at a time.
#[derive(Clone)]
pub struct UsageCollector {
    client: Arc<dyn OrchestratorClient>,
}

impl UsageCollector {
    pub fn new(client: Arc<dyn OrchestratorClient>) -> Self {
        Self { client }
    }

    /// Accumulate live allocation stats into per-group totals.
    ///
    /// Only groups that exist on the job and carry an enabled policy are
    /// gathered; within those, only allocations in client status
    /// `running` or `pending` count. Allocation identity is tracked so a
    /// double-listed allocation is never counted twice.
    ///
    /// Any allocation stats failure fails the whole gather; the job's
    /// evaluation is skipped for this round rather than acting on a
    /// partial picture.
    pub async fn gather_job_metrics(
        &self,
        job: &Job,
        policies: &HashMap<String, GroupScalingPolicy>,
    ) -> MetricsResult<HashMap<String, GroupResources>> {
        let mut gathered: HashMap<String, GroupResources> = HashMap::new();

        // Seed every policy-bearing group with zero usage and its
        // declared capacity, so a group with no live allocations still
        // gets evaluated.
        for group in &job.groups {
            let Some(policy) = policies.get(&group.name) else {
                continue;
            };
            if !policy.enabled {
                continue;
            }
            let declared = group.declared_resources();
            gathered.insert(
                group.name.clone(),
                GroupResources {
                    usage: ResourceUsage::default(),
                    capacity: ResourceUsage {
                        cpu: (declared.cpu_mhz * group.count) as f64,
                        memory: (declared.memory_mb * group.count) as f64,
                    },
                },
            );
        }

        let allocations = self.client.list_allocations(&job.id).await?;
        let mut seen: HashSet<String> = HashSet::new();

        for alloc in &allocations {
            if !alloc.client_status.is_active() {
                continue;
            }
            let Some(entry) = gathered.get_mut(&alloc.task_group) else {
                continue;
            };
            if !seen.insert(alloc.id.clone()) {
                continue;
            }

            let stats = self.client.allocation_stats(&alloc.id).await?;
            entry.usage.cpu += stats.cpu_ticks;
            entry.usage.memory += stats.memory_bytes as f64 / BYTES_PER_MB;
        }

        debug!(
            job = %job.id,
            groups = gathered.len(),
            allocations = seen.len(),
            "gathered job metrics"
        );
        Ok(gathered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_orchestrator::{
        AllocClientStatus, Allocation, AllocationStats, MockOrchestrator, Task, TaskGroup,
        TaskResources,
    };

    fn test_job() -> Job {
        Job {
            id: "example".to_string(),
            groups: vec![
                TaskGroup {
                    name: "web".to_string(),
                    count: 2,
                    tasks: vec![Task {
                        name: "server".to_string(),
                        resources: TaskResources {
                            cpu_mhz: 500,
                            memory_mb: 256,
                        },
                    }],
                },
                TaskGroup {
                    name: "cache".to_string(),
                    count: 1,
                    tasks: vec![Task {
                        name: "redis".to_string(),
                        resources: TaskResources {
                            cpu_mhz: 200,
                            memory_mb: 128,
                        },
                    }],
                },
            ],
        }
    }

    fn enabled_policies(groups: &[&str]) -> HashMap<String, GroupScalingPolicy> {
        groups
            .iter()
            .map(|g| {
                (
                    g.to_string(),
                    GroupScalingPolicy {
                        enabled: true,
                        ..Default::default()
                    },
                )
            })
            .collect()
    }

    fn alloc(id: &str, group: &str, status: AllocClientStatus) -> Allocation {
        Allocation {
            id: id.to_string(),
            task_group: group.to_string(),
            client_status: status,
        }
    }

    fn stats(cpu: f64, memory_mb: u64) -> AllocationStats {
        AllocationStats {
            cpu_ticks: cpu,
            memory_bytes: memory_mb * 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn accumulates_same_group_allocations() {
        let mock = Arc::new(MockOrchestrator::new());
        let job = test_job();
        mock.insert_job(job.clone()).await;
        mock.insert_allocation(
            "example",
            alloc("a1", "web", AllocClientStatus::Running),
            stats(100.0, 100),
        )
        .await;
        mock.insert_allocation(
            "example",
            alloc("a2", "web", AllocClientStatus::Running),
            stats(200.0, 200),
        )
        .await;

        let collector = UsageCollector::new(mock);
        let gathered = collector
            .gather_job_metrics(&job, &enabled_policies(&["web"]))
            .await
            .unwrap();

        let web = &gathered["web"];
        assert_eq!(web.usage.cpu, 300.0);
        assert_eq!(web.usage.memory, 300.0);
    }

    #[tokio::test]
    async fn seeds_group_with_no_allocations() {
        let mock = Arc::new(MockOrchestrator::new());
        let job = test_job();
        mock.insert_job(job.clone()).await;

        let collector = UsageCollector::new(mock);
        let gathered = collector
            .gather_job_metrics(&job, &enabled_policies(&["web", "cache"]))
            .await
            .unwrap();

        let web = &gathered["web"];
        assert_eq!(web.usage, ResourceUsage::default());
        // Declared 500 MHz / 256 MB per instance, count 2.
        assert_eq!(web.capacity.cpu, 1000.0);
        assert_eq!(web.capacity.memory, 512.0);
    }

    #[tokio::test]
    async fn never_double_counts_an_allocation() {
        let mock = Arc::new(MockOrchestrator::new());
        let job = test_job();
        mock.insert_job(job.clone()).await;
        // The same allocation listed twice.
        mock.insert_allocation(
            "example",
            alloc("a1", "web", AllocClientStatus::Running),
            stats(100.0, 100),
        )
        .await;
        mock.insert_allocation(
            "example",
            alloc("a1", "web", AllocClientStatus::Running),
            stats(100.0, 100),
        )
        .await;

        let collector = UsageCollector::new(mock);
        let gathered = collector
            .gather_job_metrics(&job, &enabled_policies(&["web"]))
            .await
            .unwrap();

        assert_eq!(gathered["web"].usage.cpu, 100.0);
    }

    #[tokio::test]
    async fn ignores_terminal_and_unpoliced_allocations() {
        let mock = Arc::new(MockOrchestrator::new());
        let job = test_job();
        mock.insert_job(job.clone()).await;
        mock.insert_allocation(
            "example",
            alloc("a1", "web", AllocClientStatus::Complete),
            stats(100.0, 100),
        )
        .await;
        mock.insert_allocation(
            "example",
            alloc("a2", "cache", AllocClientStatus::Running),
            stats(50.0, 50),
        )
        .await;

        let collector = UsageCollector::new(mock);
        // Only "web" has a policy; its sole allocation is terminal.
        let gathered = collector
            .gather_job_metrics(&job, &enabled_policies(&["web"]))
            .await
            .unwrap();

        assert_eq!(gathered.len(), 1);
        assert_eq!(gathered["web"].usage, ResourceUsage::default());
    }

    #[tokio::test]
    async fn disabled_policy_group_not_gathered() {
        let mock = Arc::new(MockOrchestrator::new());
        let job = test_job();
        mock.insert_job(job.clone()).await;

        let mut policies = enabled_policies(&["web"]);
        policies.get_mut("web").unwrap().enabled = false;

        let collector = UsageCollector::new(mock);
        let gathered = collector.gather_job_metrics(&job, &policies).await.unwrap();
        assert!(gathered.is_empty());
    }

    #[tokio::test]
    async fn stats_failure_discards_whole_gather() {
        let mock = Arc::new(MockOrchestrator::new());
        let job = test_job();
        mock.insert_job(job.clone()).await;
        mock.insert_allocation(
            "example",
            alloc("a1", "web", AllocClientStatus::Running),
            stats(100.0, 100),
        )
        .await;
        mock.insert_allocation(
            "example",
            alloc("a2", "web", AllocClientStatus::Running),
            stats(200.0, 200),
        )
        .await;
        mock.poison_allocation("a2").await;

        let collector = UsageCollector::new(mock);
        let result = collector
            .gather_job_metrics(&job, &enabled_policies(&["web"]))
            .await;
        assert!(result.is_err());
    }
}
