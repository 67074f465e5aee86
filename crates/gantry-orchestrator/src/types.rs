//! Orchestrator domain types.
//!
//! These mirror the slice of the orchestrator's data model the autoscaler
//! touches. All types are JSON-serializable; the job document round-trips
//! through [`crate::OrchestratorClient::register_job`] unchanged apart
//! from group counts.

use serde::{Deserialize, Serialize};

/// A deployable unit of work composed of independently scalable groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Job {
    pub id: String,
    pub groups: Vec<TaskGroup>,
}

impl Job {
    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&TaskGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Mutable group lookup, used when applying count changes.
    pub fn group_mut(&mut self, name: &str) -> Option<&mut TaskGroup> {
        self.groups.iter_mut().find(|g| g.name == name)
    }
}

/// The scaling unit: a named subset of a job with its own replica count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskGroup {
    pub name: String,
    pub count: u64,
    pub tasks: Vec<Task>,
}

impl TaskGroup {
    /// Sum of the declared resources across this group's tasks.
    pub fn declared_resources(&self) -> TaskResources {
        let mut total = TaskResources::default();
        for task in &self.tasks {
            total.cpu_mhz += task.resources.cpu_mhz;
            total.memory_mb += task.resources.memory_mb;
        }
        total
    }
}

/// A single task within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Task {
    pub name: String,
    pub resources: TaskResources,
}

/// Declared resources for one task.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TaskResources {
    pub cpu_mhz: u64,
    pub memory_mb: u64,
}

/// A placed instance of a task group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Allocation {
    pub id: String,
    pub task_group: String,
    pub client_status: AllocClientStatus,
}

/// Client-side lifecycle status of an allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocClientStatus {
    Running,
    Pending,
    Complete,
    Failed,
    Lost,
    #[serde(other)]
    Unknown,
}

impl AllocClientStatus {
    /// Allocations in these states consume resources and count toward
    /// group utilization.
    pub fn is_active(&self) -> bool {
        matches!(self, AllocClientStatus::Running | AllocClientStatus::Pending)
    }
}

/// Point-in-time resource statistics for one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AllocationStats {
    /// Consumed CPU in ticks (MHz).
    pub cpu_ticks: f64,
    /// Resident memory in bytes.
    pub memory_bytes: u64,
}

/// An orchestrator-tracked rollout of a job change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Deployment {
    pub id: String,
    pub job_id: String,
    pub status: DeploymentStatus,
    /// The task groups participating in this deployment.
    pub task_groups: Vec<String>,
}

/// Status of a deployment. Everything except `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Running,
    Paused,
    Cancelled,
    Failed,
    Successful,
    #[serde(other)]
    Unknown,
}

impl DeploymentStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DeploymentStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_task_group() -> TaskGroup {
        TaskGroup {
            name: "cache".to_string(),
            count: 3,
            tasks: vec![
                Task {
                    name: "redis".to_string(),
                    resources: TaskResources {
                        cpu_mhz: 500,
                        memory_mb: 256,
                    },
                },
                Task {
                    name: "sidecar".to_string(),
                    resources: TaskResources {
                        cpu_mhz: 100,
                        memory_mb: 64,
                    },
                },
            ],
        }
    }

    #[test]
    fn declared_resources_sum_tasks() {
        let group = two_task_group();
        let total = group.declared_resources();
        assert_eq!(total.cpu_mhz, 600);
        assert_eq!(total.memory_mb, 320);
    }

    #[test]
    fn group_lookup() {
        let job = Job {
            id: "example".to_string(),
            groups: vec![two_task_group()],
        };
        assert!(job.group("cache").is_some());
        assert!(job.group("missing").is_none());
    }

    #[test]
    fn active_statuses() {
        assert!(AllocClientStatus::Running.is_active());
        assert!(AllocClientStatus::Pending.is_active());
        assert!(!AllocClientStatus::Complete.is_active());
        assert!(!AllocClientStatus::Failed.is_active());
    }

    #[test]
    fn deployment_terminal_statuses() {
        assert!(!DeploymentStatus::Running.is_terminal());
        assert!(DeploymentStatus::Paused.is_terminal());
        assert!(DeploymentStatus::Cancelled.is_terminal());
        assert!(DeploymentStatus::Failed.is_terminal());
        assert!(DeploymentStatus::Successful.is_terminal());
    }

    #[test]
    fn unknown_status_decodes_via_catch_all() {
        let status: AllocClientStatus = serde_json::from_str("\"garbage\"").unwrap();
        assert_eq!(status, AllocClientStatus::Unknown);
    }
}
