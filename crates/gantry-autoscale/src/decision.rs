//! The decision engine.
//!
//! For each group: run the four optional utilization thresholds, then the
//! policy's external checks, collecting candidate decisions keyed by
//! direction. Multiple breaches in the same direction merge into one
//! decision's metrics map; opposing candidates resolve to scale-out.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use gantry_metrics::{GroupResources, ProviderRegistry};
use gantry_orchestrator::Job;
use gantry_policy::{GroupScalingPolicy, ScaleDirection};

/// The observed value and breached threshold for one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionMetric {
    pub value: f64,
    pub threshold: f64,
}

/// A per-group, per-evaluation scaling conclusion. Never persisted; a
/// derived scaling event is.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingDecision {
    pub direction: ScaleDirection,
    pub count: u64,
    /// The metrics that breached, keyed by metric name.
    pub metrics: HashMap<String, DecisionMetric>,
}

type Candidates = HashMap<ScaleDirection, HashMap<String, DecisionMetric>>;

/// Evaluates thresholds and external checks into decisions.
#[derive(Clone)]
pub struct DecisionEngine {
    registry: Arc<ProviderRegistry>,
}

impl DecisionEngine {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    /// Evaluate every policy-bearing group of `job`.
    ///
    /// Returns at most one decision per group. Groups named by a policy
    /// but absent from the live job are logged and skipped; they never
    /// fail the job's evaluation.
    pub async fn evaluate_job(
        &self,
        job: &Job,
        policies: &HashMap<String, GroupScalingPolicy>,
        resources: &HashMap<String, GroupResources>,
    ) -> HashMap<String, ScalingDecision> {
        let mut decisions = HashMap::new();

        for (group, policy) in policies {
            if !policy.enabled {
                continue;
            }
            if job.group(group).is_none() {
                warn!(
                    job = %job.id,
                    %group,
                    "policy group not present on live job, skipping"
                );
                continue;
            }

            let mut candidates = Candidates::new();

            if let Some(res) = resources.get(group) {
                self.run_utilization_checks(&job.id, group, policy, res, &mut candidates);
            }
            self.run_external_checks(&job.id, group, policy, &mut candidates)
                .await;

            if let Some(decision) = resolve(&job.id, group, policy, candidates) {
                decisions.insert(group.clone(), decision);
            }
        }

        decisions
    }

    /// The four optional CPU/memory percentage thresholds.
    fn run_utilization_checks(
        &self,
        job: &str,
        group: &str,
        policy: &GroupScalingPolicy,
        res: &GroupResources,
        candidates: &mut Candidates,
    ) {
        match utilization(res.usage.cpu, res.capacity.cpu) {
            Some(cpu_pct) => {
                if let Some(threshold) = policy.scale_out_cpu_percentage
                    && cpu_pct > threshold
                {
                    add_candidate(candidates, ScaleDirection::Out, "cpu", cpu_pct, threshold);
                }
                if let Some(threshold) = policy.scale_in_cpu_percentage
                    && cpu_pct < threshold
                {
                    add_candidate(candidates, ScaleDirection::In, "cpu", cpu_pct, threshold);
                }
            }
            None => {
                warn!(%job, %group, "group has zero declared CPU, skipping CPU checks");
            }
        }

        match utilization(res.usage.memory, res.capacity.memory) {
            Some(mem_pct) => {
                if let Some(threshold) = policy.scale_out_memory_percentage
                    && mem_pct > threshold
                {
                    add_candidate(candidates, ScaleDirection::Out, "memory", mem_pct, threshold);
                }
                if let Some(threshold) = policy.scale_in_memory_percentage
                    && mem_pct < threshold
                {
                    add_candidate(candidates, ScaleDirection::In, "memory", mem_pct, threshold);
                }
            }
            None => {
                warn!(%job, %group, "group has zero declared memory, skipping memory checks");
            }
        }
    }

    /// Named checks against external providers. A failed or disabled
    /// check is skipped, never fatal.
    async fn run_external_checks(
        &self,
        job: &str,
        group: &str,
        policy: &GroupScalingPolicy,
        candidates: &mut Candidates,
    ) {
        for (name, check) in &policy.external_checks {
            if !check.enabled {
                continue;
            }
            let Ok(value) = self.registry.evaluate(job, name, check).await else {
                // Already logged by the registry.
                continue;
            };
            if check.comparison_operator.breaches(value, check.comparison_value) {
                debug!(
                    %job,
                    %group,
                    check = %name,
                    value,
                    threshold = check.comparison_value,
                    "external check breached"
                );
                add_candidate(
                    candidates,
                    check.action.direction(),
                    name,
                    value,
                    check.comparison_value,
                );
            }
        }
    }
}

/// Percentage utilization, or `None` when capacity is zero.
fn utilization(usage: f64, capacity: f64) -> Option<f64> {
    if capacity <= 0.0 {
        return None;
    }
    Some(usage * 100.0 / capacity)
}

fn add_candidate(
    candidates: &mut Candidates,
    direction: ScaleDirection,
    metric: &str,
    value: f64,
    threshold: f64,
) {
    candidates
        .entry(direction)
        .or_default()
        .insert(metric.to_string(), DecisionMetric { value, threshold });
}

/// Collapse the candidate map into at most one decision.
///
/// When both directions have candidates, scale-out wins. The winning
/// decision's count always comes from the policy's configured step, not
/// from any per-check value.
fn resolve(
    job: &str,
    group: &str,
    policy: &GroupScalingPolicy,
    mut candidates: Candidates,
) -> Option<ScalingDecision> {
    if candidates.contains_key(&ScaleDirection::Out)
        && candidates.contains_key(&ScaleDirection::In)
    {
        info!(%job, %group, "conflicting scale directions, preferring scale-out");
    }

    if let Some(metrics) = candidates.remove(&ScaleDirection::Out) {
        return Some(ScalingDecision {
            direction: ScaleDirection::Out,
            count: policy.scale_out_count,
            metrics,
        });
    }
    if let Some(metrics) = candidates.remove(&ScaleDirection::In) {
        return Some(ScalingDecision {
            direction: ScaleDirection::In,
            count: policy.scale_in_count,
            metrics,
        });
    }
    None
}
