//! The evaluation loop.
//!
//! Each round: fetch policies, fan out one worker per policy-bearing
//! job, and inside each worker run collect → decide → trigger to
//! completion. Every failure degrades to "skip this job or round";
//! nothing here ever stops the loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use gantry_autoscale::{is_in_cooldown, now_nanos, DecisionEngine};
use gantry_deploy::DeploymentTracker;
use gantry_metrics::UsageCollector;
use gantry_orchestrator::OrchestratorClient;
use gantry_policy::GroupScalingPolicy;
use gantry_scale::{GroupReq, Scaler};
use gantry_state::{EventSource, PolicyStore, StateStore};

use crate::leadership::LeadershipGate;

/// Periodic evaluator over all policy-bearing jobs.
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct Evaluator {
    policies: Arc<dyn PolicyStore>,
    client: Arc<dyn OrchestratorClient>,
    collector: UsageCollector,
    engine: DecisionEngine,
    scaler: Arc<Scaler>,
    tracker: Arc<DeploymentTracker>,
    state: StateStore,
    gate: Arc<dyn LeadershipGate>,
    /// Bounded worker pool; one permit per in-flight job evaluation.
    pool: Arc<Semaphore>,
    /// Overlap guard: set while a round is running. Skip, never queue.
    round_in_progress: Arc<AtomicBool>,
}

impl Evaluator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        policies: Arc<dyn PolicyStore>,
        client: Arc<dyn OrchestratorClient>,
        engine: DecisionEngine,
        scaler: Arc<Scaler>,
        tracker: Arc<DeploymentTracker>,
        state: StateStore,
        gate: Arc<dyn LeadershipGate>,
        pool_size: usize,
    ) -> Self {
        Self {
            policies,
            collector: UsageCollector::new(client.clone()),
            client,
            engine,
            scaler,
            tracker,
            state,
            gate,
            pool: Arc::new(Semaphore::new(pool_size)),
            round_in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run evaluation rounds on `interval` until shutdown flips.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = interval.as_secs(),
            "evaluation scheduler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    self.tick();
                }
                _ = shutdown.changed() => {
                    info!("evaluation scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Start a round in the background if one may run now.
    fn tick(&self) {
        if !self.try_begin_round() {
            return;
        }
        let eval = self.clone();
        tokio::spawn(async move {
            eval.run_round().await;
            eval.round_in_progress.store(false, Ordering::Release);
        });
    }

    /// Gate + overlap check. On success the round flag is held and must
    /// be released when the round finishes.
    fn try_begin_round(&self) -> bool {
        if !self.gate.is_leader() {
            debug!("not the leader, skipping evaluation round");
            return false;
        }
        if self
            .round_in_progress
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .is_err()
        {
            warn!("previous evaluation round still running, skipping this tick");
            return false;
        }
        true
    }

    /// One full round: fetch policies once, fan out per job, wait for
    /// all workers.
    pub async fn run_round(&self) {
        let policies = match self.policies.get_policies().await {
            Ok(p) => p,
            Err(e) => {
                error!(error = %e, "failed to fetch policies, skipping round");
                return;
            }
        };

        let mut workers = JoinSet::new();
        for (job_id, groups) in policies {
            if !groups.values().any(|p| p.enabled) {
                continue;
            }
            let Ok(permit) = self.pool.clone().try_acquire_owned() else {
                warn!(job = %job_id, "worker pool exhausted, skipping job this round");
                continue;
            };
            let eval = self.clone();
            workers.spawn(async move {
                let _permit = permit;
                eval.evaluate_job(&job_id, &groups).await;
            });
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "evaluation worker panicked");
            }
        }
    }

    /// One unit of work: all groups of one job, collect → decide →
    /// trigger.
    async fn evaluate_job(&self, job_id: &str, policies: &HashMap<String, GroupScalingPolicy>) {
        let job = match self.client.get_job(job_id).await {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(job = %job_id, "job with policy not found on orchestrator");
                return;
            }
            Err(e) => {
                warn!(job = %job_id, error = %e, "job lookup failed, skipping this round");
                return;
            }
        };

        let resources = match self.collector.gather_job_metrics(&job, policies).await {
            Ok(r) => r,
            Err(e) => {
                warn!(job = %job_id, error = %e, "metric collection failed, skipping this round");
                return;
            }
        };

        let decisions = self.engine.evaluate_job(&job, policies, &resources).await;
        if decisions.is_empty() {
            debug!(job = %job_id, "no scaling action warranted");
            return;
        }

        let mut reqs = Vec::new();
        for (group, decision) in decisions {
            let Some(policy) = policies.get(&group) else {
                continue;
            };
            if self.tracker.is_deploying(job_id, &group).await {
                info!(job = %job_id, %group, "group is deploying, excluded from batch");
                continue;
            }
            match is_in_cooldown(
                &self.state,
                job_id,
                &group,
                policy.cooldown_seconds,
                now_nanos(),
            ) {
                Ok(true) => {
                    debug!(job = %job_id, %group, "group in cooldown, excluded from batch");
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(job = %job_id, %group, error = %e, "cooldown lookup failed, excluding group");
                    continue;
                }
            }
            reqs.push(GroupReq {
                direction: decision.direction,
                count: decision.count,
                group_name: group,
                policy: policy.clone(),
            });
        }

        if reqs.is_empty() {
            return;
        }
        // Requests apply in order; keep that order deterministic.
        reqs.sort_by(|a, b| a.group_name.cmp(&b.group_name));

        match self
            .scaler
            .trigger(job_id, &reqs, EventSource::Autoscaler)
            .await
        {
            Ok(outcome) => {
                info!(job = %job_id, status = ?outcome.status, "trigger completed");
            }
            Err(e) => {
                error!(job = %job_id, error = %e, "trigger failed");
            }
        }
    }
}
