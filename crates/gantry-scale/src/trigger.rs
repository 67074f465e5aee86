//! The trigger path.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};
use uuid::Uuid;

use gantry_orchestrator::{Job, OrchestratorClient};
use gantry_policy::{GroupScalingPolicy, ScaleDirection};
use gantry_state::{EventSource, EventStatus, ScalingEvent, StateStore};

use crate::error::ScaleResult;

/// A single requested count change for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupReq {
    pub direction: ScaleDirection,
    /// Step size. Callers resolve this from the policy when not
    /// explicitly supplied.
    pub count: u64,
    pub group_name: String,
    pub policy: GroupScalingPolicy,
}

/// Terminal status of a trigger call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerStatus {
    /// The job was modified, resubmitted, and recorded.
    Scaled,
    /// No group survived the checks; nothing was written anywhere.
    NotModified,
    /// The orchestrator does not know the job. Not an error.
    JobNotFound,
}

/// What a trigger call concluded.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerOutcome {
    /// Set only when the job was actually scaled.
    pub eval_id: Option<Uuid>,
    pub status: TriggerStatus,
}

/// Applies batches of group requests to live jobs.
pub struct Scaler {
    client: Arc<dyn OrchestratorClient>,
    state: StateStore,
    /// Strict mode requires an enabled, bound-compliant policy for every
    /// request before it may mutate.
    strict: bool,
}

impl Scaler {
    pub fn new(client: Arc<dyn OrchestratorClient>, state: StateStore) -> Self {
        Self {
            client,
            state,
            strict: true,
        }
    }

    /// Toggle strict checking (enabled by default).
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Apply a batch of group requests to `job_id` and resubmit it.
    ///
    /// Requests are applied in the order given. The first failing
    /// request stops the batch; later requests are never evaluated, not
    /// even for logging. That ordering is part of the contract, not a
    /// shortcut.
    pub async fn trigger(
        &self,
        job_id: &str,
        reqs: &[GroupReq],
        source: EventSource,
    ) -> ScaleResult<TriggerOutcome> {
        // Always act on a fresh copy of the job; a cached document could
        // carry counts another trigger already moved.
        let Some(mut job) = self.client.get_job(job_id).await? else {
            info!(job = %job_id, "job not found, nothing to scale");
            return Ok(TriggerOutcome {
                eval_id: None,
                status: TriggerStatus::JobNotFound,
            });
        };

        let mut modified = 0usize;
        for req in reqs {
            if !self.apply_request(&mut job, req) {
                break;
            }
            modified += 1;
        }

        if modified == 0 {
            debug!(job = %job_id, "no groups modified, skipping submission");
            return Ok(TriggerOutcome {
                eval_id: None,
                status: TriggerStatus::NotModified,
            });
        }

        self.client.register_job(&job).await?;

        let eval_id = Uuid::new_v4();
        let batch_id = Uuid::new_v4();
        let now = now_nanos();
        for req in reqs {
            let event = ScalingEvent {
                id: batch_id,
                eval_id,
                source,
                time: now,
                status: EventStatus::Completed,
                count: req.count,
                direction: req.direction,
                meta: HashMap::new(),
            };
            self.state
                .put_scaling_event(job_id, &req.group_name, &event)?;
        }

        info!(
            job = %job_id,
            requested = reqs.len(),
            modified,
            eval = %eval_id,
            "scaling trigger submitted"
        );
        Ok(TriggerOutcome {
            eval_id: Some(eval_id),
            status: TriggerStatus::Scaled,
        })
    }

    /// Apply one request to the owned job copy. Returns false to stop
    /// the batch.
    fn apply_request(&self, job: &mut Job, req: &GroupReq) -> bool {
        if self.strict && !req.policy.enabled {
            warn!(
                job = %job.id,
                group = %req.group_name,
                "scaling policy disabled, stopping batch"
            );
            return false;
        }

        let job_id = job.id.clone();
        let Some(group) = job.group_mut(&req.group_name) else {
            warn!(
                job = %job_id,
                group = %req.group_name,
                "group not present on live job, stopping batch"
            );
            return false;
        };

        let new_count = match req.direction {
            ScaleDirection::Out => group.count + req.count,
            ScaleDirection::In => group.count.saturating_sub(req.count),
            ScaleDirection::None => {
                warn!(
                    job = %job_id,
                    group = %req.group_name,
                    "request has no direction, stopping batch"
                );
                return false;
            }
        };

        if self.strict {
            match req.direction {
                ScaleDirection::In if new_count < req.policy.min_count => {
                    warn!(
                        job = %job_id,
                        group = %req.group_name,
                        new_count,
                        min_count = req.policy.min_count,
                        "scale-in would breach minimum, stopping batch"
                    );
                    return false;
                }
                ScaleDirection::Out if new_count > req.policy.max_count => {
                    warn!(
                        job = %job_id,
                        group = %req.group_name,
                        new_count,
                        max_count = req.policy.max_count,
                        "scale-out would breach maximum, stopping batch"
                    );
                    return false;
                }
                _ => {}
            }
        }

        debug!(
            job = %job_id,
            group = %req.group_name,
            from = group.count,
            to = new_count,
            "applying count change"
        );
        group.count = new_count;
        true
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
