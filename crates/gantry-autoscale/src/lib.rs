//! gantry-autoscale — turns usage and policy into scaling decisions.
//!
//! The [`DecisionEngine`] evaluates every policy-bearing group of a job
//! against its thresholds and external checks and produces at most one
//! [`ScalingDecision`] per group. When signals disagree, scale-out wins:
//! availability is preferred over cost-saving.
//!
//! The [`cooldown`] module gates re-triggering: a group that scaled too
//! recently sits out the round.

pub mod cooldown;
pub mod decision;

pub use cooldown::{is_in_cooldown, now_nanos, NANOS_PER_SECOND};
pub use decision::{DecisionEngine, DecisionMetric, ScalingDecision};
