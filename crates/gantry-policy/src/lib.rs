//! gantry-policy — scaling policy schema, defaulting, and validation.
//!
//! A [`GroupScalingPolicy`] governs whether and how a single job group may
//! be scaled: replica bounds, step sizes, cooldown, the four optional
//! CPU/memory percentage thresholds, and any number of named external
//! metric checks.
//!
//! Policies are validated at write time. A policy where every gating field
//! is still at its zero value is rejected as empty; fields left at zero in
//! an accepted policy are backfilled from the documented defaults
//! (min=2, max=10, cooldown=180s, step=1).

pub mod error;
pub mod policy;

pub use error::{PolicyError, PolicyResult};
pub use policy::{
    CheckAction, ComparisonOperator, ExternalCheck, GroupScalingPolicy, ProviderKind,
    ScaleDirection, DEFAULT_COOLDOWN_SECONDS, DEFAULT_MAX_COUNT, DEFAULT_MIN_COUNT,
    DEFAULT_SCALE_STEP,
};
