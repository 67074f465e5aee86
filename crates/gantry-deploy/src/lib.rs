//! gantry-deploy — knows which job groups are mid-rollout.
//!
//! A group under an active orchestrator deployment must never be scaled;
//! the two mutations would race. The [`DeploymentTracker`] owns the set
//! of `(job, group)` keys currently deploying, fed by a single consumer
//! draining status updates, and exposes a pure lookup for the scaler's
//! callers. The [`DeploymentWatcher`] produces those updates by
//! long-polling the orchestrator's deployment list.

pub mod tracker;
pub mod watcher;

pub use tracker::{DeploymentKey, DeploymentTracker, DeploymentUpdate};
pub use watcher::DeploymentWatcher;
