//! Leadership gating.
//!
//! Cluster leadership election lives elsewhere; the scheduler only needs
//! a boolean answer re-checked every round.

/// Whether this instance is allowed to run evaluation rounds.
pub trait LeadershipGate: Send + Sync {
    fn is_leader(&self) -> bool;
}

/// Single-instance deployments are always the leader.
pub struct Standalone;

impl LeadershipGate for Standalone {
    fn is_leader(&self) -> bool {
        true
    }
}
