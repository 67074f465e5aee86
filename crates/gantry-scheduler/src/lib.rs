//! gantry-scheduler — drives evaluation rounds.
//!
//! A single periodic timer starts rounds; each round fetches all
//! policies once and fans one unit of work per job out over a bounded
//! worker pool. A round that would overlap the previous one is skipped
//! outright (shed load, never queue), and an instance that is not the
//! leader sits out entirely.

pub mod evaluator;
pub mod leadership;

pub use evaluator::Evaluator;
pub use leadership::{LeadershipGate, Standalone};
