//! Persisted domain types.

use std::collections::HashMap;

use gantry_policy::ScaleDirection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded scaling action for one group.
///
/// One event is written per attempted group per trigger call; the `id` is
/// shared across every group in the same batch, while `eval_id`
/// identifies the trigger call itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScalingEvent {
    /// Batch identity, shared by all groups triggered together.
    pub id: Uuid,
    /// Identity of the trigger call that produced this event.
    pub eval_id: Uuid,
    pub source: EventSource,
    /// Nanosecond unix timestamp; the cooldown guard compares against
    /// this value.
    pub time: u64,
    pub status: EventStatus,
    pub count: u64,
    pub direction: ScaleDirection,
    pub meta: HashMap<String, String>,
}

impl ScalingEvent {
    /// Composite table key under the given job and group.
    pub fn table_key(&self, job: &str, group: &str) -> String {
        format!("{job}:{group}:{:020}", self.time)
    }
}

/// Where a trigger originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventSource {
    Autoscaler,
    Api,
}

/// Overall outcome of the trigger that produced the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventStatus {
    Completed,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_key_is_zero_padded() {
        let event = ScalingEvent {
            id: Uuid::new_v4(),
            eval_id: Uuid::new_v4(),
            source: EventSource::Autoscaler,
            time: 42,
            status: EventStatus::Completed,
            count: 1,
            direction: ScaleDirection::Out,
            meta: HashMap::new(),
        };
        assert_eq!(
            event.table_key("example", "web"),
            "example:web:00000000000000000042"
        );
    }

    #[test]
    fn key_order_is_chronological() {
        let early = ScalingEvent {
            id: Uuid::new_v4(),
            eval_id: Uuid::new_v4(),
            source: EventSource::Api,
            time: 999,
            status: EventStatus::Completed,
            count: 1,
            direction: ScaleDirection::In,
            meta: HashMap::new(),
        };
        let late = ScalingEvent {
            time: 1_000_000_000_000,
            ..early.clone()
        };
        assert!(early.table_key("j", "g") < late.table_key("j", "g"));
    }
}
