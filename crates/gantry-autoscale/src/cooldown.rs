//! Cooldown gating.
//!
//! A group that scaled within its policy's cooldown window sits out the
//! round. The guard reads the latest recorded scaling event for the
//! group; no prior event means no cooldown.

use std::time::{SystemTime, UNIX_EPOCH};

use gantry_state::{StateResult, StateStore};

pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Whether `(job, group)` is still inside its cooldown window at
/// `now_ns` (nanosecond unix timestamp).
pub fn is_in_cooldown(
    store: &StateStore,
    job: &str,
    group: &str,
    cooldown_seconds: u64,
    now_ns: u64,
) -> StateResult<bool> {
    let Some(event) = store.latest_scaling_event(job, group)? else {
        return Ok(false);
    };
    Ok(now_ns.saturating_sub(cooldown_seconds * NANOS_PER_SECOND) < event.time)
}

/// Current unix time in nanoseconds.
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_policy::ScaleDirection;
    use gantry_state::{EventSource, EventStatus, ScalingEvent};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn store_with_event(time: u64) -> StateStore {
        let store = StateStore::open_in_memory().unwrap();
        let event = ScalingEvent {
            id: Uuid::new_v4(),
            eval_id: Uuid::new_v4(),
            source: EventSource::Autoscaler,
            time,
            status: EventStatus::Completed,
            count: 1,
            direction: ScaleDirection::Out,
            meta: HashMap::new(),
        };
        store.put_scaling_event("example", "web", &event).unwrap();
        store
    }

    #[test]
    fn no_prior_event_never_in_cooldown() {
        let store = StateStore::open_in_memory().unwrap();
        assert!(!is_in_cooldown(&store, "example", "web", 180, now_nanos()).unwrap());
    }

    #[test]
    fn inside_window_is_in_cooldown() {
        let event_time = 1_000 * NANOS_PER_SECOND;
        let store = store_with_event(event_time);

        // 179s after the event, with a 180s cooldown.
        let now = event_time + 179 * NANOS_PER_SECOND;
        assert!(is_in_cooldown(&store, "example", "web", 180, now).unwrap());
    }

    #[test]
    fn outside_window_is_not_in_cooldown() {
        let event_time = 1_000 * NANOS_PER_SECOND;
        let store = store_with_event(event_time);

        let now = event_time + 181 * NANOS_PER_SECOND;
        assert!(!is_in_cooldown(&store, "example", "web", 180, now).unwrap());
    }

    #[test]
    fn other_groups_unaffected() {
        let event_time = 1_000 * NANOS_PER_SECOND;
        let store = store_with_event(event_time);

        let now = event_time + 10 * NANOS_PER_SECOND;
        assert!(!is_in_cooldown(&store, "example", "cache", 180, now).unwrap());
    }

    #[test]
    fn early_clock_does_not_underflow() {
        let store = store_with_event(10 * NANOS_PER_SECOND);
        // now earlier than the cooldown span; saturating math keeps us
        // in cooldown instead of panicking.
        assert!(is_in_cooldown(&store, "example", "web", 180, 20 * NANOS_PER_SECOND).unwrap());
    }
}
