//! redb table definitions for the Gantry state store.
//!
//! Tables use `&str` keys and `&[u8]` values (JSON-serialized domain
//! types). Event keys are `{job}:{group}:{time_ns}` with the timestamp
//! zero-padded to 20 digits so key order is chronological order.

use redb::TableDefinition;

/// Scaling events keyed by `{job}:{group}:{time_ns:020}`.
pub const SCALING_EVENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("scaling_events");
