//! StateStore — redb-backed scaling event persistence.
//!
//! The cooldown guard needs exactly one query shape: the latest event for
//! a `(job, group)` pair. Events are stored under chronologically ordered
//! composite keys, so that query is a prefix scan keeping the last match.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use crate::error::{StateError, StateResult};
use crate::tables::SCALING_EVENTS;
use crate::types::ScalingEvent;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe state store backed by redb.
#[derive(Clone)]
pub struct StateStore {
    db: Arc<Database>,
}

impl StateStore {
    /// Open (or create) a persistent state store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "state store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory state store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory state store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(SCALING_EVENTS).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Record a scaling event for a job group.
    pub fn put_scaling_event(
        &self,
        job: &str,
        group: &str,
        event: &ScalingEvent,
    ) -> StateResult<()> {
        let key = event.table_key(job, group);
        let value = serde_json::to_vec(event).map_err(map_err!(Serialize))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(SCALING_EVENTS).map_err(map_err!(Table))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%job, %group, id = %event.id, "scaling event stored");
        Ok(())
    }

    /// The most recent scaling event for `(job, group)`, if any.
    ///
    /// Keys are chronologically ordered, so the last key under the
    /// group's prefix is the latest event.
    pub fn latest_scaling_event(
        &self,
        job: &str,
        group: &str,
    ) -> StateResult<Option<ScalingEvent>> {
        let prefix = format!("{job}:{group}:");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SCALING_EVENTS).map_err(map_err!(Table))?;

        let mut latest: Option<ScalingEvent> = None;
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let event: ScalingEvent =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                latest = Some(event);
            }
        }
        Ok(latest)
    }

    /// All scaling events for `(job, group)`, oldest first.
    pub fn list_scaling_events(&self, job: &str, group: &str) -> StateResult<Vec<ScalingEvent>> {
        let prefix = format!("{job}:{group}:");
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(SCALING_EVENTS).map_err(map_err!(Table))?;

        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            if key.value().starts_with(&prefix) {
                let event: ScalingEvent =
                    serde_json::from_slice(value.value()).map_err(map_err!(Deserialize))?;
                results.push(event);
            }
        }
        Ok(results)
    }
}
