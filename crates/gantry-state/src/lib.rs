//! gantry-state — persistence for scaling events and policies.
//!
//! Backed by [redb](https://docs.rs/redb). Scaling events are
//! JSON-serialized into redb's `&[u8]` value column under composite
//! `{job}:{group}:{time}` keys; the zero-padded nanosecond timestamp makes
//! lexicographic order equal chronological order, so "latest event for a
//! group" is a prefix scan.
//!
//! The [`StateStore`] is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks. Policy storage
//! is a separate trait ([`PolicyStore`]) with an in-memory backend;
//! distributed backends plug in behind the same trait.

pub mod error;
pub mod policy_store;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use policy_store::{MemoryPolicyStore, PolicySet, PolicyStore};
pub use store::StateStore;
pub use types::*;
