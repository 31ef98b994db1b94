//! Cross-suite entity state
//!
//! Suites run as separate processes with no shared memory. Identifiers of
//! entities one suite creates travel to later suites through the page's
//! storage, which is snapshotted to a single file at suite end and loaded
//! into a fresh session at the start of the next suite.

mod keys;
mod snapshot;
mod storage;
mod store;

pub use keys::{KeySchema, KeySpec};
pub use snapshot::{RestoreOutcome, SnapshotFile};
pub use storage::{Cookie, StorageState};
pub use store::EntityStateStore;
