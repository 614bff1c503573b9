//! # Persisted Snapshot
//!
//! Reads and writes the JSON text of a store's state under one storage key.
//!
//! ## Initial Load Decisions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  storage.get_item(key)                                                  │
//! │       │                                                                 │
//! │       ├── key absent ───────────────► default            (no report)   │
//! │       │                                                                 │
//! │       ├── "null" ───────────────────► default            (no report)   │
//! │       │                                                                 │
//! │       ├── decodes as state ─────────► parsed state                     │
//! │       │                                                                 │
//! │       ├── malformed / wrong shape ──► default + error!   (one report)  │
//! │       │                                                                 │
//! │       └── storage read fails ───────► default + error!   (one report)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Decoding is typed: valid JSON of the wrong shape (`"hello"`, `{}`) fails
//! to decode and is treated like malformed text.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::error::SnapshotError;
use crate::storage::Storage;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Serializes `state` to the text stored under a snapshot key.
pub fn encode<S: Serialize>(key: &str, state: &S) -> SnapshotResult<String> {
    serde_json::to_string(state).map_err(|source| SnapshotError::Encode {
        key: key.to_string(),
        source,
    })
}

/// Reads the snapshot under `key`.
///
/// Returns `Ok(None)` when the key is absent or holds JSON `null`.
pub fn read_snapshot<S: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> SnapshotResult<Option<S>> {
    let Some(text) = storage.get_item(key)? else {
        return Ok(None);
    };

    serde_json::from_str::<Option<S>>(&text).map_err(|source| SnapshotError::Malformed {
        key: key.to_string(),
        source,
    })
}

/// Writes `state` under `key`, replacing whatever was there.
///
/// Returns the written text.
pub fn write_snapshot<S: Serialize>(
    storage: &dyn Storage,
    key: &str,
    state: &S,
) -> SnapshotResult<String> {
    let text = encode(key, state)?;
    storage.set_item(key, &text)?;
    Ok(text)
}

/// Loads the initial state for a store, never failing.
///
/// Any problem with the stored value is reported once through
/// `tracing::error!` and replaced by `S::default()`.
pub fn load_initial<S>(storage: &dyn Storage, key: &str) -> S
where
    S: DeserializeOwned + Default,
{
    match read_snapshot(storage, key) {
        Ok(Some(state)) => {
            debug!(key = %key, "Restored persisted snapshot");
            state
        }
        Ok(None) => {
            debug!(key = %key, "No persisted snapshot, starting empty");
            S::default()
        }
        Err(e) => {
            error!(key = %key, error = %e, "The cart could not be parsed into JSON.");
            S::default()
        }
    }
}
