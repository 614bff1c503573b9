//! # Persistence on Commit
//!
//! Writes the store's state back to local storage after every commit.
//!
//! ```text
//! dispatch ──► commit ──► listener ──► write_snapshot(key, current)
//!                                          │
//!                                          └── Err ──► error! (state stays)
//! ```
//!
//! The listener only fires for real commits, so under
//! [`ChangePolicy::ValueEq`](crate::store::ChangePolicy::ValueEq) an action
//! that leaves the cart equal never touches storage.

use std::sync::Arc;

use cart_core::Reducer;
use serde::Serialize;
use tracing::{debug, error};

use crate::snapshot::write_snapshot;
use crate::storage::Storage;
use crate::store::{Commit, Store, Subscription};

/// Registers a listener that persists every committed state under `key`.
///
/// Write failures are logged and otherwise ignored; the committed state is
/// not rolled back.
pub fn persist_on_commit<R>(
    store: &Store<R>,
    storage: Arc<dyn Storage>,
    key: impl Into<String>,
) -> Subscription
where
    R: Reducer,
    R::State: Serialize,
{
    let key = key.into();

    store.subscribe(move |commit: &Commit<R::State>| {
        match write_snapshot(storage.as_ref(), &key, commit.current.as_ref()) {
            Ok(text) => debug!(
                key = %key,
                version = commit.version,
                bytes = text.len(),
                "Persisted snapshot"
            ),
            Err(e) => error!(
                key = %key,
                version = commit.version,
                error = %e,
                "Failed to persist snapshot"
            ),
        }
    })
}
