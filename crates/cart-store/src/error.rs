//! # Store Error Types
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in cart-store                             │
//! │                                                                         │
//! │  StorageError ──► SnapshotError ──► load_initial                        │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                               tracing::error! + empty cart              │
//! │                               (recovered, never reaches the UI)         │
//! │                                                                         │
//! │  StorageError ──► persist_on_commit ──► tracing::error!                 │
//! │                                        (state stays committed)          │
//! │                                                                         │
//! │  UsageError ───► try_use_cart ──► caller                                │
//! │              └─► use_cart ──────► panic (programmer error)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Failures of the local key-value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The storage contents could not be encoded.
    #[error("Storage encoding failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// The backing file exists but is not a JSON object of strings.
    #[error("Storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The platform has no data directory and no path was configured.
    #[error("Could not determine a data directory for local storage")]
    NoDataDir,
}

/// Failures reading or writing the persisted cart snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored text is not a valid snapshot.
    #[error("The value under '{key}' could not be parsed into JSON: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The state could not be serialized.
    #[error("The value for '{key}' could not be serialized: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The underlying storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Accessor used outside of the provider it depends on.
///
/// This is a programmer error; it is meant to fail fast during development,
/// not to be handled at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error(
        "{hook} must be used within a {provider}. \
         Wrap a parent component in <{provider}> to fix this error."
    )]
    MissingProvider {
        hook: &'static str,
        provider: &'static str,
    },
}
