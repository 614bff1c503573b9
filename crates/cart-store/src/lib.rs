//! # cart-store: Shared Cart State with Local Persistence
//!
//! A provider that owns the shopping cart, restores it from local storage,
//! writes it back after every change, and hands `{cart, dispatch}` to the
//! components it renders.
//!
//! ## Module Organization
//! ```text
//! cart_store/
//! ├── lib.rs          ◄─── You are here (re-exports, tracing setup)
//! ├── storage.rs      ◄─── Storage trait, MemoryStorage, FileStorage
//! ├── snapshot.rs     ◄─── Snapshot encode/decode, load_initial fallback
//! ├── store.rs        ◄─── Observable Store, Commit, Subscription
//! ├── persist.rs      ◄─── persist_on_commit listener
//! ├── scope.rs        ◄─── Explicit context chain
//! ├── provider.rs     ◄─── CartProvider, CartContext, use_cart
//! ├── config.rs       ◄─── StoreConfig (env + defaults)
//! └── error.rs        ◄─── StorageError, SnapshotError, UsageError
//! ```
//!
//! ## Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  load ──► CartProvider::new ──► load_initial (one storage read)        │
//! │                │                                                        │
//! │                ▼                                                        │
//! │         render(&scope, children) ──► use_cart(scope) ──► CartContext   │
//! │                                                              │          │
//! │                                   dispatch(action) ◄─────────┘          │
//! │                                          │                              │
//! │                                          ▼                              │
//! │                      reducer ──► commit ──► persist_on_commit           │
//! │                                        └──► subscribers re-render       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod persist;
pub mod provider;
pub mod scope;
pub mod snapshot;
pub mod storage;
pub mod store;

#[cfg(test)]
mod test_support;

use tracing_subscriber::EnvFilter;

pub use config::StoreConfig;
pub use error::{SnapshotError, StorageError, UsageError};
pub use persist::persist_on_commit;
pub use provider::{try_use_cart, use_cart, CartContext, CartProvider, Dispatch};
pub use scope::Scope;
pub use snapshot::{load_initial, read_snapshot, write_snapshot};
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{ChangePolicy, Commit, Store, Subscription};

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cart_store=trace` - Include no-op dispatches
/// - Default: `config.log_filter`
///
/// Returns false if a global subscriber was already installed.
pub fn init_tracing(config: &StoreConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
