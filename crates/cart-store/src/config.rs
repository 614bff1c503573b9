//! # Store Configuration
//!
//! Where the cart is persisted and how chatty the logs are.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CART_*`)
//! 2. Defaults (this file)
//!
//! Configuration is read-only after initialization, so no mutex needed.

use std::path::PathBuf;

use cart_core::CART_STORAGE_KEY;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// File name of the local storage file inside the data directory.
pub const STORAGE_FILE_NAME: &str = "local_storage.json";

/// Default `EnvFilter` directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,cart_store=debug";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Key the cart snapshot is stored under.
    /// Default: "cart"
    pub storage_key: String,

    /// Explicit storage file. `None` uses the platform data directory.
    pub storage_path: Option<PathBuf>,

    /// Fallback log filter directive, used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            storage_key: CART_STORAGE_KEY.to_string(),
            storage_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl StoreConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `CART_STORAGE_KEY`: Override the storage key
    /// - `CART_STORAGE_PATH`: Use a specific storage file
    /// - `CART_LOG`: Override the fallback log filter
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = StoreConfig::default();

        if let Some(key) = lookup("CART_STORAGE_KEY").filter(|k| !k.trim().is_empty()) {
            config.storage_key = key;
        }

        if let Some(path) = lookup("CART_STORAGE_PATH").filter(|p| !p.trim().is_empty()) {
            config.storage_path = Some(PathBuf::from(path));
        }

        if let Some(filter) = lookup("CART_LOG").filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        config
    }

    /// Determines the storage file path.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/com.cartstore.cart/local_storage.json`
    /// - **Windows**: `%APPDATA%\cartstore\cart\data\local_storage.json`
    /// - **Linux**: `~/.local/share/cart/local_storage.json`
    pub fn resolve_storage_path(&self) -> Result<PathBuf, StorageError> {
        if let Some(path) = &self.storage_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "cartstore", "cart").ok_or(StorageError::NoDataDir)?;
        Ok(dirs.data_dir().join(STORAGE_FILE_NAME))
    }
}
