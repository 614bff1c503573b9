//! # Error Types
//!
//! Domain-specific error types for cart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cart-core errors (this file)                                          │
//! │  ├── CoreError        - Reducer rejections                             │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  cart-store errors (separate crate)                                    │
//! │  ├── StorageError     - Local storage read/write failures              │
//! │  ├── SnapshotError    - Persisted cart could not be decoded            │
//! │  └── UsageError       - use_cart called outside a CartProvider         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → Store::dispatch caller            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item ID, limits)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::LineItemId;

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by [`CartReducer`](crate::CartReducer) when an action is
/// rejected.
///
/// A rejected action leaves the cart untouched, so nothing is committed or
/// persisted.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The action targets a line item the cart does not contain.
    ///
    /// ## When This Occurs
    /// - `UPDATE_QUANTITY` for an item that was already removed
    /// - A stale UI row dispatching after the cart was emptied
    #[error("Item {0} is not in the cart")]
    ItemNotInCart(LineItemId),

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5), already holding 997
    ///      │
    ///      ▼
    /// QuantityTooLarge { requested: 1002, max: 999 }
    ///      │
    ///      ▼
    /// UI shows: "Quantity 1002 exceeds maximum allowed (999)"
    /// ```
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u64, max: u32 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when an action's payload doesn't meet requirements.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., SKU with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
