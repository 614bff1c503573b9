//! # cart-core: Pure Cart Logic
//!
//! This crate holds everything about a shopping cart that can be expressed
//! without I/O: the line item shape, the reducer contract and the default
//! cart reducer.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Store Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI Components                                │   │
//! │  │    Product Page ──► Cart Page ──► Checkout                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ use_cart(scope)                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    cart-store                                   │   │
//! │  │    CartProvider, Store, persistence, local storage             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Reducer::reduce                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ cart-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │  reducer  │  │ validation│                  │   │
//! │  │   │ LineItem  │  │ Reducer   │  │   rules   │                  │   │
//! │  │   │   Cart    │  │CartReducer│  │  checks   │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • PURE FUNCTIONS                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `LineItem`, `Cart`, `CartAction`
//! - [`reducer`] - The `Reducer` trait and the default `CartReducer`
//! - [`error`] - Domain error types
//! - [`validation`] - Quantity, size and SKU checks
//!
//! ## Example Usage
//!
//! ```rust
//! use cart_core::{Cart, CartAction, CartReducer, Reducer};
//!
//! let reducer = CartReducer::new();
//! let cart = reducer
//!     .reduce(&Cart::new(), CartAction::add(1, 2))
//!     .unwrap();
//! assert_eq!(cart.total_quantity(), 2);
//!
//! let cart = reducer.reduce(&cart, CartAction::Remove { id: 1 }).unwrap();
//! assert!(cart.is_empty());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod reducer;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use reducer::{reducer_fn, CartReducer, FnReducer, Reducer};
pub use types::{Cart, CartAction, LineItem, LineItemId};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Local storage key the cart snapshot lives under.
pub const CART_STORAGE_KEY: &str = "cart";

/// Maximum distinct line items allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps the persisted snapshot small.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: u32 = 999;
