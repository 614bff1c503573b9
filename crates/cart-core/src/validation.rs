//! # Validation Module
//!
//! Input validation for cart actions.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI component                                                  │
//! │  └── Quantity pickers, disabled buttons                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Action decoding (serde)                                      │
//! │  └── Shape of CartAction / LineItem                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: CartReducer                                                   │
//! │  └── THIS MODULE: quantity, cart size and SKU rules                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use cart_core::validation::{validate_quantity, validate_sku};
//!
//! validate_sku("BOOT-42").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest SKU accepted on a line item.
pub const MAX_SKU_LENGTH: usize = 32;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a catalogue SKU attached to a line item.
///
/// SKUs are stored verbatim in the persisted cart, so nothing is trimmed or
/// case-folded here.
///
/// ## Rules
/// - Must not be empty
/// - At most [`MAX_SKU_LENGTH`] characters
/// - Hyphen-separated segments of uppercase ASCII letters and digits
///   (`BOOT-42`, `TENT-2P`); no empty segment
///
/// ## Example
/// ```rust
/// use cart_core::validation::validate_sku;
///
/// assert!(validate_sku("BOOT-42").is_ok());
/// assert!(validate_sku("boot-42").is_err());
/// assert!(validate_sku("BOOT--42").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LENGTH {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LENGTH,
        });
    }

    let well_formed = sku.split('-').all(|segment| {
        !segment.is_empty()
            && segment
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    });

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must be uppercase letters and digits in hyphen-separated segments"
                .to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity carried by an action.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart: Add Item                                                         │
/// │                                                                         │
/// │  dispatch(ADD { id: 7, qty: 5 })                                        │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty == 0? → Error: "qty must be positive"                    │
/// │       │                                                                 │
/// │       ├── qty > 999? → Error: "qty must be between 1 and 999"          │
/// │       │                                                                 │
/// │       └── OK → reducer continues                                       │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: i64::from(MAX_ITEM_QUANTITY),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more distinct item fits in the cart.
///
/// ## Rules
/// - `current_items` must be below MAX_CART_ITEMS (100)
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}
