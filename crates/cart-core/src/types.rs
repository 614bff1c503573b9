//! # Domain Types
//!
//! The cart's line items and the actions UI components dispatch against it.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    LineItem     │   │      Cart       │   │     CartAction      │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id (u64)       │   │  Vec<LineItem>  │   │  ADD                │   │
//! │  │  sku (optional) │   │  ordered,       │   │  UPDATE_QUANTITY    │   │
//! │  │  qty            │   │  unique by id   │   │  REMOVE             │   │
//! │  └─────────────────┘   └─────────────────┘   │  EMPTY              │   │
//! │                                              └─────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format
//! A cart serializes as a bare JSON array, which is exactly what sits in
//! local storage under the `"cart"` key:
//!
//! ```json
//! [{"id":1,"qty":2},{"id":4,"sku":"BOOT-42","qty":1}]
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identifier of the product a line item refers to.
pub type LineItemId = u64;

// =============================================================================
// Line Item
// =============================================================================

/// One row of the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Product identifier; unique within a cart.
    #[ts(type = "number")]
    pub id: LineItemId,

    /// Optional SKU of the chosen variant (size, colour).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub sku: Option<String>,

    /// Quantity, always at least 1 while the item is in the cart.
    pub qty: u32,
}

impl LineItem {
    /// Creates a line item without a SKU.
    pub fn new(id: LineItemId, qty: u32) -> Self {
        LineItem { id, sku: None, qty }
    }

    /// Attaches a SKU.
    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart: an ordered sequence of line items.
///
/// ## Invariants
/// - Items are unique by `id` (adding the same id increases quantity)
/// - Every `qty` is between 1 and 999 when produced by `CartReducer`
/// - At most 100 distinct items when produced by `CartReducer`
///
/// The empty cart is the `Default`, which is also the fallback whenever no
/// usable snapshot exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart(pub(crate) Vec<LineItem>);

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart(Vec::new())
    }

    /// The line items in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.0
    }

    /// Looks up the line item for a product.
    pub fn get(&self, id: LineItemId) -> Option<&LineItem> {
        self.0.iter().find(|item| item.id == id)
    }

    /// Returns true if the cart holds a line item for `id`.
    pub fn contains(&self, id: LineItemId) -> bool {
        self.get(id).is_some()
    }

    /// Returns the number of distinct line items.
    pub fn item_count(&self) -> usize {
        self.0.len()
    }

    /// Returns the total quantity across all line items.
    pub fn total_quantity(&self) -> u64 {
        self.0.iter().map(|item| u64::from(item.qty)).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the cart, returning its line items.
    pub fn into_items(self) -> Vec<LineItem> {
        self.0
    }
}

impl From<Vec<LineItem>> for Cart {
    fn from(items: Vec<LineItem>) -> Self {
        Cart(items)
    }
}

impl FromIterator<LineItem> for Cart {
    fn from_iter<I: IntoIterator<Item = LineItem>>(iter: I) -> Self {
        Cart(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// Cart Action
// =============================================================================

/// An action dispatched against the cart.
///
/// Tagged by `type` so UI code can send `{"type":"REMOVE","id":1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartAction {
    /// Adds `qty` of a product, merging with an existing line for the same id.
    Add {
        #[ts(type = "number")]
        id: LineItemId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        sku: Option<String>,
        #[serde(default = "default_add_qty")]
        qty: u32,
    },

    /// Sets the quantity of an existing line. Zero removes it.
    UpdateQuantity {
        #[ts(type = "number")]
        id: LineItemId,
        qty: u32,
    },

    /// Removes the line for a product.
    Remove {
        #[ts(type = "number")]
        id: LineItemId,
    },

    /// Clears the cart, e.g. after checkout.
    Empty,
}

fn default_add_qty() -> u32 {
    1
}

impl CartAction {
    /// Shorthand for an `ADD` without a SKU.
    pub fn add(id: LineItemId, qty: u32) -> Self {
        CartAction::Add { id, sku: None, qty }
    }

    /// The wire name of the action, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CartAction::Add { .. } => "ADD",
            CartAction::UpdateQuantity { .. } => "UPDATE_QUANTITY",
            CartAction::Remove { .. } => "REMOVE",
            CartAction::Empty => "EMPTY",
        }
    }
}
