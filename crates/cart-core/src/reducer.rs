//! # Reducer
//!
//! The transition contract every store is driven by, plus the default cart
//! reducer.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   (current state, action) ──► Reducer::reduce ──► Ok(next state)       │
//! │                                      │                                  │
//! │                                      └──────────► Err(rejection)       │
//! │                                                                         │
//! │   • Pure: same inputs, same output, no I/O                              │
//! │   • Never mutates the current state; builds the next one               │
//! │   • A rejection leaves the store exactly where it was                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::marker::PhantomData;

use crate::error::{CoreError, CoreResult};
use crate::types::{Cart, CartAction, LineItem, LineItemId};
use crate::validation::{validate_cart_size, validate_quantity, validate_sku};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Reducer Trait
// =============================================================================

/// A pure transition function from `(state, action)` to the next state.
///
/// Stores own a reducer and call it for every dispatched action. The reducer
/// must not perform side effects; persistence and notification belong to the
/// store.
pub trait Reducer: Send + Sync + 'static {
    /// The state the reducer transitions.
    type State: Clone + PartialEq + Send + Sync + 'static;

    /// The actions it understands.
    type Action;

    /// Why an action can be rejected.
    type Error: StdError + Send + Sync + 'static;

    /// Computes the next state. `state` is left untouched.
    fn reduce(&self, state: &Self::State, action: Self::Action)
        -> Result<Self::State, Self::Error>;
}

// =============================================================================
// Closure Reducers
// =============================================================================

/// Adapts a closure into a [`Reducer`].
///
/// Built with [`reducer_fn`].
pub struct FnReducer<S, A, E, F> {
    f: F,
    _marker: PhantomData<fn(&S, A) -> Result<S, E>>,
}

/// Wraps `f` so it can drive a store.
///
/// ## Example
/// ```rust
/// use std::convert::Infallible;
/// use cart_core::{reducer_fn, Reducer};
///
/// let counter = reducer_fn(|n: &u32, by: u32| Ok::<_, Infallible>(n + by));
/// assert_eq!(counter.reduce(&1, 2).unwrap(), 3);
/// ```
pub fn reducer_fn<S, A, E, F>(f: F) -> FnReducer<S, A, E, F>
where
    F: Fn(&S, A) -> Result<S, E>,
{
    FnReducer {
        f,
        _marker: PhantomData,
    }
}

impl<S, A, E, F> Reducer for FnReducer<S, A, E, F>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    A: 'static,
    E: StdError + Send + Sync + 'static,
    F: Fn(&S, A) -> Result<S, E> + Send + Sync + 'static,
{
    type State = S;
    type Action = A;
    type Error = E;

    fn reduce(&self, state: &S, action: A) -> Result<S, E> {
        (self.f)(state, action)
    }
}

impl<S, A, E, F> fmt::Debug for FnReducer<S, A, E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReducer").finish_non_exhaustive()
    }
}

// =============================================================================
// Cart Reducer
// =============================================================================

/// The default reducer for [`Cart`].
///
/// ## Behavior
/// | Action            | Effect                                             |
/// |-------------------|----------------------------------------------------|
/// | `ADD`             | merges into an existing line, otherwise appends    |
/// | `UPDATE_QUANTITY` | sets the quantity; `0` removes the line            |
/// | `REMOVE`          | drops the line; unknown ids leave the cart as is   |
/// | `EMPTY`           | clears the cart                                    |
#[derive(Debug, Clone, Copy, Default)]
pub struct CartReducer;

impl CartReducer {
    pub fn new() -> Self {
        CartReducer
    }

    fn add(cart: &Cart, id: LineItemId, sku: Option<String>, qty: u32) -> CoreResult<Cart> {
        validate_quantity(qty)?;
        if let Some(sku) = sku.as_deref() {
            validate_sku(sku)?;
        }

        let mut items = cart.items().to_vec();

        if let Some(item) = items.iter_mut().find(|item| item.id == id) {
            let new_qty = u64::from(item.qty) + u64::from(qty);
            if new_qty > u64::from(MAX_ITEM_QUANTITY) {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            // new_qty <= MAX_ITEM_QUANTITY, so it fits in u32
            item.qty = new_qty as u32;
            if sku.is_some() {
                item.sku = sku;
            }
            return Ok(Cart::from(items));
        }

        validate_cart_size(items.len()).map_err(|_| CoreError::CartTooLarge {
            max: crate::MAX_CART_ITEMS,
        })?;

        items.push(LineItem { id, sku, qty });
        Ok(Cart::from(items))
    }

    fn update_quantity(cart: &Cart, id: LineItemId, qty: u32) -> CoreResult<Cart> {
        if !cart.contains(id) {
            return Err(CoreError::ItemNotInCart(id));
        }

        if qty == 0 {
            return Ok(Self::remove(cart, id));
        }

        if qty > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: u64::from(qty),
                max: MAX_ITEM_QUANTITY,
            });
        }

        Ok(cart
            .items()
            .iter()
            .map(|item| {
                if item.id == id {
                    LineItem {
                        qty,
                        ..item.clone()
                    }
                } else {
                    item.clone()
                }
            })
            .collect())
    }

    fn remove(cart: &Cart, id: LineItemId) -> Cart {
        cart.items()
            .iter()
            .filter(|item| item.id != id)
            .cloned()
            .collect()
    }
}

impl Reducer for CartReducer {
    type State = Cart;
    type Action = CartAction;
    type Error = CoreError;

    fn reduce(&self, cart: &Cart, action: CartAction) -> CoreResult<Cart> {
        match action {
            CartAction::Add { id, sku, qty } => Self::add(cart, id, sku, qty),
            CartAction::UpdateQuantity { id, qty } => Self::update_quantity(cart, id, qty),
            CartAction::Remove { id } => Ok(Self::remove(cart, id)),
            CartAction::Empty => Ok(Cart::new()),
        }
    }
}
