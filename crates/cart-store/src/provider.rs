//! # Cart Provider and `use_cart`
//!
//! The provider owns the cart store and its persistence; components reach it
//! through the scope the provider renders them with.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Provider Lifecycle                              │
//! │                                                                         │
//! │  CartProvider::new(storage, reducer, "cart")                            │
//! │       │                                                                 │
//! │       ├── load_initial  ─── storage read, exactly once                  │
//! │       ├── Store::new    ─── seeded with the initial cart                │
//! │       └── persist_on_commit ─── write on every commit                   │
//! │                                                                         │
//! │  provider.render(&scope, |scope| { ... })                               │
//! │       │                                                                 │
//! │       └── child scope carries a fresh CartContext { cart, dispatch }   │
//! │                                                                         │
//! │  use_cart(&scope)                                                       │
//! │       ├── inside render ──► CartContext                                 │
//! │       └── outside ────────► UsageError::MissingProvider (panic)         │
//! │                                                                         │
//! │  drop(provider)                                                         │
//! │       └── leftover Dispatch clones become no-ops                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use cart_core::{CartAction, CartReducer};
//! use cart_store::{use_cart, CartContext, CartProvider, MemoryStorage, Scope, Storage};
//!
//! let storage = Arc::new(MemoryStorage::new().with_item("cart", r#"[{"id":1,"qty":2}]"#));
//! let provider = CartProvider::new(storage.clone(), CartReducer, "cart");
//!
//! provider.render(&Scope::root(), |scope| {
//!     let ctx: CartContext = use_cart(scope);
//!     assert_eq!(ctx.cart.item_count(), 1);
//!     ctx.dispatch.dispatch(CartAction::Remove { id: 1 }).unwrap();
//! });
//!
//! assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("[]"));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use cart_core::{CartReducer, Reducer};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::StoreConfig;
use crate::error::{StorageError, UsageError};
use crate::persist::persist_on_commit;
use crate::scope::Scope;
use crate::snapshot::load_initial;
use crate::storage::{FileStorage, Storage};
use crate::store::{Commit, Store, Subscription};

/// Name of the accessor, as it appears in usage errors.
pub const HOOK_NAME: &str = "use_cart";

/// Name of the provider, as it appears in usage errors.
pub const PROVIDER_NAME: &str = "CartProvider";

// =============================================================================
// Dispatch
// =============================================================================

/// Stable capability to send actions to the cart store.
///
/// Every context value built by the same provider carries an equal
/// `Dispatch`.
///
/// A `Dispatch` can outlive its provider. Once the provider is dropped its
/// persistence is gone, so dispatching becomes a no-op that returns the last
/// cart.
pub struct Dispatch<R: Reducer = CartReducer> {
    store: Store<R>,
    mounted: Arc<AtomicBool>,
}

impl<R: Reducer> Dispatch<R> {
    /// Sends `action` through the reducer.
    ///
    /// See [`Store::dispatch`]. After the provider is dropped the action is
    /// ignored and the last cart is returned.
    pub fn dispatch(&self, action: R::Action) -> Result<Arc<R::State>, R::Error> {
        if !self.is_mounted() {
            warn!("Dispatch after the cart provider was dropped; action ignored");
            return Ok(self.store.state());
        }
        self.store.dispatch(action)
    }

    /// Returns false once the provider that built this handle is dropped.
    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }
}

impl<R: Reducer> Clone for Dispatch<R> {
    fn clone(&self) -> Self {
        Dispatch {
            store: self.store.clone(),
            mounted: Arc::clone(&self.mounted),
        }
    }
}

impl<R: Reducer> PartialEq for Dispatch<R> {
    fn eq(&self, other: &Self) -> bool {
        self.store.ptr_eq(&other.store)
    }
}

impl<R: Reducer> Eq for Dispatch<R> {}

impl<R: Reducer> fmt::Debug for Dispatch<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispatch").field(&self.store).finish()
    }
}

// =============================================================================
// Cart Context
// =============================================================================

/// The value `use_cart` hands to components: the cart snapshot as of the
/// render plus the dispatch capability.
pub struct CartContext<R: Reducer = CartReducer> {
    pub cart: Arc<R::State>,
    pub dispatch: Dispatch<R>,
}

impl<R: Reducer> Clone for CartContext<R> {
    fn clone(&self) -> Self {
        CartContext {
            cart: Arc::clone(&self.cart),
            dispatch: self.dispatch.clone(),
        }
    }
}

impl<R: Reducer> fmt::Debug for CartContext<R>
where
    R::State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartContext")
            .field("cart", &self.cart)
            .field("dispatch", &self.dispatch)
            .finish()
    }
}

// =============================================================================
// Cart Provider
// =============================================================================

/// Owns the cart store and keeps local storage in step with it.
pub struct CartProvider<R: Reducer = CartReducer> {
    store: Store<R>,
    key: String,
    mounted: Arc<AtomicBool>,
    _persistence: Subscription,
}

impl<R> CartProvider<R>
where
    R: Reducer,
    R::State: Serialize + DeserializeOwned + Default,
{
    /// Mounts a provider, reading the initial cart from `storage` once.
    ///
    /// A missing or unreadable snapshot starts an empty cart; see
    /// [`load_initial`].
    pub fn new(storage: Arc<dyn Storage>, reducer: R, key: impl Into<String>) -> Self {
        let key = key.into();
        let initial = load_initial::<R::State>(storage.as_ref(), &key);
        Self::with_initial(initial, storage, reducer, key)
    }
}

impl<R> CartProvider<R>
where
    R: Reducer,
    R::State: Serialize,
{
    /// Mounts a provider from an initial cart the caller already loaded.
    ///
    /// The initial value is captured here and never re-read.
    pub fn with_initial(
        initial: R::State,
        storage: Arc<dyn Storage>,
        reducer: R,
        key: impl Into<String>,
    ) -> Self {
        let key = key.into();
        let store = Store::new(initial, reducer);
        let persistence = persist_on_commit(&store, storage, key.clone());

        info!(key = %key, "Cart provider mounted");

        CartProvider {
            store,
            key,
            mounted: Arc::new(AtomicBool::new(true)),
            _persistence: persistence,
        }
    }
}

impl<R: Reducer> CartProvider<R> {
    /// Builds the context value for the current render.
    pub fn context(&self) -> CartContext<R> {
        CartContext {
            cart: self.store.state(),
            dispatch: Dispatch {
                store: self.store.clone(),
                mounted: Arc::clone(&self.mounted),
            },
        }
    }

    /// Renders `children` inside a scope that provides the cart.
    ///
    /// `children` gets a child of `parent`, so values provided further up
    /// stay visible.
    pub fn render<T>(&self, parent: &Scope, children: impl FnOnce(&Scope) -> T) -> T {
        let scope = parent.provide(self.context());
        children(&scope)
    }

    /// Registers a re-render callback that runs after every commit.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Commit<R::State>) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn store(&self) -> &Store<R> {
        &self.store
    }

    /// Storage key the cart is persisted under.
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl CartProvider<CartReducer> {
    /// Mounts a provider backed by the file storage described in `config`.
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        let path = config.resolve_storage_path()?;
        let storage = FileStorage::open(&path)?;
        info!(path = %path.display(), "Opened cart storage");

        Ok(Self::new(
            Arc::new(storage),
            CartReducer::new(),
            config.storage_key.clone(),
        ))
    }
}

impl<R: Reducer> Drop for CartProvider<R> {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        info!(key = %self.key, "Cart provider dropped");
    }
}

impl<R: Reducer> fmt::Debug for CartProvider<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartProvider")
            .field("key", &self.key)
            .field("store", &self.store)
            .finish()
    }
}

// =============================================================================
// Accessor
// =============================================================================

/// Returns the cart context provided to `scope`.
///
/// ## Errors
/// [`UsageError::MissingProvider`] if no `CartProvider` rendered `scope` or
/// one of its ancestors.
pub fn try_use_cart<R: Reducer>(scope: &Scope) -> Result<CartContext<R>, UsageError> {
    scope
        .consume::<CartContext<R>>()
        .ok_or(UsageError::MissingProvider {
            hook: HOOK_NAME,
            provider: PROVIDER_NAME,
        })
}

/// Returns the cart context provided to `scope`.
///
/// # Panics
/// Panics with the [`UsageError`] message when called outside a
/// `CartProvider`. That is a wiring bug, not a runtime condition.
pub fn use_cart<R: Reducer>(scope: &Scope) -> CartContext<R> {
    match try_use_cart(scope) {
        Ok(context) => context,
        Err(e) => panic!("{e}"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::test_support::count_errors;
    use cart_core::{Cart, CartAction, LineItem};

    fn mount(storage: &Arc<MemoryStorage>) -> CartProvider {
        CartProvider::new(storage.clone(), CartReducer, "cart")
    }

    #[test]
    fn test_restores_persisted_cart_and_removes() {
        let storage = Arc::new(MemoryStorage::new().with_item("cart", r#"[{"id":1,"qty":2}]"#));
        let provider = mount(&storage);

        provider.render(&Scope::root(), |scope| {
            let ctx: CartContext = use_cart(scope);
            assert_eq!(*ctx.cart, Cart::from(vec![LineItem::new(1, 2)]));

            let cart = ctx.dispatch.dispatch(CartAction::Remove { id: 1 }).unwrap();
            assert!(cart.is_empty());
        });

        assert!(provider.store().state().is_empty());
        assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty_and_reports_once() {
        let storage = Arc::new(MemoryStorage::new().with_item("cart", "{not json"));

        let (provider, errors) = count_errors(|| mount(&storage));

        assert!(provider.context().cart.is_empty());
        assert_eq!(errors, 1);
        // untouched until the next dispatch
        assert_eq!(storage.get_item("cart").unwrap().as_deref(), Some("{not json"));
        assert_eq!(storage.write_count(), 0);

        provider
            .context()
            .dispatch
            .dispatch(CartAction::add(3, 1))
            .unwrap();
        assert_eq!(
            storage.get_item("cart").unwrap().as_deref(),
            Some(r#"[{"id":3,"qty":1}]"#)
        );
    }

    #[test]
    fn test_mount_does_not_write() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = mount(&storage);

        provider.render(&Scope::root(), |_| {});
        provider.render(&Scope::root(), |_| {});

        assert_eq!(storage.write_count(), 0);
    }

    #[test]
    fn test_initial_cart_is_read_once() {
        let storage = Arc::new(MemoryStorage::new().with_item("cart", r#"[{"id":1,"qty":2}]"#));
        let provider = mount(&storage);

        // someone else overwrites storage after mount; renders keep the store's cart
        storage.set_item("cart", r#"[{"id":9,"qty":9}]"#).unwrap();

        let cart = provider.render(&Scope::root(), |scope| {
            let ctx: CartContext = use_cart(scope);
            ctx.cart
        });
        assert_eq!(*cart, Cart::from(vec![LineItem::new(1, 2)]));
    }

    #[test]
    fn test_snapshot_tracks_every_change() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = mount(&storage);
        let dispatch = provider.context().dispatch;

        for action in [
            CartAction::add(1, 1),
            CartAction::add(2, 3),
            CartAction::UpdateQuantity { id: 1, qty: 4 },
            CartAction::Remove { id: 2 },
        ] {
            let cart = dispatch.dispatch(action).unwrap();
            let stored = storage.get_item("cart").unwrap().unwrap();
            assert_eq!(stored, serde_json::to_string(&*cart).unwrap());
        }
        assert_eq!(storage.write_count(), 4);
    }

    #[test]
    fn test_dispatch_is_stable_across_renders() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = mount(&storage);

        let first = provider.render(&Scope::root(), |scope| use_cart::<CartReducer>(scope));
        first.dispatch.dispatch(CartAction::add(5, 1)).unwrap();
        let second = provider.render(&Scope::root(), |scope| use_cart::<CartReducer>(scope));

        assert_eq!(first.dispatch, second.dispatch);
        // each render snapshots the cart as it was
        assert!(first.cart.is_empty());
        assert_eq!(second.cart.item_count(), 1);
    }

    #[test]
    fn test_dispatch_differs_between_providers() {
        let a = mount(&Arc::new(MemoryStorage::new()));
        let b = mount(&Arc::new(MemoryStorage::new()));

        assert_ne!(a.context().dispatch, b.context().dispatch);
    }

    #[test]
    fn test_use_cart_outside_provider_fails() {
        let root = Scope::root();
        let nested = root.provide("theme").provide(42_u32);

        for scope in [&root, &nested] {
            let err = try_use_cart::<CartReducer>(scope).unwrap_err();
            assert_eq!(
                err,
                UsageError::MissingProvider {
                    hook: "use_cart",
                    provider: "CartProvider"
                }
            );
        }
    }

    #[test]
    #[should_panic(
        expected = "use_cart must be used within a CartProvider. Wrap a parent component in <CartProvider> to fix this error."
    )]
    fn test_use_cart_panics_outside_provider() {
        let _ = use_cart::<CartReducer>(&Scope::root());
    }

    #[test]
    fn test_deeply_nested_components_see_cart() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = mount(&storage);

        let outer = Scope::root().provide("layout");
        let count = provider.render(&outer, |scope| {
            let page = scope.provide("page");
            let row = page.provide("row");
            let ctx: CartContext = use_cart(&row);
            ctx.dispatch.dispatch(CartAction::add(8, 2)).unwrap().total_quantity()
        });

        assert_eq!(count, 2);
        // the scope outside the provider still has no cart
        assert!(try_use_cart::<CartReducer>(&outer).is_err());
    }

    #[test]
    fn test_subscribers_rerender_with_new_cart() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = Arc::new(mount(&storage));
        let renders = Arc::new(AtomicUsize::new(0));
        let last_seen = Arc::new(Mutex::new(Cart::new()));

        let rerender = {
            let provider = Arc::clone(&provider);
            let renders = Arc::clone(&renders);
            let last_seen = Arc::clone(&last_seen);
            move |_: &Commit<Cart>| {
                provider.render(&Scope::root(), |scope| {
                    let ctx: CartContext = use_cart(scope);
                    renders.fetch_add(1, Ordering::SeqCst);
                    *last_seen.lock().unwrap() = (*ctx.cart).clone();
                });
            }
        };
        let _sub = provider.subscribe(rerender);

        provider.context().dispatch.dispatch(CartAction::add(1, 1)).unwrap();
        provider.context().dispatch.dispatch(CartAction::add(1, 1)).unwrap();

        assert_eq!(renders.load(Ordering::SeqCst), 2);
        assert_eq!(*last_seen.lock().unwrap(), Cart::from(vec![LineItem::new(1, 2)]));
    }

    #[test]
    fn test_component_can_dispatch_while_rerendering() {
        let storage = Arc::new(MemoryStorage::new());
        let provider = Arc::new(mount(&storage));
        let versions = Arc::new(Mutex::new(Vec::new()));

        // a component that caps every line at 3 when it re-renders
        let rerender = {
            let provider = Arc::clone(&provider);
            let versions = Arc::clone(&versions);
            move |commit: &Commit<Cart>| {
                versions.lock().unwrap().push(commit.version);
                provider.render(&Scope::root(), |scope| {
                    let ctx: CartContext = use_cart(scope);
                    for item in ctx.cart.items().iter().filter(|item| item.qty > 3) {
                        ctx.dispatch
                            .dispatch(CartAction::UpdateQuantity { id: item.id, qty: 3 })
                            .unwrap();
                    }
                });
            }
        };
        let _sub = provider.subscribe(rerender);

        let cart = provider.context().dispatch.dispatch(CartAction::add(1, 5)).unwrap();

        assert_eq!(*cart, Cart::from(vec![LineItem::new(1, 5)]));
        assert_eq!(*provider.store().state(), Cart::from(vec![LineItem::new(1, 3)]));
        assert_eq!(*versions.lock().unwrap(), vec![1, 2]);
        // persistence ran for both commits, in order
        assert_eq!(storage.write_count(), 2);
        assert_eq!(
            storage.get_item("cart").unwrap().as_deref(),
            Some(r#"[{"id":1,"qty":3}]"#)
        );
    }

    #[test]
    fn test_dispatch_after_drop_is_ignored() {
        let storage = Arc::new(MemoryStorage::new().with_item("cart", r#"[{"id":1,"qty":2}]"#));
        let provider = mount(&storage);
        let leftover = provider.context().dispatch;
        assert!(leftover.is_mounted());

        drop(provider);

        let cart = leftover.dispatch(CartAction::Empty).unwrap();
        assert!(!leftover.is_mounted());
        assert_eq!(*cart, Cart::from(vec![LineItem::new(1, 2)]));
        assert_eq!(storage.write_count(), 0);
        assert_eq!(
            storage.get_item("cart").unwrap().as_deref(),
            Some(r#"[{"id":1,"qty":2}]"#)
        );
    }

    #[test]
    fn test_open_uses_configured_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            storage_path: Some(dir.path().join("local_storage.json")),
            ..StoreConfig::default()
        };

        {
            let provider = CartProvider::open(&config).unwrap();
            provider
                .context()
                .dispatch
                .dispatch(CartAction::add(11, 2))
                .unwrap();
        }

        let reopened = CartProvider::open(&config).unwrap();
        assert_eq!(
            *reopened.context().cart,
            Cart::from(vec![LineItem::new(11, 2)])
        );
    }
}
