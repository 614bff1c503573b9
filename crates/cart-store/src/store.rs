//! # Observable Store
//!
//! A state holder that only changes through its reducer and tells
//! subscribers about every committed change.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Store::dispatch(action)                              │
//! │                                                                         │
//! │  1. Acquire commit lock ─── one dispatch at a time                      │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  2. reducer.reduce(&current, action)                                    │
//! │          │                                                              │
//! │          ├── Err ──► return error, nothing committed                    │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  3. ChangePolicy::ValueEq and next == current?                          │
//! │          │                                                              │
//! │          ├── yes ──► return current, nothing committed                  │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  4. Swap in Arc<next>, bump version, release state lock                 │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  5. Notify listeners in registration order with Commit                  │
//! │          │                                                              │
//! │          ▼                                                              │
//! │  6. Drain commits queued by listeners that dispatched                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Thread Safety
//! The state lives in `Arc<Mutex<Arc<S>>>`. Readers clone the inner `Arc`
//! and release the lock at once, so a snapshot handed out is immutable.
//! Listeners run after the state lock is released but while the commit lock
//! is held.
//!
//! ## Dispatching From a Listener
//! A listener may dispatch into the same store on the notifying thread. The
//! nested action is reduced and committed right away, so the caller gets
//! its result, but its `Commit` waits in a queue until the current round of
//! listeners finishes. Every listener therefore sees commits in version
//! order. Dispatching from another thread while a listener blocks on it
//! still deadlocks.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, ThreadId};

use cart_core::Reducer;
use tracing::{debug, trace};

use crate::storage::lock;

/// When a successful reduction counts as a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangePolicy {
    /// Commit only when the next state differs from the current one by
    /// `PartialEq`.
    #[default]
    ValueEq,

    /// Commit every successful reduction, even if the value is unchanged.
    Always,
}

/// A finalized state transition, handed to listeners.
#[derive(Debug)]
pub struct Commit<S> {
    /// State before the transition.
    pub previous: Arc<S>,
    /// State after the transition; what `Store::state` now returns.
    pub current: Arc<S>,
    /// Number of commits so far, starting at 1.
    pub version: u64,
}

type Listener<S> = Arc<dyn Fn(&Commit<S>) + Send + Sync>;

struct Inner<R: Reducer> {
    reducer: R,
    policy: ChangePolicy,
    state: Mutex<Arc<R::State>>,
    version: AtomicU64,
    commit_lock: Mutex<()>,
    notifying: Mutex<Option<ThreadId>>,
    queued: Mutex<VecDeque<Commit<R::State>>>,
    listeners: Mutex<Vec<(u64, Listener<R::State>)>>,
    next_listener_id: AtomicU64,
}

impl<R: Reducer> Inner<R> {
    fn is_notifying_here(&self) -> bool {
        *lock(&self.notifying) == Some(thread::current().id())
    }
}

/// Marks the current thread as notifying until dropped. If a listener
/// panics, commits still queued are discarded with it.
struct NotifyingGuard<'a, R: Reducer>(&'a Inner<R>);

impl<'a, R: Reducer> NotifyingGuard<'a, R> {
    fn enter(inner: &'a Inner<R>) -> Self {
        *lock(&inner.notifying) = Some(thread::current().id());
        NotifyingGuard(inner)
    }
}

impl<R: Reducer> Drop for NotifyingGuard<'_, R> {
    fn drop(&mut self) {
        lock(&self.0.queued).clear();
        *lock(&self.0.notifying) = None;
    }
}

/// Handle to a reducer-driven state holder.
///
/// Cloning the handle is cheap and every clone refers to the same state.
pub struct Store<R: Reducer> {
    inner: Arc<Inner<R>>,
}

impl<R: Reducer> Clone for Store<R> {
    fn clone(&self) -> Self {
        Store {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Reducer> fmt::Debug for Store<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("version", &self.version())
            .field("policy", &self.inner.policy)
            .finish_non_exhaustive()
    }
}

impl<R: Reducer> Store<R> {
    /// Creates a store seeded with `initial`, using [`ChangePolicy::ValueEq`].
    pub fn new(initial: R::State, reducer: R) -> Self {
        Self::with_policy(initial, reducer, ChangePolicy::default())
    }

    /// Creates a store with an explicit change policy.
    pub fn with_policy(initial: R::State, reducer: R, policy: ChangePolicy) -> Self {
        Store {
            inner: Arc::new(Inner {
                reducer,
                policy,
                state: Mutex::new(Arc::new(initial)),
                version: AtomicU64::new(0),
                commit_lock: Mutex::new(()),
                notifying: Mutex::new(None),
                queued: Mutex::new(VecDeque::new()),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    /// The current state snapshot.
    pub fn state(&self) -> Arc<R::State> {
        Arc::clone(&lock(&self.inner.state))
    }

    /// Executes a function with read access to the current state.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let count = store.with_state(|cart| cart.item_count());
    /// ```
    pub fn with_state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&R::State) -> T,
    {
        let state = self.state();
        f(&state)
    }

    /// Number of commits since the store was created.
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> ChangePolicy {
        self.inner.policy
    }

    /// Returns true if both handles refer to the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Forwards `action` to the reducer and commits the result.
    ///
    /// ## Returns
    /// - `Ok(state)`: the state after the dispatch (unchanged if the reducer
    ///   produced an equal value under [`ChangePolicy::ValueEq`])
    /// - `Err(e)`: the reducer rejected the action; nothing was committed
    pub fn dispatch(&self, action: R::Action) -> Result<Arc<R::State>, R::Error> {
        // the notifying thread already holds the commit lock
        if self.inner.is_notifying_here() {
            let (state, commit) = self.apply(action)?;
            if let Some(commit) = commit {
                trace!(version = commit.version, "Queued nested commit");
                lock(&self.inner.queued).push_back(commit);
            }
            return Ok(state);
        }

        let _commit = lock(&self.inner.commit_lock);

        let (state, commit) = self.apply(action)?;
        if let Some(commit) = commit {
            let _notifying = NotifyingGuard::enter(&self.inner);
            let mut next = Some(commit);
            while let Some(commit) = next {
                self.notify(&commit);
                next = lock(&self.inner.queued).pop_front();
            }
        }

        Ok(state)
    }

    /// Reduces `action` against the current state and swaps in the result.
    ///
    /// The caller must hold the commit lock.
    fn apply(
        &self,
        action: R::Action,
    ) -> Result<(Arc<R::State>, Option<Commit<R::State>>), R::Error> {
        let previous = self.state();
        let next = self.inner.reducer.reduce(&previous, action)?;

        if self.inner.policy == ChangePolicy::ValueEq && next == *previous {
            trace!(version = self.version(), "Dispatch produced no change");
            return Ok((previous, None));
        }

        let current = Arc::new(next);
        *lock(&self.inner.state) = Arc::clone(&current);
        let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;

        let commit = Commit {
            previous,
            current: Arc::clone(&current),
            version,
        };
        Ok((current, Some(commit)))
    }

    fn notify(&self, commit: &Commit<R::State>) {
        let listeners: Vec<Listener<R::State>> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        debug!(
            version = commit.version,
            listeners = listeners.len(),
            "Committed state"
        );

        for listener in listeners {
            listener(commit);
        }
    }

    /// Registers `listener` to run after every commit.
    ///
    /// The listener stays registered until the returned [`Subscription`] is
    /// dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Commit<R::State>) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner.listeners).push((id, Arc::new(listener)));

        let weak: Weak<Inner<R>> = Arc::downgrade(&self.inner);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    lock(&inner.listeners).retain(|(listener_id, _)| *listener_id != id);
                }
            })),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        lock(&self.inner.listeners).len()
    }
}

/// Keeps a listener registered. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keeps the listener registered for the lifetime of the store.
    pub fn detach(mut self) {
        self.unsubscribe = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use super::*;
    use cart_core::{reducer_fn, Cart, CartAction, CartReducer, CoreError, LineItem};

    fn counter() -> impl Reducer<State = i64, Action = i64, Error = Infallible> {
        reducer_fn(|n: &i64, by: i64| Ok::<_, Infallible>(n + by))
    }

    #[test]
    fn test_dispatch_applies_reducer() {
        let store = Store::new(Cart::new(), CartReducer);
        let reducer = CartReducer;
        let actions = [
            CartAction::add(1, 2),
            CartAction::add(2, 1),
            CartAction::add(1, 1),
            CartAction::UpdateQuantity { id: 2, qty: 4 },
            CartAction::Remove { id: 1 },
            CartAction::Empty,
        ];

        let mut expected = Cart::new();
        for action in actions {
            expected = reducer.reduce(&expected, action.clone()).unwrap();
            let state = store.dispatch(action).unwrap();
            assert_eq!(*state, expected);
            assert_eq!(*store.state(), expected);
        }
    }

    #[test]
    fn test_rejected_action_commits_nothing() {
        let store = Store::new(Cart::from(vec![LineItem::new(1, 2)]), CartReducer);
        let before = store.state();

        let err = store
            .dispatch(CartAction::UpdateQuantity { id: 9, qty: 1 })
            .unwrap_err();

        assert!(matches!(err, CoreError::ItemNotInCart(9)));
        assert!(Arc::ptr_eq(&before, &store.state()));
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_listeners_see_commits_in_order() {
        let store = Store::new(0, counter());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |commit: &Commit<i64>| {
            sink.lock()
                .unwrap()
                .push((*commit.previous, *commit.current, commit.version));
        });

        store.dispatch(2).unwrap();
        store.dispatch(3).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![(0, 2, 1), (2, 5, 2)]);
    }

    #[test]
    fn test_listener_reads_committed_state() {
        let store = Store::new(0, counter());
        let observed = Arc::new(Mutex::new(None));

        let handle = store.clone();
        let sink = Arc::clone(&observed);
        let _sub = store.subscribe(move |commit: &Commit<i64>| {
            // the commit is already visible through the store
            *sink.lock().unwrap() = Some((*handle.state(), *commit.current));
        });

        store.dispatch(7).unwrap();

        assert_eq!(*observed.lock().unwrap(), Some((7, 7)));
    }

    #[test]
    fn test_value_eq_policy_skips_unchanged() {
        let store = Store::new(Cart::new(), CartReducer);
        let calls = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&calls);
        let _sub = store.subscribe(move |_: &Commit<Cart>| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(CartAction::Remove { id: 1 }).unwrap();
        store.dispatch(CartAction::Empty).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_always_policy_commits_unchanged() {
        let store = Store::with_policy(Cart::new(), CartReducer, ChangePolicy::Always);
        let calls = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&calls);
        let _sub = store.subscribe(move |_: &Commit<Cart>| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        store.dispatch(CartAction::Empty).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_dropping_subscription_unregisters() {
        let store = Store::new(0, counter());
        let calls = Arc::new(AtomicU64::new(0));
        let sink = Arc::clone(&calls);
        let sub = store.subscribe(move |_: &Commit<i64>| {
            sink.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(store.listener_count(), 1);

        store.dispatch(1).unwrap();
        drop(sub);
        store.dispatch(1).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_detached_subscription_stays() {
        let store = Store::new(0, counter());
        store.subscribe(|_: &Commit<i64>| {}).detach();

        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn test_listener_can_dispatch_into_same_store() {
        let store = Store::new(0, counter());
        let nested_results = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::new(Mutex::new(Vec::new()));

        // tops the counter up to 10 whenever a commit lands on 1
        let handle = store.clone();
        let results = Arc::clone(&nested_results);
        let _top_up = store.subscribe(move |commit: &Commit<i64>| {
            if *commit.current == 1 {
                let state = handle.dispatch(9).unwrap();
                results.lock().unwrap().push(*state);
            }
        });
        let sink = Arc::clone(&seen);
        let _log = store.subscribe(move |commit: &Commit<i64>| {
            sink.lock()
                .unwrap()
                .push((*commit.previous, *commit.current, commit.version));
        });

        let state = store.dispatch(1).unwrap();

        // the outer caller sees its own commit; the nested one follows
        assert_eq!(*state, 1);
        assert_eq!(*nested_results.lock().unwrap(), vec![10]);
        assert_eq!(*store.state(), 10);
        assert_eq!(store.version(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![(0, 1, 1), (1, 10, 2)]);
    }

    #[test]
    fn test_nested_rejection_reaches_listener() {
        let store = Store::new(Cart::new(), CartReducer);
        let outcome = Arc::new(Mutex::new(None));

        let handle = store.clone();
        let sink = Arc::clone(&outcome);
        let _sub = store.subscribe(move |_: &Commit<Cart>| {
            let result = handle.dispatch(CartAction::UpdateQuantity { id: 42, qty: 1 });
            *sink.lock().unwrap() = Some(matches!(result, Err(CoreError::ItemNotInCart(42))));
        });

        store.dispatch(CartAction::add(1, 1)).unwrap();

        assert_eq!(*outcome.lock().unwrap(), Some(true));
        assert_eq!(store.version(), 1);
        assert_eq!(*store.state(), Cart::from(vec![LineItem::new(1, 1)]));
    }

    #[test]
    fn test_concurrent_dispatches_are_serialized() {
        let store = Store::new(0, counter());
        let versions = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&versions);
        let _sub = store.subscribe(move |commit: &Commit<i64>| {
            sink.lock().unwrap().push(commit.version);
        });

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        store.dispatch(1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*store.state(), 100);
        assert_eq!(*versions.lock().unwrap(), (1..=100).collect::<Vec<u64>>());
    }
}
