//! # Scope
//!
//! An explicit context chain handed from providers to their children.
//!
//! A provider creates a child scope carrying its value; everything rendered
//! inside receives that scope (or a descendant of it) and looks the value up
//! by type. The nearest provider of a type wins.
//!
//! ```text
//!   Scope::root()
//!        │
//!        └── provide(Theme)            ── scope A
//!                 │
//!                 └── provide(CartContext)  ── scope B
//!                          │
//!                          └── consume::<CartContext>()  ✓
//!                          └── consume::<Theme>()        ✓ (from A)
//!   scope A: consume::<CartContext>()  ✗ None
//! ```

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

struct Frame {
    type_id: TypeId,
    type_name: &'static str,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<Frame>>,
}

/// Context chain for one point in a component tree.
///
/// Cheap to clone; clones share the same frames.
#[derive(Clone, Default)]
pub struct Scope {
    head: Option<Arc<Frame>>,
}

impl Scope {
    /// An empty scope with nothing provided.
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns a child scope that additionally provides `value`.
    ///
    /// `self` is left unchanged.
    pub fn provide<T>(&self, value: T) -> Scope
    where
        T: Any + Send + Sync,
    {
        Scope {
            head: Some(Arc::new(Frame {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// Looks up the nearest provided value of type `T`.
    pub fn consume<T>(&self) -> Option<T>
    where
        T: Any + Clone,
    {
        let wanted = TypeId::of::<T>();
        self.frames()
            .find(|frame| frame.type_id == wanted)
            .and_then(|frame| frame.value.downcast_ref::<T>())
            .cloned()
    }

    /// Returns true if a value of type `T` is provided.
    pub fn contains<T: Any>(&self) -> bool {
        let wanted = TypeId::of::<T>();
        self.frames().any(|frame| frame.type_id == wanted)
    }

    /// Number of values provided along this chain.
    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.head.as_deref(), |frame| frame.parent.as_deref())
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.frames().map(|frame| frame.type_name))
            .finish()
    }
}
