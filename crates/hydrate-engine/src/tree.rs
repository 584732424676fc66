//! # Result Tree
//!
//! Mirrors the shape of the configuration tree and holds what every module
//! resolved to.
//!
//! ## Slot States
//!
//! ```text
//! walk:          key ──→ Pending(placeholder)        (before any start runs)
//! continuation:  key ──→ Ready(value)                (when the module settles)
//! disabled:      key ──→ Disabled                    (explicit null, key exists)
//! nested map:    key ──→ Branch(ResultTree)
//! ```
//!
//! The tree is a cheap, cloneable handle. Modules receive it in their
//! constructor and `start`, and may await a sibling's placeholder to order
//! their own startup. A caller-owned `ResultTree` passed as property target
//! receives the same writes while hydration is still in flight.
//!
//! ## Thread Safety
//!
//! - Each level is its own `Arc<RwLock<..>>`, so a continuation only locks the
//!   level that owns its key
//! - Locks are never held across an await point

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::RwLock;

use crate::errors::HydrationResult;
use crate::module::Hydrated;

/// Eventual value written into the tree before a module settles.
#[derive(Clone)]
pub struct PendingValue {
    id: u64,
    future: Shared<BoxFuture<'static, HydrationResult<Hydrated>>>,
}

impl PendingValue {
    pub(crate) fn new(id: u64, future: BoxFuture<'static, HydrationResult<Hydrated>>) -> Self {
        Self {
            id,
            future: future.shared(),
        }
    }

    /// Identity of the placeholder, unique within one hydration.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The outcome, if the module has already settled.
    #[must_use]
    pub fn peek(&self) -> Option<&HydrationResult<Hydrated>> {
        self.future.peek()
    }

    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.peek().is_some()
    }

    /// Wait for the module to settle.
    ///
    /// Awaiting drives the underlying work, so a module may await a sibling
    /// from inside its own `start`.
    pub async fn wait(&self) -> HydrationResult<Hydrated> {
        self.future.clone().await
    }
}

impl fmt::Debug for PendingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingValue")
            .field("id", &self.id)
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// One slot of the result tree.
#[derive(Clone, Debug)]
pub enum TreeValue {
    /// Nested mapping.
    Branch(ResultTree),
    /// Module disabled by configuration.
    Disabled,
    /// Module still hydrating.
    Pending(PendingValue),
    /// Module settled.
    Ready(Hydrated),
}

impl TreeValue {
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }

    #[must_use]
    pub fn as_branch(&self) -> Option<&ResultTree> {
        match self {
            Self::Branch(tree) => Some(tree),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_ready(&self) -> Option<&Hydrated> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Resolve a module slot, waiting if it is still pending.
    ///
    /// Branches and disabled modules resolve to `None`.
    pub async fn resolve(&self) -> HydrationResult<Option<Hydrated>> {
        match self {
            Self::Ready(value) => Ok(Some(value.clone())),
            Self::Pending(pending) => pending.wait().await.map(Some),
            Self::Branch(_) | Self::Disabled => Ok(None),
        }
    }
}

/// Slots of one level, iterated in first-insertion order.
#[derive(Default)]
struct Level {
    order: Vec<String>,
    slots: HashMap<String, TreeValue>,
}

impl Level {
    fn get(&self, key: &str) -> Option<&TreeValue> {
        self.slots.get(key)
    }

    fn contains_key(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    /// Overwriting keeps the key's original position.
    fn insert(&mut self, key: String, value: TreeValue) -> Option<TreeValue> {
        if !self.slots.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.slots.insert(key, value)
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn iter(&self) -> impl Iterator<Item = (&String, &TreeValue)> {
        self.order
            .iter()
            .filter_map(|key| self.slots.get(key).map(|value| (key, value)))
    }
}

/// Shared handle to one level of the result tree.
#[derive(Clone, Default)]
pub struct ResultTree {
    entries: Arc<RwLock<Level>>,
}

impl ResultTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<TreeValue> {
        self.entries.read().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Keys at this level, in the order they were first written.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().order.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().len() == 0
    }

    /// Nested level under `key`, if that slot is a branch.
    #[must_use]
    pub fn branch(&self, key: &str) -> Option<ResultTree> {
        match self.get(key) {
            Some(TreeValue::Branch(tree)) => Some(tree),
            _ => None,
        }
    }

    /// Slot at a path of keys, descending through branches.
    #[must_use]
    pub fn at(&self, path: &[&str]) -> Option<TreeValue> {
        let (last, parents) = path.split_last()?;
        let mut level = self.clone();
        for key in parents {
            level = level.branch(key)?;
        }
        level.get(last)
    }

    /// Settled value at a path, without waiting.
    #[must_use]
    pub fn ready(&self, path: &[&str]) -> Option<Hydrated> {
        match self.at(path)? {
            TreeValue::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// Value at a path, waiting for it if it is still pending.
    ///
    /// Missing keys, branches and disabled modules resolve to `None`.
    pub async fn resolve(&self, path: &[&str]) -> HydrationResult<Option<Hydrated>> {
        match self.at(path) {
            Some(slot) => slot.resolve().await,
            None => Ok(None),
        }
    }

    /// Write a slot, returning what it held before.
    pub fn insert(&self, key: impl Into<String>, value: TreeValue) -> Option<TreeValue> {
        self.entries.write().insert(key.into(), value)
    }

    /// Replace `key` with a fresh, empty branch and return it.
    pub(crate) fn insert_branch(&self, key: &str) -> ResultTree {
        let branch = ResultTree::new();
        self.insert(key, TreeValue::Branch(branch.clone()));
        branch
    }

    /// Overwrite `key` with its final value if it still holds placeholder `id`.
    ///
    /// A later sibling that reused the key owns the slot; its write wins no
    /// matter which of the two settles first.
    pub(crate) fn settle(&self, key: &str, id: u64, value: Hydrated) -> bool {
        let mut entries = self.entries.write();
        let owned = matches!(entries.get(key), Some(TreeValue::Pending(p)) if p.id() == id);
        if owned {
            entries.insert(key.to_string(), TreeValue::Ready(value));
        }
        owned
    }
}

impl fmt::Debug for ResultTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.read().iter()).finish()
    }
}
