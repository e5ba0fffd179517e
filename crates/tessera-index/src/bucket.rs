//! Ordered buckets of items sharing one key.

use crate::item::{HandleItem, ItemComparer};
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::sync::Arc;

/// Items sharing one key value, kept in value-comparer order.
///
/// Items live in a copy-on-write vector. Readers clone the `Arc` and walk an
/// immutable snapshot, so enumeration never observes a half-applied change.
/// Writers mutate in place when no snapshot is outstanding and copy
/// otherwise. Mutating methods must be called with the owning index's
/// write lock held.
pub struct Bucket<I> {
    items: RwLock<Arc<Vec<I>>>,
}

impl<I: Clone + HandleItem> Bucket<I> {
    /// Creates an empty bucket.
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Returns the current contents.
    #[inline]
    pub fn snapshot(&self) -> Arc<Vec<I>> {
        self.items.read().clone()
    }

    /// Returns the number of items.
    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    /// Returns true if the bucket holds no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the first item, if any.
    pub fn first(&self) -> Option<I> {
        self.items.read().first().cloned()
    }

    /// Inserts `item` at its sorted position.
    ///
    /// Returns false without inserting when an item comparing equal is
    /// already present.
    pub fn insert_sorted(&self, item: I, comparer: &dyn ItemComparer<I>) -> bool {
        let mut guard = self.items.write();
        match guard.binary_search_by(|entry| comparer.compare(entry, &item)) {
            Ok(_) => false,
            Err(pos) => {
                Arc::make_mut(&mut *guard).insert(pos, item);
                true
            }
        }
    }

    /// Removes `item`, matching by identity.
    ///
    /// Binary search finds the expected position; if the item drifted out of
    /// order since it was inserted, a linear scan finds it instead.
    pub fn remove(&self, item: &I, comparer: &dyn ItemComparer<I>) -> bool {
        let mut guard = self.items.write();
        let pos = match guard.binary_search_by(|entry| comparer.compare(entry, item)) {
            Ok(pos) if guard[pos].same_item(item) => Some(pos),
            _ => guard.iter().position(|entry| entry.same_item(item)),
        };
        match pos {
            Some(pos) => {
                Arc::make_mut(&mut *guard).remove(pos);
                true
            }
            None => false,
        }
    }

    /// Returns true if the bucket holds exactly one item and it is `item`.
    pub fn holds_only(&self, item: &I) -> bool {
        let guard = self.items.read();
        guard.len() == 1 && guard[0].same_item(item)
    }

    /// Returns true if an item comparing equal to `item` is present.
    pub fn contains(&self, item: &I, comparer: &dyn ItemComparer<I>) -> bool {
        self.items
            .read()
            .binary_search_by(|entry| comparer.compare(entry, item))
            .is_ok()
    }

    /// Returns true if an item with the same identity is present.
    pub fn contains_item(&self, item: &I) -> bool {
        self.items.read().iter().any(|entry| entry.same_item(item))
    }

    /// Re-sorts the bucket if `item` is out of order with its neighbours.
    ///
    /// Returns true if the bucket was re-sorted.
    pub fn refresh_sort(&self, item: &I, comparer: &dyn ItemComparer<I>) -> bool {
        let mut guard = self.items.write();
        let Some(pos) = guard.iter().position(|entry| entry.same_item(item)) else {
            return false;
        };
        let before_ok = pos == 0 || comparer.compare(&guard[pos - 1], &guard[pos]) != Ordering::Greater;
        let after_ok =
            pos + 1 == guard.len() || comparer.compare(&guard[pos], &guard[pos + 1]) != Ordering::Greater;
        if before_ok && after_ok {
            return false;
        }
        Arc::make_mut(&mut *guard).sort_by(|a, b| comparer.compare(a, b));
        true
    }

    /// Returns true if the items are in non-decreasing order.
    pub fn is_sorted(&self, comparer: &dyn ItemComparer<I>) -> bool {
        self.items
            .read()
            .windows(2)
            .all(|w| comparer.compare(&w[0], &w[1]) != Ordering::Greater)
    }
}

impl<I: Clone + HandleItem> Default for Bucket<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> std::fmt::Debug for Bucket<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bucket")
            .field("len", &self.items.read().len())
            .finish()
    }
}
