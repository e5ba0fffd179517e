//! Items stored in secondary indexes and the comparers that order them.

use std::cmp::Ordering;
use std::sync::Arc;
use tessera_common::RowHandle;

/// An item that knows where its row lives.
///
/// The index uses the handle to read the item's current key from the
/// column store, and `same_item` to recognise an item during removal.
pub trait HandleItem {
    fn handle(&self) -> RowHandle;

    /// Identity check used when removing items. Defaults to handle equality.
    fn same_item(&self, other: &Self) -> bool {
        self.handle() == other.handle()
    }
}

impl HandleItem for RowHandle {
    fn handle(&self) -> RowHandle {
        *self
    }
}

impl<T: HandleItem + ?Sized> HandleItem for Arc<T> {
    fn handle(&self) -> RowHandle {
        (**self).handle()
    }

    fn same_item(&self, other: &Self) -> bool {
        Arc::ptr_eq(self, other) || (**self).same_item(&**other)
    }
}

/// Everything an index needs from its items.
pub trait IndexItem: HandleItem + Clone + Send + Sync + 'static {}

impl<T: HandleItem + Clone + Send + Sync + 'static> IndexItem for T {}

/// Orders items inside a bucket.
pub trait ItemComparer<I>: Send + Sync {
    fn compare(&self, a: &I, b: &I) -> Ordering;
}

impl<I, F> ItemComparer<I> for F
where
    F: Fn(&I, &I) -> Ordering + Send + Sync,
{
    #[inline]
    fn compare(&self, a: &I, b: &I) -> Ordering {
        self(a, b)
    }
}

/// Orders items by row handle. The default value comparer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandleOrder;

impl<I: HandleItem> ItemComparer<I> for HandleOrder {
    #[inline]
    fn compare(&self, a: &I, b: &I) -> Ordering {
        a.handle().cmp(&b.handle())
    }
}
