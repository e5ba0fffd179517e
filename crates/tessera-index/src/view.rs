//! Lazy read-only views over query results.

use crate::bucket::Bucket;
use crate::item::{HandleOrder, IndexItem, ItemComparer};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Flattened, read-only view over the buckets matched by a query.
///
/// The view holds bucket references, not items: iterating walks the buckets
/// as they are at that moment, and iterating again re-walks them, picking up
/// any change made in between. The count is computed on first use and then
/// cached for the lifetime of the view.
pub struct ResultView<I> {
    buckets: Vec<Arc<Bucket<I>>>,
    comparer: Arc<dyn ItemComparer<I>>,
    count: OnceCell<usize>,
}

impl<I: IndexItem> ResultView<I> {
    /// Creates a view over `buckets`, in the given order.
    pub fn new(buckets: Vec<Arc<Bucket<I>>>, comparer: Arc<dyn ItemComparer<I>>) -> Self {
        Self {
            buckets,
            comparer,
            count: OnceCell::new(),
        }
    }

    /// A view with no buckets.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Arc::new(HandleOrder))
    }

    /// Returns the number of items across all buckets (memoized).
    pub fn count(&self) -> usize {
        *self
            .count
            .get_or_init(|| self.buckets.iter().map(|b| b.len()).sum())
    }

    /// Returns true if the view has no items.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Returns the number of buckets behind this view.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if any bucket holds an item comparing equal to `item`.
    pub fn contains(&self, item: &I) -> bool {
        self.buckets
            .iter()
            .any(|b| b.contains(item, self.comparer.as_ref()))
    }

    /// Returns the first item in iteration order.
    pub fn first(&self) -> Option<I> {
        self.buckets.iter().find_map(|b| b.first())
    }

    /// Iterates the items of every bucket, bucket by bucket.
    pub fn iter(&self) -> ResultIter<'_, I> {
        ResultIter {
            buckets: self.buckets.iter(),
            current: None,
            pos: 0,
        }
    }

    /// Releases the bucket references, for combining views.
    pub(crate) fn into_buckets(self) -> Vec<Arc<Bucket<I>>> {
        self.buckets
    }

    /// Collects the items into a vector.
    pub fn to_vec(&self) -> Vec<I> {
        self.iter().collect()
    }
}

impl<I: IndexItem> Default for ResultView<I> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<I> std::fmt::Debug for ResultView<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultView")
            .field("buckets", &self.buckets.len())
            .field("count", &self.count.get())
            .finish()
    }
}

/// Iterator over a [`ResultView`].
///
/// Each bucket is snapshotted when the iterator reaches it.
pub struct ResultIter<'a, I> {
    buckets: std::slice::Iter<'a, Arc<Bucket<I>>>,
    current: Option<Arc<Vec<I>>>,
    pos: usize,
}

impl<I: IndexItem> Iterator for ResultIter<'_, I> {
    type Item = I;

    fn next(&mut self) -> Option<I> {
        loop {
            if let Some(items) = &self.current {
                if let Some(item) = items.get(self.pos) {
                    self.pos += 1;
                    return Some(item.clone());
                }
            }
            self.current = Some(self.buckets.next()?.snapshot());
            self.pos = 0;
        }
    }
}

impl<'a, I: IndexItem> IntoIterator for &'a ResultView<I> {
    type Item = I;
    type IntoIter = ResultIter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_common::RowHandle;

    fn bucket(offsets: &[u16]) -> Arc<Bucket<RowHandle>> {
        let bucket = Bucket::new();
        for &offset in offsets {
            bucket.insert_sorted(RowHandle::new(0, offset), &HandleOrder);
        }
        Arc::new(bucket)
    }

    #[test]
    fn test_flattens_in_bucket_order() {
        let view = ResultView::new(vec![bucket(&[5, 6]), bucket(&[1])], Arc::new(HandleOrder));
        let offsets: Vec<u16> = view.iter().map(|h| h.offset()).collect();
        assert_eq!(offsets, vec![5, 6, 1]);
        assert_eq!(view.count(), 3);
        assert_eq!(view.bucket_count(), 2);
        assert_eq!(view.first(), Some(RowHandle::new(0, 5)));
    }

    #[test]
    fn test_count_is_memoized() {
        let b = bucket(&[1, 2]);
        let view = ResultView::new(vec![b.clone()], Arc::new(HandleOrder));
        assert_eq!(view.count(), 2);

        b.insert_sorted(RowHandle::new(0, 3), &HandleOrder);
        assert_eq!(view.count(), 2);
        // Enumeration re-walks the live bucket.
        assert_eq!(view.iter().count(), 3);
    }

    #[test]
    fn test_contains() {
        let view = ResultView::new(vec![bucket(&[1, 3]), bucket(&[8])], Arc::new(HandleOrder));
        assert!(view.contains(&RowHandle::new(0, 8)));
        assert!(view.contains(&RowHandle::new(0, 3)));
        assert!(!view.contains(&RowHandle::new(0, 2)));
    }

    #[test]
    fn test_empty() {
        let view: ResultView<RowHandle> = ResultView::empty();
        assert!(view.is_empty());
        assert_eq!(view.first(), None);
        assert!(view.to_vec().is_empty());
    }

    #[test]
    fn test_skips_empty_buckets() {
        let view = ResultView::new(
            vec![bucket(&[]), bucket(&[2]), bucket(&[])],
            Arc::new(HandleOrder),
        );
        assert_eq!(view.to_vec(), vec![RowHandle::new(0, 2)]);
        let mut n = 0;
        for _ in &view {
            n += 1;
        }
        assert_eq!(n, 1);
    }
}
