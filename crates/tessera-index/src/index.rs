//! Keyed secondary index over a column store.
//!
//! ## Layout
//!
//! ```text
//! SecondaryIndex
//! ├── reader: KeyReader<K>           (column store the keys are read from)
//! ├── buckets: RwLock<FxHashMap<u64, Vec<KeyEntry>>>
//! │   ├── hash(k1) -> [ (k1, Bucket [item, item, ...]) ]
//! │   └── hash(k2) -> [ (k2, Bucket [...]), (k2', Bucket [...]) ]   (collision chain)
//! └── write_lock: Mutex<()>           (serializes structural changes)
//! ```
//!
//! Keys are hashed with the key comparer, so comparers that fold case or
//! compare bytes decide which keys share a bucket. Buckets are unordered with
//! respect to each other: equality and set lookups are O(1) per key, while
//! ordering operators scan every distinct key.
//!
//! ## Concurrency
//!
//! Readers take the map lock only long enough to clone bucket references,
//! then walk the buckets' copy-on-write snapshots. Writers serialize on
//! `write_lock` and take the map's write lock only to add or drop a key.

use crate::bucket::Bucket;
use crate::item::{IndexItem, ItemComparer};
use crate::key::{IndexKey, KeyComparer};
use crate::query::{QueryArg, QueryOperator};
use crate::view::ResultView;
use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;
use std::sync::Arc;
use tessera_common::{Result, RowHandle, TesseraError, Value};
use tessera_store::{ColumnStore, KeyReader};

/// One distinct key and its bucket.
struct KeyEntry<K, I> {
    key: K,
    bucket: Arc<Bucket<I>>,
}

type BucketMap<K, I> = FxHashMap<u64, Vec<KeyEntry<K, I>>>;

/// Maps each distinct key of a column to the ordered bucket of items
/// carrying it.
///
/// Keys equal to the key type's default, and NULL keys, are filed under the
/// null sentinel so that "no value" is indexable like any other key.
pub struct SecondaryIndex<I, K> {
    reader: Arc<dyn KeyReader<K>>,
    item_comparer: Arc<dyn ItemComparer<I>>,
    key_comparer: Arc<dyn KeyComparer<K>>,
    null_key: K,
    default_key: K,
    buckets: RwLock<BucketMap<K, I>>,
    write_lock: Mutex<()>,
}

impl<I: IndexItem, K: IndexKey> SecondaryIndex<I, K> {
    /// Creates an index reading keys through `reader`.
    ///
    /// The key comparer and null sentinel default to the key type's.
    pub fn new(reader: Arc<dyn KeyReader<K>>, item_comparer: Arc<dyn ItemComparer<I>>) -> Self {
        Self {
            reader,
            item_comparer,
            key_comparer: K::default_comparer(),
            null_key: K::empty(),
            default_key: K::default(),
            buckets: RwLock::new(FxHashMap::default()),
            write_lock: Mutex::new(()),
        }
    }

    /// Creates an index over a direct column store.
    pub fn direct(store: Arc<ColumnStore<K>>, item_comparer: Arc<dyn ItemComparer<I>>) -> Self {
        Self::new(store, item_comparer)
    }

    /// Creates an index over a null-wrapped column store.
    pub fn nullable(
        store: Arc<ColumnStore<Option<K>>>,
        item_comparer: Arc<dyn ItemComparer<I>>,
    ) -> Self {
        Self::new(store, item_comparer)
    }

    /// Replaces the key comparer. Must be called before any item is added.
    pub fn with_key_comparer(mut self, key_comparer: Arc<dyn KeyComparer<K>>) -> Self {
        debug_assert!(self.buckets.get_mut().is_empty());
        self.key_comparer = key_comparer;
        self
    }

    /// Replaces the null sentinel. Must be called before any item is added.
    pub fn with_null_key(mut self, null_key: K) -> Self {
        debug_assert!(self.buckets.get_mut().is_empty());
        self.null_key = null_key;
        self
    }

    /// Returns the key substituted for NULL and default keys.
    pub fn null_sentinel(&self) -> &K {
        &self.null_key
    }

    /// Returns the key comparer.
    pub fn key_comparer(&self) -> &Arc<dyn KeyComparer<K>> {
        &self.key_comparer
    }

    /// Returns the value comparer.
    pub fn item_comparer(&self) -> &Arc<dyn ItemComparer<I>> {
        &self.item_comparer
    }

    /// Maps NULL and the key type's default value to the null sentinel.
    pub fn substitute(&self, key: Option<K>) -> K {
        match key {
            Some(k) if !self.key_comparer.equals(&k, &self.default_key) => k,
            _ => self.null_key.clone(),
        }
    }

    /// Reads the item's current key from the column store, substituted.
    pub fn key_of(&self, item: &I) -> K {
        self.substitute(self.reader.read_key(item.handle()))
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Adds `item` under its current key.
    ///
    /// Returns false if the bucket already holds an item comparing equal.
    pub fn add(&self, item: I) -> bool {
        let _guard = self.write_lock.lock();
        let key = self.key_of(&item);
        self.add_locked(item, key)
    }

    /// Adds `item` under an explicitly supplied key.
    pub fn add_with_key(&self, item: I, key: Option<K>) -> bool {
        let _guard = self.write_lock.lock();
        let key = self.substitute(key);
        self.add_locked(item, key)
    }

    fn add_locked(&self, item: I, key: K) -> bool {
        let bucket = self.bucket_or_insert(key);
        let handle = item.handle();
        let inserted = bucket.insert_sorted(item, self.item_comparer.as_ref());
        tracing::trace!(%handle, inserted, "index add");
        inserted
    }

    /// Removes `item`, looking under its current key first.
    ///
    /// If the item is not found there (its key changed after it was added),
    /// every bucket is scanned for it.
    pub fn remove(&self, item: &I) -> bool {
        let _guard = self.write_lock.lock();
        let key = self.key_of(item);
        self.remove_locked(item, &key)
    }

    /// Removes `item`, looking under an explicitly supplied key first.
    pub fn remove_with_key(&self, item: &I, key: Option<K>) -> bool {
        let _guard = self.write_lock.lock();
        let key = self.substitute(key);
        self.remove_locked(item, &key)
    }

    fn remove_locked(&self, item: &I, key: &K) -> bool {
        let handle = item.handle();
        if let Some(bucket) = self.find_bucket(key) {
            if bucket.holds_only(item) {
                self.drop_key(key);
                tracing::trace!(%handle, "index remove, dropped key");
                return true;
            }
            if bucket.remove(item, self.item_comparer.as_ref()) {
                tracing::trace!(%handle, "index remove");
                return true;
            }
        }
        self.remove_anywhere(item)
    }

    /// Recovery path: removes `item` from whichever bucket holds it.
    fn remove_anywhere(&self, item: &I) -> bool {
        for (key, bucket) in self.entries() {
            if !bucket.contains_item(item) {
                continue;
            }
            if bucket.holds_only(item) {
                self.drop_key(&key);
            } else {
                bucket.remove(item, self.item_comparer.as_ref());
            }
            let handle = item.handle();
            tracing::warn!(%handle, ?key, "removed item filed under a stale key");
            return true;
        }
        false
    }

    /// Re-files an item whose key may have changed.
    pub fn refresh_item(&self, item: I) -> bool {
        let _guard = self.write_lock.lock();
        let key = self.key_of(&item);
        self.remove_locked(&item, &key);
        self.add_locked(item, key)
    }

    /// Re-sorts the item's bucket if its sort value changed.
    ///
    /// Returns true if the bucket was re-sorted.
    pub fn refresh_sort(&self, item: &I) -> bool {
        let _guard = self.write_lock.lock();
        let key = self.key_of(item);
        match self.find_bucket(&key) {
            Some(bucket) => bucket.refresh_sort(item, self.item_comparer.as_ref()),
            None => false,
        }
    }

    /// Rebuilds the index from scratch.
    ///
    /// The new map is built aside and published in one step, so readers see
    /// either the old index or the complete new one.
    pub fn refresh<It>(&self, items: It)
    where
        It: IntoIterator<Item = I>,
    {
        let _guard = self.write_lock.lock();
        let mut map: BucketMap<K, I> = FxHashMap::default();
        let mut added = 0usize;
        for item in items {
            let key = self.key_of(&item);
            let bucket = Self::bucket_in(&mut map, self.key_comparer.as_ref(), key);
            if bucket.insert_sorted(item, self.item_comparer.as_ref()) {
                added += 1;
            }
        }
        let keys: usize = map.values().map(Vec::len).sum();
        *self.buckets.write() = map;
        tracing::debug!(items = added, keys, "rebuilt secondary index");
    }

    /// Drops every bucket.
    pub fn clear(&self) {
        let _guard = self.write_lock.lock();
        *self.buckets.write() = FxHashMap::default();
    }

    // ========================================================================
    // Map plumbing
    // ========================================================================

    fn find_bucket(&self, key: &K) -> Option<Arc<Bucket<I>>> {
        let hash = self.key_comparer.hash_key(key);
        let map = self.buckets.read();
        map.get(&hash)?
            .iter()
            .find(|e| self.key_comparer.equals(&e.key, key))
            .map(|e| e.bucket.clone())
    }

    fn bucket_or_insert(&self, key: K) -> Arc<Bucket<I>> {
        if let Some(bucket) = self.find_bucket(&key) {
            return bucket;
        }
        let mut map = self.buckets.write();
        Self::bucket_in(&mut map, self.key_comparer.as_ref(), key)
    }

    fn bucket_in(map: &mut BucketMap<K, I>, comparer: &dyn KeyComparer<K>, key: K) -> Arc<Bucket<I>> {
        let chain = map.entry(comparer.hash_key(&key)).or_default();
        if let Some(entry) = chain.iter().find(|e| comparer.equals(&e.key, &key)) {
            return entry.bucket.clone();
        }
        let bucket = Arc::new(Bucket::new());
        chain.push(KeyEntry {
            key,
            bucket: bucket.clone(),
        });
        bucket
    }

    fn drop_key(&self, key: &K) {
        let hash = self.key_comparer.hash_key(key);
        let mut map = self.buckets.write();
        if let Some(chain) = map.get_mut(&hash) {
            chain.retain(|e| !self.key_comparer.equals(&e.key, key));
            if chain.is_empty() {
                map.remove(&hash);
            }
        }
    }

    /// Snapshot of every (key, bucket) pair.
    fn entries(&self) -> Vec<(K, Arc<Bucket<I>>)> {
        self.buckets
            .read()
            .values()
            .flatten()
            .map(|e| (e.key.clone(), e.bucket.clone()))
            .collect()
    }

    fn view(&self, buckets: Vec<Arc<Bucket<I>>>) -> ResultView<I> {
        ResultView::new(buckets, self.item_comparer.clone())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Returns the items filed under exactly `key`. `None` yields nothing.
    pub fn select<'a>(&self, key: impl Into<Option<&'a K>>) -> ResultView<I>
    where
        K: 'a,
    {
        match key.into().and_then(|k| self.find_bucket(k)) {
            Some(bucket) => self.view(vec![bucket]),
            None => self.view(Vec::new()),
        }
    }

    /// Returns the first item filed under exactly `key`.
    pub fn select_one<'a>(&self, key: impl Into<Option<&'a K>>) -> Option<I>
    where
        K: 'a,
    {
        key.into()
            .and_then(|k| self.find_bucket(k))
            .and_then(|bucket| bucket.first())
    }

    /// Returns the items of every key matching `predicate`.
    ///
    /// Scans all distinct keys.
    pub fn search(&self, predicate: impl Fn(&K) -> bool) -> ResultView<I> {
        let map = self.buckets.read();
        let buckets = map
            .values()
            .flatten()
            .filter(|e| predicate(&e.key))
            .map(|e| e.bucket.clone())
            .collect();
        drop(map);
        self.view(buckets)
    }

    /// Answers a query against the index.
    ///
    /// Argument values are coerced to the key type and substituted like
    /// stored keys. Equality, `Is` and `In` are direct bucket lookups; every
    /// other operator scans the distinct keys.
    pub fn query(&self, arg: &QueryArg, op: QueryOperator, negate: bool) -> Result<ResultView<I>> {
        let cmp = self.key_comparer.clone();
        let (op, negate) = op.normalize(negate);
        let view = match op {
            QueryOperator::Equal => {
                let key = self.coerce_key(arg.single(op)?)?;
                if negate {
                    self.search(|k| !cmp.equals(k, &key))
                } else {
                    self.select(&key)
                }
            }
            QueryOperator::Is => {
                let key = self.null_key.clone();
                if negate {
                    self.search(|k| !cmp.equals(k, &key))
                } else {
                    self.select(&key)
                }
            }
            QueryOperator::In => {
                let keys = arg
                    .values(op)?
                    .iter()
                    .map(|v| self.coerce_key(v))
                    .collect::<Result<Vec<K>>>()?;
                if negate {
                    self.search(|k| !keys.iter().any(|x| cmp.equals(k, x)))
                } else {
                    self.union(keys.iter())
                }
            }
            QueryOperator::Between => {
                let (min, max) = arg.bounds()?;
                let min = self.coerce_key(min)?;
                let max = self.coerce_key(max)?;
                if negate {
                    self.search(|k| {
                        cmp.compare(k, &min) == Ordering::Greater && cmp.compare(k, &max) == Ordering::Less
                    })
                } else {
                    // Exact buckets at both bounds plus keys outside the range.
                    let mut buckets = self.union(vec![&min, &max]).into_buckets();
                    buckets.extend(
                        self.search(|k| {
                            cmp.compare(k, &min) == Ordering::Less
                                || cmp.compare(k, &max) == Ordering::Greater
                        })
                        .into_buckets(),
                    );
                    self.view(buckets)
                }
            }
            QueryOperator::Like => {
                let pattern = arg.pattern()?;
                self.search(|k| pattern.is_match(&k.to_value().to_string()) != negate)
            }
            QueryOperator::Greater
            | QueryOperator::GreaterOrEqual
            | QueryOperator::Less
            | QueryOperator::LessOrEqual => {
                let threshold = self.coerce_key(arg.single(op)?)?;
                self.search(|k| {
                    let ord = cmp.compare(k, &threshold);
                    let hit = match op {
                        QueryOperator::Greater => ord == Ordering::Greater,
                        QueryOperator::GreaterOrEqual => ord != Ordering::Less,
                        QueryOperator::Less => ord == Ordering::Less,
                        _ => ord != Ordering::Greater,
                    };
                    hit != negate
                })
            }
            QueryOperator::NotEqual | QueryOperator::NotIn => {
                return Err(TesseraError::Internal(format!("{} was not normalized", op)));
            }
        };
        Ok(view)
    }

    /// Union of the buckets for `keys`, each bucket at most once.
    fn union<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> ResultView<I>
    where
        K: 'a,
    {
        let mut buckets: Vec<Arc<Bucket<I>>> = Vec::new();
        for key in keys {
            if let Some(bucket) = self.find_bucket(key) {
                if !buckets.iter().any(|b| Arc::ptr_eq(b, &bucket)) {
                    buckets.push(bucket);
                }
            }
        }
        self.view(buckets)
    }

    /// Coerces a query value to the key type and substitutes the null key.
    pub fn coerce_key(&self, value: &Value) -> Result<K> {
        let key = if value.is_null() {
            None
        } else {
            Some(K::from_value(value.clone())?)
        };
        Ok(self.substitute(key))
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Returns the number of distinct keys.
    pub fn key_count(&self) -> usize {
        self.buckets.read().values().map(Vec::len).sum()
    }

    /// Returns the number of items across all buckets.
    pub fn len(&self) -> usize {
        self.entries().iter().map(|(_, b)| b.len()).sum()
    }

    /// Returns true if the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.buckets.read().is_empty()
    }

    /// Returns every distinct key, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.entries().into_iter().map(|(k, _)| k).collect()
    }

    /// Verifies the structural invariants of the index.
    ///
    /// Every bucket must be non-empty and sorted, every item must be filed
    /// under the key currently read from the column store, and no item may
    /// appear twice.
    pub fn check_invariants(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut seen: FxHashSet<RowHandle> = FxHashSet::default();
        for (key, bucket) in self.entries() {
            let items = bucket.snapshot();
            if items.is_empty() {
                return Err(TesseraError::IndexCorrupted(format!("empty bucket for key {:?}", key)));
            }
            if !bucket.is_sorted(self.item_comparer.as_ref()) {
                return Err(TesseraError::IndexCorrupted(format!(
                    "bucket for key {:?} is out of order",
                    key
                )));
            }
            for item in items.iter() {
                let current = self.key_of(item);
                if !self.key_comparer.equals(&current, &key) {
                    return Err(TesseraError::IndexCorrupted(format!(
                        "item {} filed under {:?} but its key is {:?}",
                        item.handle(),
                        key,
                        current
                    )));
                }
                if !seen.insert(item.handle()) {
                    return Err(TesseraError::IndexCorrupted(format!(
                        "item {} appears in more than one bucket",
                        item.handle()
                    )));
                }
            }
        }
        Ok(())
    }
}

impl<I, K> std::fmt::Debug for SecondaryIndex<I, K>
where
    K: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryIndex")
            .field("null_key", &self.null_key)
            .field("keys", &self.buckets.read().values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::HandleOrder;
    use crate::key::NaturalOrder;

    fn setup(keys: &[i32]) -> (Arc<ColumnStore<Option<i32>>>, SecondaryIndex<RowHandle, i32>) {
        let store = Arc::new(ColumnStore::<Option<i32>>::with_block_size(16).unwrap());
        for (i, key) in keys.iter().enumerate() {
            store.set_at(i as u32, Some(*key)).unwrap();
        }
        let index = SecondaryIndex::nullable(store.clone(), Arc::new(HandleOrder));
        index.refresh((0..keys.len() as u32).map(|i| RowHandle::from_linear(i, 16)));
        (store, index)
    }

    fn h(i: u32) -> RowHandle {
        RowHandle::from_linear(i, 16)
    }

    #[test]
    fn test_select_exact() {
        let (_, index) = setup(&[1, 2, 2, 3]);
        assert_eq!(index.select(&2).to_vec(), vec![h(1), h(2)]);
        assert_eq!(index.select(&3).count(), 1);
        assert!(index.select(&9).is_empty());
        assert!(index.select(None).is_empty());
        assert_eq!(index.select_one(&2), Some(h(1)));
        assert_eq!(index.select_one(None), None);
        assert_eq!(index.key_count(), 3);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_add_and_remove() {
        let (store, index) = setup(&[5, 5]);
        store.set_at(2, Some(5)).unwrap();
        assert!(index.add(h(2)));
        assert!(!index.add(h(2)));
        assert_eq!(index.select(&5).count(), 3);

        assert!(index.remove(&h(0)));
        assert!(!index.remove(&h(0)));
        assert_eq!(index.select(&5).to_vec(), vec![h(1), h(2)]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_last_item_drops_key() {
        let (_, index) = setup(&[7]);
        assert_eq!(index.key_count(), 1);
        assert!(index.remove(&h(0)));
        assert_eq!(index.key_count(), 0);
        assert!(index.is_empty());
    }

    #[test]
    fn test_null_substitution() {
        let (store, index) = setup(&[0, 4]);
        store.set_at(2, None).unwrap();
        index.add(h(2));

        // Zero and NULL share the sentinel bucket.
        let nulls = index.select(index.null_sentinel());
        assert_eq!(nulls.to_vec(), vec![h(0), h(2)]);
        let is_null = index.query(&QueryArg::Value(Value::Null), QueryOperator::Is, false).unwrap();
        assert_eq!(is_null.count(), 2);
        let not_null = index.query(&QueryArg::Value(Value::Null), QueryOperator::Is, true).unwrap();
        assert_eq!(not_null.to_vec(), vec![h(1)]);
        let eq_null = index.query(&QueryArg::Value(Value::Null), QueryOperator::Equal, false).unwrap();
        assert_eq!(eq_null.count(), 2);
    }

    #[test]
    fn test_negative_zero_float_key_is_null_sentinel() {
        let store = Arc::new(ColumnStore::<Option<f64>>::with_block_size(16).unwrap());
        store.set_at(0, Some(-0.0)).unwrap();
        store.set_at(1, Some(0.0)).unwrap();
        store.set_at(2, Some(1.5)).unwrap();
        let index = SecondaryIndex::<RowHandle, f64>::nullable(store, Arc::new(HandleOrder));
        index.refresh((0..3).map(h));

        assert_eq!(index.key_count(), 2);
        let is_null = index.query(&QueryArg::Value(Value::Null), QueryOperator::Is, false).unwrap();
        assert_eq!(is_null.to_vec(), vec![h(0), h(1)]);
        let zero = index.query(&QueryArg::value(0.0f64), QueryOperator::Equal, false).unwrap();
        assert_eq!(zero.count(), 2);
        let neg_zero = index.query(&QueryArg::value(-0.0f64), QueryOperator::Equal, false).unwrap();
        assert_eq!(neg_zero.count(), 2);
    }

    #[test]
    fn test_case_sensitive_key_comparer_splits_buckets() {
        let store = Arc::new(ColumnStore::<String>::with_block_size(8).unwrap());
        store.set_at(0, "Alice".to_string()).unwrap();
        store.set_at(1, "ALICE".to_string()).unwrap();
        let index = SecondaryIndex::<RowHandle, String>::direct(store, Arc::new(HandleOrder))
            .with_key_comparer(Arc::new(NaturalOrder));
        index.refresh([h(0), h(1)]);

        assert_eq!(index.key_count(), 2);
        assert_eq!(index.select(&"Alice".to_string()).to_vec(), vec![h(0)]);
        assert!(index.select(&"alice".to_string()).is_empty());
    }

    #[test]
    fn test_custom_null_key() {
        let store = Arc::new(ColumnStore::<Option<i32>>::with_block_size(16).unwrap());
        let index = SecondaryIndex::<RowHandle, i32>::nullable(store.clone(), Arc::new(HandleOrder))
            .with_null_key(i32::MIN);
        store.set_at(0, None).unwrap();
        store.set_at(1, Some(0)).unwrap();
        index.refresh([h(0), h(1)]);
        assert_eq!(index.select(&i32::MIN).count(), 2);
        assert!(index.select(&0).is_empty());
    }

    #[test]
    fn test_refresh_item_after_key_change() {
        let (store, index) = setup(&[1, 2, 3]);
        store.set_at(0, Some(3)).unwrap();
        assert!(index.refresh_item(h(0)));
        assert!(index.select(&1).is_empty());
        assert_eq!(index.select(&3).to_vec(), vec![h(0), h(2)]);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_after_key_change_scans_all_buckets() {
        let (store, index) = setup(&[1, 2, 2]);
        store.set_at(1, Some(9)).unwrap();
        assert!(index.remove(&h(1)));
        assert_eq!(index.select(&2).to_vec(), vec![h(2)]);
        assert!(index.select(&9).is_empty());

        store.set_at(0, Some(8)).unwrap();
        assert!(index.remove(&h(0)));
        assert!(index.select(&1).is_empty());
        assert_eq!(index.key_count(), 1);
    }

    #[test]
    fn test_remove_unknown_item_is_noop() {
        // Falls through the recovery scan without finding anything.
        let (store, index) = setup(&[1, 2]);
        store.set_at(5, Some(2)).unwrap();
        assert!(!index.remove(&h(5)));
        assert_eq!(index.select(&2).to_vec(), vec![h(1)]);
        assert_eq!(index.len(), 2);
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_remove_does_not_drop_other_items_key() {
        // Row 0 moves to key 2, whose only item is row 1.
        let (store, index) = setup(&[1, 2]);
        store.set_at(0, Some(2)).unwrap();
        assert!(index.remove(&h(0)));
        assert_eq!(index.select(&2).to_vec(), vec![h(1)]);
        assert!(index.select(&1).is_empty());
    }

    #[test]
    fn test_check_invariants_detects_stale_key() {
        let (store, index) = setup(&[1, 2]);
        store.set_at(0, Some(2)).unwrap();
        let err = index.check_invariants().unwrap_err();
        assert!(matches!(err, TesseraError::IndexCorrupted(_)));
        index.refresh_item(h(0));
        index.check_invariants().unwrap();
    }

    #[test]
    fn test_add_with_explicit_key() {
        let (_, index) = setup(&[]);
        index.add_with_key(h(3), Some(11));
        index.add_with_key(h(4), None);
        assert_eq!(index.select(&11).to_vec(), vec![h(3)]);
        assert_eq!(index.select(&0).to_vec(), vec![h(4)]);
        assert!(index.remove_with_key(&h(3), Some(11)));
        assert!(index.select(&11).is_empty());
    }

    #[test]
    fn test_clear() {
        let (_, index) = setup(&[1, 2, 3]);
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.key_count(), 0);
        assert!(index.select(&1).is_empty());
    }

    #[test]
    fn test_search() {
        let (_, index) = setup(&[1, 2, 3, 4]);
        let even = index.search(|k| k % 2 == 0);
        let mut handles = even.to_vec();
        handles.sort();
        assert_eq!(handles, vec![h(1), h(3)]);
    }

    #[test]
    fn test_keys() {
        let (_, index) = setup(&[3, 1, 3]);
        let mut keys = index.keys();
        keys.sort();
        assert_eq!(keys, vec![1, 3]);
    }

    #[test]
    fn test_text_keys_fold_case() {
        let store = Arc::new(ColumnStore::<String>::with_block_size(8).unwrap());
        store.set_at(0, "Alice".to_string()).unwrap();
        store.set_at(1, "ALICE".to_string()).unwrap();
        store.set_at(2, "bob".to_string()).unwrap();
        store.set_at(3, String::new()).unwrap();
        let index = SecondaryIndex::<RowHandle, String>::direct(store, Arc::new(HandleOrder));
        index.refresh((0..4).map(|i| RowHandle::from_linear(i, 8)));

        assert_eq!(index.select(&"alice".to_string()).count(), 2);
        assert_eq!(index.key_count(), 3);
        assert_eq!(index.select(&String::new()).count(), 1);
    }
}
