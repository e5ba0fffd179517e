//! Type-erased access to secondary indexes.

use crate::index::SecondaryIndex;
use crate::item::IndexItem;
use crate::key::IndexKey;
use crate::query::{QueryArg, QueryOperator};
use crate::view::ResultView;
use std::any::Any;
use tessera_common::{Result, TypeId, Value};

/// Boxed view of a secondary index whose key type is only known at runtime.
///
/// Keys cross this boundary as [`Value`]s and are coerced to the index's key
/// type exactly as [`SecondaryIndex::query`] coerces query arguments.
pub trait ErasedIndex<I>: Send + Sync {
    /// Type tag of the keys.
    fn key_type(&self) -> TypeId;

    fn add(&self, item: I) -> bool;

    fn remove(&self, item: &I) -> bool;

    fn refresh_item(&self, item: I) -> bool;

    fn refresh_sort(&self, item: &I) -> bool;

    /// Rebuilds the index from `items`.
    fn refresh_all(&self, items: Vec<I>);

    fn clear(&self);

    fn query(&self, arg: &QueryArg, op: QueryOperator, negate: bool) -> Result<ResultView<I>>;

    /// Exact-match lookup by boxed key.
    fn select_value(&self, key: &Value) -> Result<ResultView<I>>;

    fn key_count(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The null sentinel, boxed.
    fn null_sentinel(&self) -> Value;

    /// Every distinct key, boxed.
    fn keys(&self) -> Vec<Value>;

    fn check_invariants(&self) -> Result<()>;

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;
}

impl<I: IndexItem, K: IndexKey> ErasedIndex<I> for SecondaryIndex<I, K> {
    fn key_type(&self) -> TypeId {
        K::TYPE_ID
    }

    fn add(&self, item: I) -> bool {
        SecondaryIndex::add(self, item)
    }

    fn remove(&self, item: &I) -> bool {
        SecondaryIndex::remove(self, item)
    }

    fn refresh_item(&self, item: I) -> bool {
        SecondaryIndex::refresh_item(self, item)
    }

    fn refresh_sort(&self, item: &I) -> bool {
        SecondaryIndex::refresh_sort(self, item)
    }

    fn refresh_all(&self, items: Vec<I>) {
        SecondaryIndex::refresh(self, items)
    }

    fn clear(&self) {
        SecondaryIndex::clear(self)
    }

    fn query(&self, arg: &QueryArg, op: QueryOperator, negate: bool) -> Result<ResultView<I>> {
        SecondaryIndex::query(self, arg, op, negate)
    }

    fn select_value(&self, key: &Value) -> Result<ResultView<I>> {
        let key = self.coerce_key(key)?;
        Ok(self.select(&key))
    }

    fn key_count(&self) -> usize {
        SecondaryIndex::key_count(self)
    }

    fn len(&self) -> usize {
        SecondaryIndex::len(self)
    }

    fn null_sentinel(&self) -> Value {
        SecondaryIndex::null_sentinel(self).to_value()
    }

    fn keys(&self) -> Vec<Value> {
        SecondaryIndex::keys(self).iter().map(|k| k.to_value()).collect()
    }

    fn check_invariants(&self) -> Result<()> {
        SecondaryIndex::check_invariants(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Recovers the typed index behind an erased one.
pub fn downcast_index<I: IndexItem, K: IndexKey>(
    index: &dyn ErasedIndex<I>,
) -> Option<&SecondaryIndex<I, K>> {
    index.as_any().downcast_ref::<SecondaryIndex<I, K>>()
}
