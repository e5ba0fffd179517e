//! Key types and key comparers.

use bytes::Bytes;
use rustc_hash::FxHasher;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tessera_common::{Date, Timestamp};
use tessera_store::ColumnValue;

/// Equality, hashing and ordering of index keys.
///
/// `compare` returning `Equal` must imply equal `hash_key` values.
pub trait KeyComparer<K>: Send + Sync {
    fn compare(&self, a: &K, b: &K) -> Ordering;

    fn hash_key(&self, key: &K) -> u64;

    #[inline]
    fn equals(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// A column type that can key a secondary index.
pub trait IndexKey: ColumnValue + PartialEq + Debug {
    /// Natural total order of the type.
    fn natural_cmp(&self, other: &Self) -> Ordering;

    /// Hash consistent with `natural_cmp`.
    fn natural_hash<H: Hasher>(&self, state: &mut H);

    /// Canonical "empty" value used as the default null sentinel.
    fn empty() -> Self {
        Self::default()
    }

    /// Key comparer used when the caller does not supply one.
    fn default_comparer() -> Arc<dyn KeyComparer<Self>> {
        Arc::new(NaturalOrder)
    }
}

macro_rules! impl_ordered_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IndexKey for $ty {
                #[inline]
                fn natural_cmp(&self, other: &Self) -> Ordering {
                    self.cmp(other)
                }

                #[inline]
                fn natural_hash<H: Hasher>(&self, state: &mut H) {
                    self.hash(state)
                }
            }
        )*
    };
}

impl_ordered_key!(bool, i8, i16, i32, i64, u8, u16, u32, u64, Date, Timestamp);

macro_rules! impl_float_key {
    ($($ty:ty),* $(,)?) => {
        $(
            // Negative zero folds into zero so it shares the zero key.
            impl IndexKey for $ty {
                #[inline]
                fn natural_cmp(&self, other: &Self) -> Ordering {
                    let a = if *self == 0.0 { 0.0 } else { *self };
                    let b = if *other == 0.0 { 0.0 } else { *other };
                    a.total_cmp(&b)
                }

                #[inline]
                fn natural_hash<H: Hasher>(&self, state: &mut H) {
                    let v = if *self == 0.0 { 0.0 } else { *self };
                    v.to_bits().hash(state)
                }
            }
        )*
    };
}

impl_float_key!(f32, f64);

impl IndexKey for String {
    fn natural_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    fn natural_hash<H: Hasher>(&self, state: &mut H) {
        self.hash(state)
    }

    fn default_comparer() -> Arc<dyn KeyComparer<Self>> {
        Arc::new(CaseInsensitive)
    }
}

impl IndexKey for Bytes {
    fn natural_cmp(&self, other: &Self) -> Ordering {
        self.as_ref().cmp(other.as_ref())
    }

    fn natural_hash<H: Hasher>(&self, state: &mut H) {
        self.as_ref().hash(state)
    }

    fn default_comparer() -> Arc<dyn KeyComparer<Self>> {
        Arc::new(ByteWise)
    }
}

/// Compares keys by their natural order.
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalOrder;

impl<K: IndexKey> KeyComparer<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.natural_cmp(b)
    }

    fn hash_key(&self, key: &K) -> u64 {
        let mut hasher = FxHasher::default();
        key.natural_hash(&mut hasher);
        hasher.finish()
    }
}

/// Compares text keys ignoring case. The default for text columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseInsensitive;

impl KeyComparer<String> for CaseInsensitive {
    fn compare(&self, a: &String, b: &String) -> Ordering {
        let a = a.chars().flat_map(char::to_lowercase);
        let b = b.chars().flat_map(char::to_lowercase);
        a.cmp(b)
    }

    fn hash_key(&self, key: &String) -> u64 {
        let mut hasher = FxHasher::default();
        for c in key.chars().flat_map(char::to_lowercase) {
            c.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Compares binary keys byte by byte. The default for binary columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteWise;

impl KeyComparer<Bytes> for ByteWise {
    fn compare(&self, a: &Bytes, b: &Bytes) -> Ordering {
        a.as_ref().cmp(b.as_ref())
    }

    fn hash_key(&self, key: &Bytes) -> u64 {
        let mut hasher = FxHasher::default();
        hasher.write(key.as_ref());
        hasher.finish()
    }
}
