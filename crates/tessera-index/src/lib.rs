//! Secondary indexes for Tessera column stores.
//!
//! This crate provides:
//! - Ordered, copy-on-write buckets of items sharing one key
//! - `SecondaryIndex`, mapping each distinct key of a column to its bucket
//! - Lazy result views over the buckets a query matched
//! - The query protocol (`QueryOperator`, `QueryArg`) including SQL LIKE
//! - A runtime factory pairing a column store with its index by key type
//!
//! Items are anything that can report a [`RowHandle`](tessera_common::RowHandle);
//! the index reads an item's current key from the column store through that
//! handle whenever it needs one.

mod bucket;
mod erased;
mod factory;
mod index;
mod item;
mod key;
mod query;
mod view;

pub use bucket::Bucket;
pub use erased::{downcast_index, ErasedIndex};
pub use factory::{build_direct, build_nullable, IndexConstructor, IndexFactory, IndexedColumn, KeyOptions};
pub use index::SecondaryIndex;
pub use item::{HandleItem, HandleOrder, IndexItem, ItemComparer};
pub use key::{ByteWise, CaseInsensitive, IndexKey, KeyComparer, NaturalOrder};
pub use query::{like_to_regex, QueryArg, QueryOperator};
pub use view::{ResultIter, ResultView};
