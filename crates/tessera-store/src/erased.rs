//! Type-erased access to column stores.

use crate::column::ColumnStore;
use crate::value::ColumnValue;
use std::any::Any;
use std::sync::Arc;
use tessera_common::{Result, RowHandle, TypeId, Value};

/// Boxed view of a column store, used where the element type is only known
/// at runtime.
///
/// Every method behaves exactly like its typed counterpart on
/// [`ColumnStore`], including null handling: a null-wrapped store reads an
/// unwritten or NULL slot back as `Value::Null`, a direct store reads it as
/// the type's zero value.
pub trait ErasedColumn: Send + Sync {
    /// Type tag of the stored values.
    fn item_type(&self) -> TypeId;

    /// True when NULL is stored distinctly from the default value.
    fn is_nullable(&self) -> bool;

    /// Reads the value at `handle`.
    fn get_value(&self, handle: RowHandle) -> Value;

    /// Writes `value` at `handle`, coercing it to the column type.
    fn set_value(&self, handle: RowHandle, value: Value) -> Result<()>;

    /// Reads the value at a linear index.
    fn get_value_at(&self, index: u32) -> Value;

    /// Writes the value at a linear index.
    fn set_value_at(&self, index: u32, value: Value) -> Result<()>;

    fn block_size(&self) -> u32;

    fn set_block_size(&self, block_size: u32) -> Result<()>;

    fn block_count(&self) -> usize;

    fn capacity(&self) -> usize;

    fn max_index(&self) -> Option<u32>;

    fn clear(&self);

    fn truncate(&self, max_index: u32);

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;

    /// Downcasting support for shared stores.
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: ColumnValue> ErasedColumn for ColumnStore<T> {
    fn item_type(&self) -> TypeId {
        T::TYPE_ID
    }

    fn is_nullable(&self) -> bool {
        T::NULLABLE
    }

    fn get_value(&self, handle: RowHandle) -> Value {
        self.get(handle).to_value()
    }

    fn set_value(&self, handle: RowHandle, value: Value) -> Result<()> {
        self.set(handle, T::from_value(value)?)
    }

    fn get_value_at(&self, index: u32) -> Value {
        self.get_at(index).to_value()
    }

    fn set_value_at(&self, index: u32, value: Value) -> Result<()> {
        self.set_at(index, T::from_value(value)?)
    }

    fn block_size(&self) -> u32 {
        ColumnStore::block_size(self)
    }

    fn set_block_size(&self, block_size: u32) -> Result<()> {
        ColumnStore::set_block_size(self, block_size)
    }

    fn block_count(&self) -> usize {
        ColumnStore::block_count(self)
    }

    fn capacity(&self) -> usize {
        ColumnStore::capacity(self)
    }

    fn max_index(&self) -> Option<u32> {
        ColumnStore::max_index(self)
    }

    fn clear(&self) {
        ColumnStore::clear(self)
    }

    fn truncate(&self, max_index: u32) {
        ColumnStore::truncate(self, max_index)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Recovers the typed store behind a shared erased column.
pub fn downcast_column<T: ColumnValue>(column: Arc<dyn ErasedColumn>) -> Option<Arc<ColumnStore<T>>> {
    column.into_any_arc().downcast::<ColumnStore<T>>().ok()
}
