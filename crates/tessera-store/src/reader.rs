//! Key extraction from column stores.

use crate::column::ColumnStore;
use crate::value::ColumnValue;
use tessera_common::RowHandle;

/// Reads the current key of a row.
///
/// Returns `None` when the row's value is NULL. Direct stores never report
/// NULL; null-wrapped stores report it for `None` slots.
pub trait KeyReader<K>: Send + Sync {
    fn read_key(&self, handle: RowHandle) -> Option<K>;
}

impl<K: ColumnValue> KeyReader<K> for ColumnStore<K> {
    #[inline]
    fn read_key(&self, handle: RowHandle) -> Option<K> {
        Some(self.get(handle))
    }
}

impl<K: ColumnValue> KeyReader<K> for ColumnStore<Option<K>> {
    #[inline]
    fn read_key(&self, handle: RowHandle) -> Option<K> {
        self.get(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_reader() {
        let store: ColumnStore<String> = ColumnStore::with_block_size(4).unwrap();
        store.set_at(1, "a".to_string()).unwrap();
        let reader: &dyn KeyReader<String> = &store;
        assert_eq!(reader.read_key(RowHandle::new(0, 1)), Some("a".to_string()));
        assert_eq!(reader.read_key(RowHandle::new(0, 2)), Some(String::new()));
    }

    #[test]
    fn test_nullable_reader() {
        let store: ColumnStore<Option<i32>> = ColumnStore::with_block_size(4).unwrap();
        store.set_at(0, Some(5)).unwrap();
        let reader: &dyn KeyReader<i32> = &store;
        assert_eq!(reader.read_key(RowHandle::new(0, 0)), Some(5));
        assert_eq!(reader.read_key(RowHandle::new(0, 1)), None);
    }
}
