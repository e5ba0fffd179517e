//! Block-allocated column storage.

use crate::value::ColumnValue;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};
use tessera_common::config::validate_block_size;
use tessera_common::{ColumnStoreConfig, Result, RowHandle, TesseraError, TypeId};

/// Largest number of blocks a row handle can address.
const MAX_BLOCKS: usize = u16::MAX as usize + 1;

/// Sentinel for "nothing written yet" in the max index counter.
const NO_INDEX: i64 = -1;

/// Growable typed array for one column, addressed by [`RowHandle`].
///
/// Storage is split into fixed-size blocks. The block table grows in
/// batches of `growth_step` slots, and each block's backing storage is only
/// allocated on the first write into it. Unwritten slots read back as
/// `T::default()`.
///
/// Readers check the published block count before touching the block table,
/// so a `get` past the end never takes the table lock. Writers to one column
/// are expected to be serialized by the owning row collection; the table
/// lock only keeps concurrent readers safe while it is reallocated.
pub struct ColumnStore<T: ColumnValue> {
    /// Rows per block. Fixed once any data exists.
    block_size: AtomicU32,
    /// Block-table slots added per growth step.
    growth_step: u32,
    /// Block table. `None` entries have no backing storage yet.
    blocks: RwLock<Vec<Option<Box<[T]>>>>,
    /// Published length of the block table.
    block_count: AtomicUsize,
    /// Largest linear index written so far (NO_INDEX = none).
    max_index: AtomicI64,
}

impl<T: ColumnValue> ColumnStore<T> {
    /// Creates an empty column store.
    pub fn new(config: ColumnStoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            block_size: AtomicU32::new(config.block_size),
            growth_step: config.growth_step,
            blocks: RwLock::new(Vec::new()),
            block_count: AtomicUsize::new(0),
            max_index: AtomicI64::new(NO_INDEX),
        })
    }

    /// Creates an empty column store with the given block size.
    pub fn with_block_size(block_size: u32) -> Result<Self> {
        Self::new(ColumnStoreConfig::with_block_size(block_size))
    }

    /// Type tag of the stored values.
    pub fn item_type(&self) -> TypeId {
        T::TYPE_ID
    }

    /// True when this store keeps NULL apart from the default value.
    pub fn is_nullable(&self) -> bool {
        T::NULLABLE
    }

    /// Returns the number of rows per block.
    #[inline]
    pub fn block_size(&self) -> u32 {
        self.block_size.load(Ordering::Acquire)
    }

    /// Changes the block size.
    ///
    /// Only allowed while the store holds no data; afterwards every handle
    /// already issued would point somewhere else.
    pub fn set_block_size(&self, block_size: u32) -> Result<()> {
        validate_block_size(block_size)?;
        let blocks = self.blocks.write();
        if !blocks.is_empty() || self.max_index.load(Ordering::Acquire) != NO_INDEX {
            return Err(TesseraError::ConfigurationError(format!(
                "cannot change block size from {} to {} after data has been written",
                self.block_size(),
                block_size
            )));
        }
        self.block_size.store(block_size, Ordering::Release);
        Ok(())
    }

    /// Returns the length of the block table.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count.load(Ordering::Acquire)
    }

    /// Returns the number of blocks with backing storage.
    pub fn allocated_blocks(&self) -> usize {
        self.blocks.read().iter().filter(|b| b.is_some()).count()
    }

    /// Returns the number of addressable slots (`block_count * block_size`).
    pub fn capacity(&self) -> usize {
        self.block_count() * self.block_size() as usize
    }

    /// Returns the largest linear index written, if any.
    pub fn max_index(&self) -> Option<u32> {
        let max = self.max_index.load(Ordering::Acquire);
        (max != NO_INDEX).then_some(max as u32)
    }

    /// Returns the number of rows up to and including the largest written index.
    pub fn len(&self) -> usize {
        (self.max_index.load(Ordering::Acquire) + 1) as usize
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.max_index().is_none()
    }

    /// Reads the value at `handle`, or the default if it was never written.
    #[inline]
    pub fn get(&self, handle: RowHandle) -> T {
        let block = handle.block() as usize;
        if block >= self.block_count() {
            return T::default();
        }
        let blocks = self.blocks.read();
        blocks
            .get(block)
            .and_then(|b| b.as_ref())
            .and_then(|data| data.get(handle.offset() as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// Writes `value` at `handle`, growing the block table as needed.
    pub fn set(&self, handle: RowHandle, value: T) -> Result<()> {
        let block_size = self.block_size();
        if handle.offset() as u32 >= block_size {
            return Err(TesseraError::HandleOutOfRange { handle, block_size });
        }

        let block = handle.block() as usize;
        let mut blocks = self.blocks.write();
        if block >= blocks.len() {
            self.grow(&mut blocks, block);
        }

        let data = blocks[block]
            .get_or_insert_with(|| vec![T::default(); block_size as usize].into_boxed_slice());
        data[handle.offset() as usize] = value;

        let linear = handle.to_linear(block_size) as i64;
        self.max_index.fetch_max(linear, Ordering::AcqRel);
        Ok(())
    }

    /// Extends the block table so that `block` is addressable.
    fn grow(&self, blocks: &mut Vec<Option<Box<[T]>>>, block: usize) {
        let step = self.growth_step as usize;
        let old_len = blocks.len();
        let new_len = ((block / step + 1) * step).min(MAX_BLOCKS);
        blocks.resize_with(new_len, || None);
        self.block_count.fetch_add(new_len - old_len, Ordering::AcqRel);
        tracing::debug!(
            old_blocks = old_len,
            new_blocks = new_len,
            block_size = self.block_size(),
            "grew column block table"
        );
    }

    /// Converts a linear index to a handle, checking it is addressable.
    pub fn handle_at(&self, index: u32) -> Result<RowHandle> {
        let block_size = self.block_size();
        if (index / block_size) as usize >= MAX_BLOCKS {
            return Err(TesseraError::RowIndexOutOfRange { index, block_size });
        }
        Ok(RowHandle::from_linear(index, block_size))
    }

    /// Reads the value at a linear index.
    pub fn get_at(&self, index: u32) -> T {
        match self.handle_at(index) {
            Ok(handle) => self.get(handle),
            Err(_) => T::default(),
        }
    }

    /// Writes the value at a linear index.
    pub fn set_at(&self, index: u32, value: T) -> Result<()> {
        let handle = self.handle_at(index)?;
        self.set(handle, value)
    }

    /// Releases all block storage and resets the counters.
    pub fn clear(&self) {
        let mut blocks = self.blocks.write();
        let released = blocks.len();
        *blocks = Vec::new();
        self.block_count.store(0, Ordering::Release);
        self.max_index.store(NO_INDEX, Ordering::Release);
        tracing::debug!(blocks = released, "cleared column store");
    }

    /// Drops everything after linear index `max_index`.
    ///
    /// Blocks past the one containing `max_index` are released; inside that
    /// block, slots after `max_index` are reset to the default value.
    pub fn truncate(&self, max_index: u32) {
        let block_size = self.block_size();
        let boundary = (max_index / block_size) as usize;
        let offset = (max_index % block_size) as usize;

        let mut blocks = self.blocks.write();
        if blocks.len() > boundary + 1 {
            let dropped = blocks.len() - boundary - 1;
            blocks.truncate(boundary + 1);
            self.block_count.fetch_sub(dropped, Ordering::AcqRel);
            tracing::debug!(max_index, dropped_blocks = dropped, "truncated column store");
        }
        if let Some(Some(data)) = blocks.get_mut(boundary) {
            fill_default(&mut data[offset + 1..]);
        }
        self.max_index.fetch_min(max_index as i64, Ordering::AcqRel);
    }

    /// Iterates `(handle, value)` pairs for linear indices `0..len()`.
    ///
    /// Each slot is read independently, so concurrent writes may or may not
    /// be observed.
    pub fn iter_written(&self) -> impl Iterator<Item = (RowHandle, T)> + '_ {
        let block_size = self.block_size();
        (0..self.len() as u32).map(move |index| {
            let handle = RowHandle::from_linear(index, block_size);
            (handle, self.get(handle))
        })
    }
}

impl<T: ColumnValue> Default for ColumnStore<T> {
    fn default() -> Self {
        let config = ColumnStoreConfig::default();
        Self {
            block_size: AtomicU32::new(config.block_size),
            growth_step: config.growth_step,
            blocks: RwLock::new(Vec::new()),
            block_count: AtomicUsize::new(0),
            max_index: AtomicI64::new(NO_INDEX),
        }
    }
}

impl<T: ColumnValue> std::fmt::Debug for ColumnStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnStore")
            .field("item_type", &T::TYPE_ID)
            .field("nullable", &T::NULLABLE)
            .field("block_size", &self.block_size())
            .field("block_count", &self.block_count())
            .field("max_index", &self.max_index())
            .finish()
    }
}

/// Resets a slice to the default value by replicating already-reset
/// elements in doubling chunks.
fn fill_default<T: Clone + Default>(slice: &mut [T]) {
    if slice.is_empty() {
        return;
    }
    slice[0] = T::default();
    let mut filled = 1;
    while filled < slice.len() {
        let n = filled.min(slice.len() - filled);
        let (src, dst) = slice.split_at_mut(filled);
        dst[..n].clone_from_slice(&src[..n]);
        filled += n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(block_size: u32) -> ColumnStore<i32> {
        ColumnStore::with_block_size(block_size).unwrap()
    }

    #[test]
    fn test_unwritten_reads_default() {
        let store = store(16);
        assert_eq!(store.get(RowHandle::new(0, 0)), 0);
        assert_eq!(store.get(RowHandle::new(400, 3)), 0);
        assert_eq!(store.block_count(), 0);
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_set_get_roundtrip() {
        let store = store(16);
        let handle = RowHandle::new(2, 5);
        store.set(handle, 77).unwrap();
        assert_eq!(store.get(handle), 77);
        assert_eq!(store.max_index(), Some(2 * 16 + 5));
        assert_eq!(store.len(), 38);
    }

    #[test]
    fn test_growth_is_batched() {
        let config = ColumnStoreConfig {
            block_size: 8,
            growth_step: 4,
        };
        let store: ColumnStore<u8> = ColumnStore::new(config).unwrap();
        store.set(RowHandle::new(0, 0), 1).unwrap();
        assert_eq!(store.block_count(), 4);
        assert_eq!(store.allocated_blocks(), 1);
        assert_eq!(store.capacity(), 32);

        store.set(RowHandle::new(5, 0), 2).unwrap();
        assert_eq!(store.block_count(), 8);
        assert_eq!(store.allocated_blocks(), 2);
    }

    #[test]
    fn test_growth_preserves_data() {
        let store = store(4);
        for i in 0..10 {
            store.set_at(i, i as i32 * 10).unwrap();
        }
        store.set_at(5000, -1).unwrap();
        for i in 0..10 {
            assert_eq!(store.get_at(i), i as i32 * 10);
        }
        assert_eq!(store.get_at(5000), -1);
        assert_eq!(store.get_at(4999), 0);
    }

    #[test]
    fn test_offset_beyond_block_size_rejected() {
        let store = store(10);
        let err = store.set(RowHandle::new(0, 10), 1).unwrap_err();
        assert!(matches!(err, TesseraError::HandleOutOfRange { .. }));
        assert_eq!(store.get(RowHandle::new(0, 10)), 0);
    }

    #[test]
    fn test_unaddressable_linear_index() {
        let store = store(1);
        let err = store.set_at(70_000, 1).unwrap_err();
        assert!(matches!(err, TesseraError::RowIndexOutOfRange { .. }));
        assert_eq!(store.get_at(70_000), 0);
    }

    #[test]
    fn test_block_size_fixed_after_write() {
        let store = store(16);
        store.set_block_size(32).unwrap();
        assert_eq!(store.block_size(), 32);

        store.set_at(3, 1).unwrap();
        let err = store.set_block_size(64).unwrap_err();
        assert!(matches!(err, TesseraError::ConfigurationError(_)));
        assert_eq!(store.block_size(), 32);
    }

    #[test]
    fn test_invalid_block_size() {
        assert!(ColumnStore::<i32>::with_block_size(0).is_err());
        assert!(store(16).set_block_size(0).is_err());
    }

    #[test]
    fn test_clear() {
        let store = store(8);
        for i in 0..40 {
            store.set_at(i, 1).unwrap();
        }
        store.clear();
        assert_eq!(store.block_count(), 0);
        assert_eq!(store.capacity(), 0);
        assert!(store.max_index().is_none());
        assert_eq!(store.get_at(3), 0);

        // Block size may change again once the store is empty.
        store.set_block_size(4).unwrap();
    }

    #[test]
    fn test_truncate() {
        let store = store(50);
        for i in 0..100u32 {
            store.set_at(i, i as i32).unwrap();
        }
        store.truncate(40);

        assert_eq!(store.get_at(41), 0);
        assert_eq!(store.get_at(39), 39);
        assert_eq!(store.get_at(40), 40);
        for i in 41..100 {
            assert_eq!(store.get_at(i), 0);
        }
        assert_eq!(store.block_count(), 1);
        assert_eq!(store.max_index(), Some(40));
    }

    #[test]
    fn test_truncate_block_boundary() {
        let store = store(10);
        for i in 0..30u32 {
            store.set_at(i, 1).unwrap();
        }
        store.truncate(19);
        assert_eq!(store.get_at(19), 1);
        assert_eq!(store.get_at(20), 0);
        assert_eq!(store.block_count(), 2);
    }

    #[test]
    fn test_truncate_beyond_max_keeps_max() {
        let store = store(10);
        store.set_at(5, 1).unwrap();
        store.truncate(500);
        assert_eq!(store.max_index(), Some(5));
        assert_eq!(store.get_at(5), 1);
    }

    #[test]
    fn test_fill_default() {
        for len in [0usize, 1, 2, 3, 7, 8, 33] {
            let mut data: Vec<String> = (0..len).map(|i| i.to_string()).collect();
            fill_default(&mut data);
            assert!(data.iter().all(|s| s.is_empty()));
        }
    }

    #[test]
    fn test_nullable_store() {
        let store: ColumnStore<Option<i32>> = ColumnStore::with_block_size(8).unwrap();
        store.set_at(0, Some(0)).unwrap();
        assert_eq!(store.get_at(0), Some(0));
        assert_eq!(store.get_at(1), None);
        assert!(store.is_nullable());
        assert_eq!(store.item_type(), TypeId::Int32);
    }

    #[test]
    fn test_iter_written() {
        let store = store(3);
        store.set_at(1, 5).unwrap();
        store.set_at(4, 9).unwrap();
        let values: Vec<i32> = store.iter_written().map(|(_, v)| v).collect();
        assert_eq!(values, vec![0, 5, 0, 0, 9]);
        let (handle, _) = store.iter_written().nth(4).unwrap();
        assert_eq!(handle, RowHandle::new(1, 1));
    }
}
