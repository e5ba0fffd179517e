//! Packed row handles for block-allocated column storage.

use serde::{Deserialize, Serialize};

/// Largest block size a handle can address (offsets are 16 bits wide).
pub const MAX_BLOCK_SIZE: u32 = 1 << 16;

/// Address of a row inside a column store.
///
/// A RowHandle packs a block index and an offset within that block into a
/// single u32. The block index occupies the upper 16 bits, the offset the
/// lower 16 bits, so ordering by the raw value matches ordering by
/// (block, offset) as long as offsets stay below the block size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct RowHandle(u32);

impl RowHandle {
    /// Creates a handle from its block index and in-block offset.
    #[inline]
    pub const fn new(block: u16, offset: u16) -> Self {
        Self(((block as u32) << 16) | offset as u32)
    }

    /// Returns the block index.
    #[inline]
    pub const fn block(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Returns the offset within the block.
    #[inline]
    pub const fn offset(&self) -> u16 {
        self.0 as u16
    }

    /// Returns the packed representation.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Creates a handle from its packed representation.
    #[inline]
    pub const fn from_u32(raw: u32) -> Self {
        Self(raw)
    }

    /// Converts a linear row index to a handle for the given block size.
    #[inline]
    pub fn from_linear(index: u32, block_size: u32) -> Self {
        debug_assert!(block_size > 0 && block_size <= MAX_BLOCK_SIZE);
        debug_assert!(index / block_size <= u16::MAX as u32);
        Self::new((index / block_size) as u16, (index % block_size) as u16)
    }

    /// Converts this handle back to a linear row index.
    #[inline]
    pub fn to_linear(&self, block_size: u32) -> u32 {
        self.block() as u32 * block_size + self.offset() as u32
    }
}

impl From<u32> for RowHandle {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<RowHandle> for u32 {
    fn from(handle: RowHandle) -> Self {
        handle.0
    }
}

impl std::fmt::Display for RowHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.block(), self.offset())
    }
}
