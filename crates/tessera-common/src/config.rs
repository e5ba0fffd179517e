//! Configuration structures for Tessera.

use crate::error::{Result, TesseraError};
use crate::handle::MAX_BLOCK_SIZE;
use serde::{Deserialize, Serialize};

/// Default number of rows per column block.
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

/// Default number of blocks added to the block table when it grows.
pub const DEFAULT_GROWTH_STEP: u32 = 16;

/// Column store configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnStoreConfig {
    /// Number of rows held by each block.
    pub block_size: u32,
    /// Number of block-table slots added per growth step.
    pub growth_step: u32,
}

impl Default for ColumnStoreConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            growth_step: DEFAULT_GROWTH_STEP,
        }
    }
}

impl ColumnStoreConfig {
    /// Creates a configuration with the given block size and default growth.
    pub fn with_block_size(block_size: u32) -> Self {
        Self {
            block_size,
            ..Default::default()
        }
    }

    /// Checks that every parameter is within range.
    pub fn validate(&self) -> Result<()> {
        validate_block_size(self.block_size)?;
        if self.growth_step == 0 {
            return Err(TesseraError::ConfigurationError(
                "growth_step must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Checks that a block size can be addressed by a row handle.
pub fn validate_block_size(block_size: u32) -> Result<()> {
    if block_size == 0 || block_size > MAX_BLOCK_SIZE {
        return Err(TesseraError::ConfigurationError(format!(
            "block_size must be in 1..={}, got {}",
            MAX_BLOCK_SIZE, block_size
        )));
    }
    Ok(())
}

/// Secondary index configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Configuration of the column store backing the index.
    pub store: ColumnStoreConfig,
}

impl IndexConfig {
    /// Checks that every parameter is within range.
    pub fn validate(&self) -> Result<()> {
        self.store.validate()
    }
}
