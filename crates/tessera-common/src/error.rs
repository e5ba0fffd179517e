//! Error types for Tessera.

use crate::handle::RowHandle;
use thiserror::Error;

/// Result type alias using TesseraError.
pub type Result<T> = std::result::Result<T, TesseraError>;

/// Errors that can occur in Tessera operations.
///
/// Lookups for absent keys are not errors; they produce empty results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TesseraError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // Storage errors
    #[error("Row handle {handle} out of range for block size {block_size}")]
    HandleOutOfRange { handle: RowHandle, block_size: u32 },

    #[error("Row index {index} not addressable with block size {block_size}")]
    RowIndexOutOfRange { index: u32, block_size: u32 },

    // Type errors
    #[error("Cannot convert {from} to {to}: {reason}")]
    ConversionError {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    // Query errors
    #[error("Invalid query argument: {0}")]
    InvalidQueryArgument(String),

    // Index errors
    #[error("Index corrupted: {0}")]
    IndexCorrupted(String),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl TesseraError {
    /// Builds a conversion error between two type names.
    pub fn conversion(from: impl ToString, to: impl ToString, reason: impl ToString) -> Self {
        TesseraError::ConversionError {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.to_string(),
        }
    }
}
