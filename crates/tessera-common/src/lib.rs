//! Tessera common types, errors, and utilities.
//!
//! This crate provides shared definitions used by the column store and the
//! secondary index crates.

pub mod config;
pub mod error;
pub mod handle;
pub mod types;
pub mod value;

pub use config::{ColumnStoreConfig, IndexConfig};
pub use error::{Result, TesseraError};
pub use handle::{RowHandle, MAX_BLOCK_SIZE};
pub use types::{Date, Timestamp, TypeId};
pub use value::Value;
