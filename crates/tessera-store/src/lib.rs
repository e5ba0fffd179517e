//! Column storage for Tessera.
//!
//! This crate provides:
//! - Block-allocated typed column stores addressed by packed row handles
//! - Null-wrapping stores for value types (`ColumnStore<Option<T>>`)
//! - A type-erased, `Value`-based façade over any store
//! - Key readers that let indexes recompute a row's key from its handle

mod column;
mod erased;
mod reader;
mod value;

pub use column::ColumnStore;
pub use erased::{downcast_column, ErasedColumn};
pub use reader::KeyReader;
pub use value::ColumnValue;
