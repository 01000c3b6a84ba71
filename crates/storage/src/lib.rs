//! Storage abstraction and implementations for goalplan.
//!
//! This crate provides a trait-based storage interface with a JSON file
//! reference implementation and an in-memory backend.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;

pub use trait_::{work_end_key, work_start_key, Storage, StorageError, Result};
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
