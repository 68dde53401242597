//! Pluggable storage for index files.
//!
//! [`FileStorage`] keeps an index in one directory on disk; [`MemoryStorage`] keeps
//! it in a map and is what most tests use.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput, read_all};
