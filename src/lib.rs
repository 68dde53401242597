//! # Curator
//!
//! Hybrid text and vector retrieval over artwork metadata.
//!
//! - Columnar CSV loading and a big-endian, memory-mapped vector store
//! - A single-segment inverted index with BM25 scoring
//! - Query augmentation through an LLM, degrading to the raw query on any failure
//! - Weighted disjunctions of keywords and ranked synonyms
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use curator::augment::augmenter_from_config;
//! use curator::config::CuratorConfig;
//! use curator::indexing::IndexingPipeline;
//! use curator::search::SearchExecutor;
//! use curator::storage::{FileStorage, StorageConfig};
//!
//! # fn main() -> curator::error::Result<()> {
//! let config = CuratorConfig::default();
//! let storage = Arc::new(FileStorage::new(&config.index_dir, StorageConfig::default())?);
//! IndexingPipeline::new(&config).run(storage.clone(), &config.data_path, &config.vectors_path)?;
//!
//! let executor = SearchExecutor::new(&config, augmenter_from_config(&config.augmentation)?);
//! let results = executor.search(storage.as_ref(), "melancholic seascapes", 20, true)?;
//! for hit in &results.hits {
//!     println!("{} | Score: {}", hit.title().unwrap_or_default(), hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod augment;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod index;
pub mod indexing;
pub mod query;
pub mod search;
pub mod storage;
pub mod vector;

pub mod prelude {
    pub use crate::augment::{Augmentation, AugmentedQuery, QueryAugmenter};
    pub use crate::config::CuratorConfig;
    pub use crate::document::Document;
    pub use crate::error::{CuratorError, Result};
    pub use crate::indexing::IndexingPipeline;
    pub use crate::search::SearchExecutor;
    pub use crate::storage::Storage;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
