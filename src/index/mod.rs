//! A small single-segment inverted index.
//!
//! [`IndexWriter`] buffers analyzed documents and commits them to a
//! [`Storage`](crate::storage::Storage); [`SegmentReader`] loads a committed index;
//! [`IndexSearcher`] runs [`Query`](crate::query::Query) objects against a reader.

pub mod reader;
pub mod searcher;
pub mod segment;
pub mod writer;

pub use reader::{FieldStats, IndexReader, SegmentReader, TermInfo};
pub use searcher::IndexSearcher;
pub use segment::{DocId, IndexMeta, Posting};
pub use writer::{IndexWriter, IndexWriterConfig};
