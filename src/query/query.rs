//! Base query trait.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::index::segment::DocId;

/// Matching documents with their scores, ordered by doc id.
pub type DocScores = BTreeMap<DocId, f32>;

/// Trait for search queries.
pub trait Query: Send + Sync + Debug {
    /// Score every document this query matches.
    fn execute(&self, reader: &dyn IndexReader) -> Result<DocScores>;

    /// Get the boost factor for this query.
    fn boost(&self) -> f32;

    /// Set the boost factor for this query.
    fn set_boost(&mut self, boost: f32);

    /// Get a human-readable description of this query.
    fn description(&self) -> String;

    /// Clone this query.
    fn clone_box(&self) -> Box<dyn Query>;

    /// Check if this query can match any documents.
    fn is_empty(&self, reader: &dyn IndexReader) -> Result<bool> {
        Ok(self.execute(reader)?.is_empty())
    }

    /// Get this query as Any for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// The field this query searches in, if it targets exactly one.
    fn field(&self) -> Option<&str> {
        None
    }
}

impl Clone for Box<dyn Query> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
