//! Runs queries against an [`IndexReader`].

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::{Collector, Query, SearchResults, TopDocsCollector};

/// Executes queries and loads the stored fields of the top hits.
#[derive(Debug, Clone)]
pub struct IndexSearcher {
    reader: Arc<dyn IndexReader>,
}

impl IndexSearcher {
    /// Create a searcher over `reader`.
    pub fn new(reader: Arc<dyn IndexReader>) -> Self {
        IndexSearcher { reader }
    }

    /// The underlying reader.
    pub fn reader(&self) -> &Arc<dyn IndexReader> {
        &self.reader
    }

    /// Return the `limit` best hits for `query`, with stored documents attached.
    pub fn search(&self, query: &dyn Query, limit: usize) -> Result<SearchResults> {
        let scores = query.execute(self.reader.as_ref())?;

        let mut collector = TopDocsCollector::new(limit);
        for (doc_id, score) in scores {
            collector.collect(doc_id, score);
        }

        let mut hits = collector.results();
        for hit in &mut hits {
            hit.document = self.reader.document(hit.doc_id).cloned();
        }

        let max_score = hits.first().map_or(0.0, |hit| hit.score);
        debug!(
            "Query '{}' matched {} documents, returning {}",
            query.description(),
            collector.total_hits(),
            hits.len()
        );

        Ok(SearchResults {
            hits,
            total_hits: collector.total_hits(),
            max_score,
        })
    }

    /// Count matching documents without loading any.
    pub fn count(&self, query: &dyn Query) -> Result<u64> {
        Ok(query.execute(self.reader.as_ref())?.len() as u64)
    }
}
