//! Term query implementation for exact term matching.

use crate::error::Result;
use crate::index::reader::IndexReader;
use crate::query::query::{DocScores, Query};
use crate::query::scorer::{BM25Scorer, Scorer};

/// A query that matches documents containing a specific term.
#[derive(Debug, Clone)]
pub struct TermQuery {
    /// The field to search in.
    field: String,
    /// The term to search for.
    term: String,
    /// The boost factor for this query.
    boost: f32,
}

impl TermQuery {
    /// Create a new term query.
    ///
    /// The term is matched exactly and is NOT analyzed; pass it in the form the
    /// index analyzer produces (e.g. lowercased). [`QueryParser`] does this for you.
    ///
    /// [`QueryParser`]: crate::query::QueryParser
    pub fn new<F, T>(field: F, term: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        TermQuery {
            field: field.into(),
            term: term.into(),
            boost: 1.0,
        }
    }

    /// Get the term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Set the boost factor.
    pub fn with_boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    /// Build the BM25 scorer for this term against `reader`.
    pub fn scorer(&self, reader: &dyn IndexReader) -> BM25Scorer {
        let doc_freq = reader
            .term_info(&self.field, &self.term)
            .map_or(0, |info| info.doc_freq);
        let avg_length = reader
            .field_stats(&self.field)
            .map_or(0.0, |stats| stats.avg_length);
        BM25Scorer::new(doc_freq, avg_length, reader.doc_count(), self.boost)
    }
}

impl Query for TermQuery {
    fn execute(&self, reader: &dyn IndexReader) -> Result<DocScores> {
        let Some(postings) = reader.postings(&self.field, &self.term) else {
            return Ok(DocScores::new());
        };

        let scorer = self.scorer(reader);
        Ok(postings
            .iter()
            .map(|posting| {
                let length = reader.field_length(&self.field, posting.doc_id);
                let score = scorer.score(posting.term_freq as f32, length as f32);
                (posting.doc_id, score)
            })
            .collect())
    }

    fn boost(&self) -> f32 {
        self.boost
    }

    fn set_boost(&mut self, boost: f32) {
        self.boost = boost;
    }

    fn description(&self) -> String {
        if self.boost == 1.0 {
            format!("{}:{}", self.field, self.term)
        } else {
            format!("{}:{}^{}", self.field, self.term, self.boost)
        }
    }

    fn clone_box(&self) -> Box<dyn Query> {
        Box::new(self.clone())
    }

    fn is_empty(&self, reader: &dyn IndexReader) -> Result<bool> {
        Ok(reader.postings(&self.field, &self.term).is_none())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn field(&self) -> Option<&str> {
        Some(&self.field)
    }
}
