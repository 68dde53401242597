//! Query system for searching documents.

pub mod boolean;
pub mod collector;
pub mod parser;
#[allow(clippy::module_inception)]
pub mod query;
pub mod scorer;
pub mod term;

pub use self::boolean::{BooleanClause, BooleanQuery, Occur};
pub use self::collector::{Collector, TopDocsCollector};
pub use self::parser::QueryParser;
pub use self::query::{DocScores, Query};
pub use self::scorer::{BM25Scorer, Scorer};
pub use self::term::TermQuery;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::index::segment::DocId;
use crate::indexing::TITLE_FIELD;

/// A search hit containing a document and its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The document ID.
    pub doc_id: DocId,
    /// The relevance score.
    pub score: f32,
    /// The stored document (if retrieved).
    pub document: Option<Document>,
}

impl SearchHit {
    /// A stored text field of the hit's document.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.document.as_ref().and_then(|doc| doc.get_text(name))
    }

    /// The stored `TITLE` of the hit's document.
    pub fn title(&self) -> Option<&str> {
        self.field(TITLE_FIELD)
    }
}

/// Search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The search hits, best first.
    pub hits: Vec<SearchHit>,
    /// Total number of matching documents, regardless of how many hits were kept.
    pub total_hits: u64,
    /// Maximum score in the results (0 when there are none).
    pub max_score: f32,
}
